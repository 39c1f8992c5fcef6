use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::linalg::solve_dense;
use super::SignalError;
use crate::data::model::Trajectory;

// ---------------------------------------------------------------------------
// FilterMethod / Window
// ---------------------------------------------------------------------------

/// Low-pass filter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterMethod {
    Butterworth,
    Fir,
}

impl FromStr for FilterMethod {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "butterworth" | "butter" => Ok(FilterMethod::Butterworth),
            "fir" => Ok(FilterMethod::Fir),
            _ => Err(SignalError::InvalidMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for FilterMethod {
    type Error = SignalError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FilterMethod> for String {
    fn from(m: FilterMethod) -> Self {
        m.to_string()
    }
}

impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMethod::Butterworth => write!(f, "butterworth"),
            FilterMethod::Fir => write!(f, "fir"),
        }
    }
}

/// Window used by the FIR design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    #[default]
    Blackman,
    Hamming,
    Hann,
}

impl Window {
    /// Symmetric window of length `n`.
    fn coefficients(self, n: usize) -> Vec<f64> {
        if n == 1 {
            return vec![1.0];
        }
        let denom = (n - 1) as f64;
        (0..n)
            .map(|i| {
                let phase = 2.0 * PI * i as f64 / denom;
                match self {
                    Window::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
                    Window::Hamming => 0.54 - 0.46 * phase.cos(),
                    Window::Hann => 0.5 - 0.5 * phase.cos(),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FilterParams
// ---------------------------------------------------------------------------

/// Smoothing settings. `order` applies to Butterworth, `numtaps`/`window` to FIR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Frames per second of the tracking capture.
    pub sample_rate: f64,
    pub method: FilterMethod,
    /// Cutoff frequency in Hz.
    pub cutoff: f64,
    pub order: usize,
    pub numtaps: usize,
    pub window: Window,
    /// Reflection padding on each side, in samples.
    pub padlen: usize,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            sample_rate: 30.0,
            method: FilterMethod::Butterworth,
            cutoff: 2.0,
            order: 4,
            numtaps: 51,
            window: Window::Blackman,
            padlen: 128,
        }
    }
}

impl FilterParams {
    /// Cutoff as a fraction of the Nyquist frequency.
    pub fn normalized_cutoff(&self) -> f64 {
        self.cutoff / (self.sample_rate / 2.0)
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(SignalError::InvalidParameter(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        let wn = self.normalized_cutoff();
        if !(wn.is_finite() && wn > 0.0) {
            return Err(SignalError::InvalidCutoff {
                cutoff: self.cutoff,
                sample_rate: self.sample_rate,
            });
        }
        match self.method {
            FilterMethod::Butterworth if self.order == 0 => Err(SignalError::InvalidParameter(
                "butterworth order must be at least 1".into(),
            )),
            FilterMethod::Fir if self.numtaps == 0 => Err(SignalError::InvalidParameter(
                "FIR filter needs at least one tap".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Design the transfer function described by these settings.
    pub fn design(&self) -> Result<TransferFunction, SignalError> {
        self.validate()?;
        let wn = self.normalized_cutoff();
        Ok(match self.method {
            FilterMethod::Butterworth => butter_lowpass(self.order, wn),
            FilterMethod::Fir => fir_lowpass(self.numtaps, wn, self.window),
        })
    }
}

// ---------------------------------------------------------------------------
// TransferFunction – b/a polynomial coefficients
// ---------------------------------------------------------------------------

/// Digital filter in transfer-function form, `a[0] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl TransferFunction {
    /// Pass-through filter.
    pub fn identity() -> Self {
        Self {
            b: vec![1.0],
            a: vec![1.0],
        }
    }

    fn ntaps(&self) -> usize {
        self.a.len().max(self.b.len())
    }

    /// Both polynomials zero-padded to a common length.
    fn padded(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.ntaps();
        let mut b = self.b.clone();
        let mut a = self.a.clone();
        b.resize(n, 0.0);
        a.resize(n, 0.0);
        (b, a)
    }

    /// Direct form II transposed, starting from state `zi`.
    fn lfilter(&self, x: &[f64], zi: &[f64]) -> Vec<f64> {
        let (b, a) = self.padded();
        let n = b.len();
        let mut z = zi.to_vec();
        let mut y = Vec::with_capacity(x.len());

        for &xn in x {
            let yn = b[0] * xn + z.first().copied().unwrap_or(0.0);
            for i in 0..n.saturating_sub(2) {
                z[i] = b[i + 1] * xn + z[i + 1] - a[i + 1] * yn;
            }
            if n > 1 {
                z[n - 2] = b[n - 1] * xn - a[n - 1] * yn;
            }
            y.push(yn);
        }
        y
    }

    /// Initial state for a step response in steady state.
    fn lfilter_zi(&self) -> Result<Vec<f64>, SignalError> {
        let (b, a) = self.padded();
        let n = b.len();
        if n == 1 {
            return Ok(Vec::new());
        }

        // (I - A) zi = B with A the companion matrix of the denominator.
        let m = n - 1;
        let i_minus_a = DMatrix::from_fn(m, m, |i, j| {
            let mut v = if i == j { 1.0 } else { 0.0 };
            if j == 0 {
                v += a[i + 1];
            }
            if j == i + 1 {
                v -= 1.0;
            }
            v
        });
        let rhs: Vec<f64> = (0..m).map(|i| b[i + 1] - a[i + 1] * b[0]).collect();
        solve_dense(i_minus_a, rhs, "filter initial conditions")
    }

    /// Forward-backward (zero-phase) filtering with odd extension at the edges.
    ///
    /// The extension is `3 * ntaps` samples, cut to `len - 1` for short input.
    pub fn filtfilt(&self, x: &[f64]) -> Result<Vec<f64>, SignalError> {
        if x.is_empty() {
            return Err(SignalError::SignalTooShort { len: 0, edge: 0 });
        }
        let full_edge = 3 * self.ntaps();
        let edge = full_edge.min(x.len() - 1);
        if edge < full_edge {
            log::debug!(
                "odd extension cut from {full_edge} to {edge} samples for a {}-sample series",
                x.len()
            );
        }

        let ext = odd_extend(x, edge);
        let zi = self.lfilter_zi()?;

        let scaled = |v: f64| zi.iter().map(|z| z * v).collect::<Vec<f64>>();
        let mut y = self.lfilter(&ext, &scaled(ext[0]));
        y.reverse();
        let mut y = self.lfilter(&y, &scaled(y[0]));
        y.reverse();

        Ok(y[edge..y.len() - edge].to_vec())
    }
}

/// `[2*x0 - x[edge..=1], x, 2*xn - x[n-2..=n-1-edge]]`
fn odd_extend(x: &[f64], edge: usize) -> Vec<f64> {
    let n = x.len();
    let (first, last) = (x[0], x[n - 1]);
    let mut out = Vec::with_capacity(n + 2 * edge);
    out.extend((1..=edge).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=edge).map(|i| 2.0 * last - x[n - 1 - i]));
    out
}

// ---------------------------------------------------------------------------
// Filter design
// ---------------------------------------------------------------------------

/// Digital Butterworth low-pass of `order` at normalised cutoff `wn`.
///
/// Analog prototype poles, pre-warped frequency scaling and the bilinear
/// transform. `wn >= 1` (cutoff at or above Nyquist) attenuates nothing.
pub fn butter_lowpass(order: usize, wn: f64) -> TransferFunction {
    if wn >= 1.0 {
        return TransferFunction::identity();
    }

    let fs = 2.0;
    let warped = 2.0 * fs * (PI * wn / fs).tan();
    let n = order as f64;

    let analog_poles: Vec<Complex64> = (0..order)
        .map(|i| {
            let m = -(n - 1.0) + 2.0 * i as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n)) * warped
        })
        .collect();
    let gain = warped.powi(order as i32);

    let fs2 = Complex64::new(2.0 * fs, 0.0);
    let digital_poles: Vec<Complex64> = analog_poles.iter().map(|p| (fs2 + p) / (fs2 - p)).collect();
    let digital_zeros = vec![Complex64::new(-1.0, 0.0); order];
    let denom: Complex64 = analog_poles.iter().map(|p| fs2 - p).product();
    let digital_gain = gain * (Complex64::new(1.0, 0.0) / denom).re;

    let b = poly(&digital_zeros)
        .into_iter()
        .map(|c| c.re * digital_gain)
        .collect();
    let a = poly(&digital_poles).into_iter().map(|c| c.re).collect();
    TransferFunction { b, a }
}

/// Windowed-sinc FIR low-pass with unit gain at DC.
pub fn fir_lowpass(numtaps: usize, wn: f64, window: Window) -> TransferFunction {
    if wn >= 1.0 {
        return TransferFunction::identity();
    }

    let alpha = 0.5 * (numtaps as f64 - 1.0);
    let mut h: Vec<f64> = (0..numtaps)
        .map(|i| {
            let m = i as f64 - alpha;
            wn * sinc(wn * m)
        })
        .zip(window.coefficients(numtaps))
        .map(|(v, w)| v * w)
        .collect();

    let dc: f64 = h.iter().sum();
    for v in &mut h {
        *v /= dc;
    }
    TransferFunction {
        b: h,
        a: vec![1.0],
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Monic polynomial with the given roots, highest power first.
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for r in roots {
        let mut next = coeffs.clone();
        next.push(Complex64::new(0.0, 0.0));
        for i in 1..next.len() {
            next[i] -= r * coeffs[i - 1];
        }
        coeffs = next;
    }
    coeffs
}

// ---------------------------------------------------------------------------
// Smoothing entry points
// ---------------------------------------------------------------------------

/// Mirror `x` around its end samples (edge sample not repeated).
pub fn reflect_pad(x: &[f64], padlen: usize) -> Result<Vec<f64>, SignalError> {
    let n = x.len();
    if padlen >= n {
        return Err(SignalError::PadTooLong { padlen, len: n });
    }
    let mut out = Vec::with_capacity(n + 2 * padlen);
    out.extend((1..=padlen).rev().map(|i| x[i]));
    out.extend_from_slice(x);
    out.extend((1..=padlen).map(|i| x[n - 1 - i]));
    Ok(out)
}

/// Reflect-pad, filter forward and backward, strip the padding.
pub fn smooth_series(
    x: &[f64],
    tf: &TransferFunction,
    padlen: usize,
) -> Result<Vec<f64>, SignalError> {
    if x.iter().any(|v| !v.is_finite()) {
        return Err(SignalError::InvalidParameter(
            "series contains missing or non-finite samples".into(),
        ));
    }
    let padded = reflect_pad(x, padlen)?;
    let filtered = tf.filtfilt(&padded)?;
    Ok(filtered[padlen..padlen + x.len()].to_vec())
}

/// Smooth both coordinates of a gap-free trajectory independently.
pub fn smooth(trajectory: &Trajectory, params: &FilterParams) -> Result<Trajectory, SignalError> {
    let tf = params.design()?;
    log::debug!(
        "{} low-pass at {:.3} x Nyquist ({} b / {} a coefficients)",
        params.method,
        params.normalized_cutoff(),
        tf.b.len(),
        tf.a.len()
    );
    Ok(Trajectory {
        x: smooth_series(&trajectory.x, &tf, params.padlen)?,
        y: smooth_series(&trajectory.y, &tf, params.padlen)?,
    })
}
