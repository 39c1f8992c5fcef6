use serde::{Deserialize, Serialize};

use super::linalg::BandMatrix;
use super::SignalError;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Gap-filling settings: spline degree `k` and smoothing factor `s`.
///
/// `s = 0` gives an interpolating spline through every known sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineParams {
    pub degree: usize,
    pub smoothing: f64,
}

impl Default for SplineParams {
    fn default() -> Self {
        Self {
            degree: 3,
            smoothing: 0.0,
        }
    }
}

impl SplineParams {
    pub fn validate(&self) -> Result<(), SignalError> {
        if !(1..=5).contains(&self.degree) {
            return Err(SignalError::InvalidDegree(self.degree));
        }
        if !self.smoothing.is_finite() || self.smoothing < 0.0 {
            return Err(SignalError::InvalidParameter(format!(
                "smoothing factor must be a non-negative number, got {}",
                self.smoothing
            )));
        }
        if self.smoothing > 0.0 && self.degree != 3 {
            return Err(SignalError::InvalidParameter(
                "smoothing factor > 0 is only supported for cubic splines".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Gap filling
// ---------------------------------------------------------------------------

/// Replace every `NaN` in `values` by a spline fitted over the known samples.
///
/// The independent variable is the position in the slice. Known samples are
/// left untouched; gaps at either end are extrapolated.
pub fn fill_gaps(values: &[f64], params: &SplineParams) -> Result<Vec<f64>, SignalError> {
    params.validate()?;

    let (xs, ys): (Vec<f64>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, v)| (i as f64, *v))
        .unzip();

    if xs.len() == values.len() {
        return Ok(values.to_vec());
    }

    let needed = params.degree + 1;
    if xs.len() < needed {
        return Err(SignalError::InsufficientPoints {
            degree: params.degree,
            needed,
            found: xs.len(),
        });
    }

    let curve = if params.smoothing == 0.0 {
        FittedCurve::Interpolating(BSpline::interpolate(&xs, &ys, params.degree)?)
    } else {
        FittedCurve::Smoothing(SmoothingSpline::fit(&xs, &ys, params.smoothing)?)
    };

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, v)| if v.is_nan() { curve.eval(i as f64) } else { *v })
        .collect())
}

enum FittedCurve {
    Interpolating(BSpline),
    Smoothing(SmoothingSpline),
}

impl FittedCurve {
    fn eval(&self, x: f64) -> f64 {
        match self {
            FittedCurve::Interpolating(s) => s.eval(x),
            FittedCurve::Smoothing(s) => s.eval(x),
        }
    }
}

// ---------------------------------------------------------------------------
// BSpline – interpolating B-spline of degree k
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct BSpline {
    degree: usize,
    knots: Vec<f64>,
    coeffs: Vec<f64>,
}

impl BSpline {
    /// Interpolate strictly increasing `x` with `x.len() >= k + 1`.
    fn interpolate(x: &[f64], y: &[f64], k: usize) -> Result<Self, SignalError> {
        let n = x.len();
        let knots = interpolation_knots(x, k);

        let spans: Vec<usize> = x.iter().map(|&xi| find_span(&knots, k, xi)).collect();
        // Row i is nonzero in columns span_i - k ..= span_i.
        let kl = spans
            .iter()
            .enumerate()
            .map(|(i, &s)| i.saturating_sub(s - k))
            .max()
            .unwrap_or(0);
        let ku = spans
            .iter()
            .enumerate()
            .map(|(i, &s)| s.saturating_sub(i))
            .max()
            .unwrap_or(0);

        let mut matrix = BandMatrix::zeros(n, kl, ku);
        for (i, (&xi, &span)) in x.iter().zip(&spans).enumerate() {
            for (j, b) in basis_functions(&knots, k, span, xi).into_iter().enumerate() {
                matrix.set(i, span - k + j, b);
            }
        }

        let mut coeffs = y.to_vec();
        matrix.solve(&mut coeffs, "spline coefficients")?;

        Ok(Self {
            degree: k,
            knots,
            coeffs,
        })
    }

    fn eval(&self, x: f64) -> f64 {
        let k = self.degree;
        let span = find_span(&self.knots, k, x);
        basis_functions(&self.knots, k, span, x)
            .into_iter()
            .enumerate()
            .map(|(j, b)| b * self.coeffs[span - k + j])
            .sum()
    }
}

/// Clamped knot vector with interior knots at the data sites (odd k) or at
/// midpoints between them (even k), giving a square collocation system.
fn interpolation_knots(x: &[f64], k: usize) -> Vec<f64> {
    let n = x.len();
    let interior = n - k - 1;
    let offset = k / 2 + 1;

    let mut knots = Vec::with_capacity(n + k + 1);
    knots.extend(std::iter::repeat(x[0]).take(k + 1));
    for l in 0..interior {
        let j = offset + l;
        if k % 2 == 1 {
            knots.push(x[j]);
        } else {
            knots.push(0.5 * (x[j] + x[j - 1]));
        }
    }
    knots.extend(std::iter::repeat(x[n - 1]).take(k + 1));
    knots
}

/// Knot span index for `x`, clamped to the valid range so values outside the
/// knot vector extrapolate the end polynomial pieces.
fn find_span(knots: &[f64], k: usize, x: f64) -> usize {
    let n_coeffs = knots.len() - k - 1;
    let span = knots.partition_point(|&t| t <= x).saturating_sub(1);
    span.clamp(k, n_coeffs - 1)
}

/// The `k + 1` nonzero basis functions on `span` evaluated at `x`.
fn basis_functions(knots: &[f64], k: usize, span: usize, x: f64) -> Vec<f64> {
    let mut values = vec![0.0; k + 1];
    let mut left = vec![0.0; k + 1];
    let mut right = vec![0.0; k + 1];
    values[0] = 1.0;

    for j in 1..=k {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = values[r] / (right[r + 1] + left[j - r]);
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }
    values
}

// ---------------------------------------------------------------------------
// SmoothingSpline – cubic smoothing spline with residual budget s
// ---------------------------------------------------------------------------

/// Natural cubic spline minimising curvature subject to
/// `sum((y - g)^2) <= s` over the known samples.
#[derive(Debug, Clone)]
struct SmoothingSpline {
    x: Vec<f64>,
    /// Fitted values at `x`.
    g: Vec<f64>,
    /// Second derivatives at `x` (zero at both ends).
    m: Vec<f64>,
}

impl SmoothingSpline {
    fn fit(x: &[f64], y: &[f64], s: f64) -> Result<Self, SignalError> {
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Columns of Q (n x n-2): rows j, j+1, j+2.
        let q: Vec<[f64; 3]> = (0..n - 2)
            .map(|j| {
                let a = 1.0 / h[j];
                let c = 1.0 / h[j + 1];
                [a, -a - c, c]
            })
            .collect();
        let qty: Vec<f64> = q
            .iter()
            .enumerate()
            .map(|(j, col)| col[0] * y[j] + col[1] * y[j + 1] + col[2] * y[j + 2])
            .collect();

        let line = least_squares_line(x, y);
        let line_rss: f64 = x
            .iter()
            .zip(y)
            .map(|(&xi, &yi)| (yi - line(xi)).powi(2))
            .sum();
        if s >= line_rss {
            log::debug!("smoothing factor {s} >= straight-line residual {line_rss}, fitting a line");
            return Ok(Self {
                x: x.to_vec(),
                g: x.iter().map(|&xi| line(xi)).collect(),
                m: vec![0.0; n],
            });
        }

        let solve = |lambda: f64| -> Result<(Vec<f64>, Vec<f64>), SignalError> {
            let mut gamma = qty.clone();
            penalised_system(&h, &q, lambda).solve(&mut gamma, "smoothing spline")?;
            let mut q_gamma = vec![0.0; n];
            for (j, col) in q.iter().enumerate() {
                for (r, qv) in col.iter().enumerate() {
                    q_gamma[j + r] += qv * gamma[j];
                }
            }
            Ok((gamma, q_gamma))
        };
        let rss = |q_gamma: &[f64], lambda: f64| -> f64 {
            q_gamma.iter().map(|v| (lambda * v).powi(2)).sum()
        };

        // Residual grows monotonically with lambda; bracket then bisect in log space.
        let mut lo = 1e-12_f64;
        let mut hi = 1.0_f64;
        while rss(&solve(hi)?.1, hi) < s && hi < 1e30 {
            lo = hi;
            hi *= 10.0;
        }
        for _ in 0..200 {
            let mid = (lo * hi).sqrt();
            let r = rss(&solve(mid)?.1, mid);
            if (r - s).abs() <= 1e-10 * s {
                lo = mid;
                hi = mid;
                break;
            }
            if r < s {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let lambda = (lo * hi).sqrt();
        let (gamma, q_gamma) = solve(lambda)?;

        let g = y
            .iter()
            .zip(&q_gamma)
            .map(|(yi, qg)| yi - lambda * qg)
            .collect();
        let mut m = vec![0.0; n];
        m[1..n - 1].copy_from_slice(&gamma);

        Ok(Self {
            x: x.to_vec(),
            g,
            m,
        })
    }

    fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        let i = self
            .x
            .partition_point(|&t| t <= x)
            .saturating_sub(1)
            .min(n - 2);
        let h = self.x[i + 1] - self.x[i];
        let t1 = self.x[i + 1] - x;
        let t0 = x - self.x[i];
        let (g0, g1) = (self.g[i], self.g[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);

        m0 * t1.powi(3) / (6.0 * h)
            + m1 * t0.powi(3) / (6.0 * h)
            + (g0 / h - m0 * h / 6.0) * t1
            + (g1 / h - m1 * h / 6.0) * t0
    }
}

/// `R + lambda * Q^T Q` as a pentadiagonal band matrix.
fn penalised_system(h: &[f64], q: &[[f64; 3]], lambda: f64) -> BandMatrix {
    let m = q.len();
    let mut a = BandMatrix::zeros(m, 2, 2);
    for j in 0..m {
        let col = &q[j];
        a.set(j, j, (h[j] + h[j + 1]) / 3.0 + lambda * col.iter().map(|v| v * v).sum::<f64>());
        if j + 1 < m {
            let next = &q[j + 1];
            let v = h[j + 1] / 6.0 + lambda * (col[1] * next[0] + col[2] * next[1]);
            a.set(j, j + 1, v);
            a.set(j + 1, j, v);
        }
        if j + 2 < m {
            let v = lambda * col[2] * q[j + 2][0];
            a.set(j, j + 2, v);
            a.set(j + 2, j, v);
        }
    }
    a
}

fn least_squares_line(x: &[f64], y: &[f64]) -> impl Fn(f64) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let sxy: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - mx) * (yi - my)).sum();
    let sxx: f64 = x.iter().map(|xi| (xi - mx).powi(2)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    move |xi| my + slope * (xi - mx)
}
