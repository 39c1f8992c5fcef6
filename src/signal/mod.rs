/// Signal layer: gap filling and zero-phase smoothing of coordinate series.
///
/// ```text
///   raw series (NaN = missing)
///        │
///        ▼
///   ┌──────────┐
///   │  spline   │  interpolate missing samples over the frame index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  reflect-pad → forward/backward low-pass → trim
///   └──────────┘
/// ```

pub mod filter;
mod linalg;
pub mod spline;

use thiserror::Error;

/// Failures of the numeric stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    #[error("need at least {needed} known samples for a degree-{degree} spline, found {found}")]
    InsufficientPoints {
        degree: usize,
        needed: usize,
        found: usize,
    },
    #[error("spline degree must be between 1 and 5, got {0}")]
    InvalidDegree(usize),
    #[error("invalid filter method '{0}' (expected 'butterworth' or 'fir')")]
    InvalidMethod(String),
    #[error("invalid cutoff {cutoff} Hz for sample rate {sample_rate} Hz")]
    InvalidCutoff { cutoff: f64, sample_rate: f64 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("padding length {padlen} must be smaller than the series length {len}")]
    PadTooLong { padlen: usize, len: usize },
    #[error("series of length {len} is too short for the filter (need more than {edge} samples)")]
    SignalTooShort { len: usize, edge: usize },
    #[error("singular system while solving for {0}")]
    Singular(&'static str),
}
