use thiserror::Error;

use crate::constants::Minute;

/// Failure to turn a raw element record into [`OrbitalElements`](crate::elements::OrbitalElements).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Element record is missing line {0}")]
    MissingLine(u8),

    #[error("Line {line} must start with '{line} ', found: {found:?}")]
    LinePrefix { line: u8, found: String },

    #[error("Line {line} is too short: {len} characters, at least {min} required")]
    LineTooShort { line: u8, len: usize, min: usize },

    #[error("Element record contains non-ASCII characters")]
    NonAscii,

    #[error("Invalid value for field {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("Invalid epoch: {0}")]
    InvalidEpoch(String),

    #[error("Eccentricity out of range [0, 1): {0}")]
    EccentricityOutOfRange(f64),

    #[error("Mean motion must be strictly positive: {0} rev/day")]
    NonPositiveMeanMotion(f64),

    #[error("Field {0} is not a finite number")]
    NonFinite(&'static str),
}

/// Reason why the analytic model declares an orbit decayed or degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayCause {
    /// Secular mean motion dropped to zero or below
    MeanMotion(f64),
    /// Mean eccentricity left [-0.001, 1)
    MeanEccentricity(f64),
    /// Eccentricity after lunar-solar periodics left [0, 1]
    PerturbedEccentricity(f64),
    /// Negative semi-latus rectum
    SemiLatusRectum(f64),
    /// Radius below one Earth radius (earth radii)
    SubSurface(f64),
}

impl std::fmt::Display for DecayCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecayCause::MeanMotion(n) => write!(f, "mean motion {n:.3e} rad/min is not positive"),
            DecayCause::MeanEccentricity(e) => write!(f, "mean eccentricity {e} out of range"),
            DecayCause::PerturbedEccentricity(e) => {
                write!(f, "perturbed eccentricity {e} out of range")
            }
            DecayCause::SemiLatusRectum(p) => write!(f, "semi-latus rectum {p} is negative"),
            DecayCause::SubSurface(r) => write!(f, "radius {r:.6} earth radii is below the surface"),
        }
    }
}

/// Failure of a single SGP4/SDP4 evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("Orbit decayed at {minutes:.3} min from epoch: {cause}")]
    Decayed { minutes: Minute, cause: DecayCause },

    #[error("Propagation diverged at {minutes:.3} min from epoch after {iterations} iterations")]
    Diverged { minutes: Minute, iterations: usize },
}

#[derive(Error, Debug)]
pub enum SkypassError {
    #[error("Element decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Propagation failed: {0}")]
    Propagation(#[from] PropagationError),

    #[error("No constellation matches object name: {0}")]
    ConstellationUnresolved(String),

    #[error("Invalid observer: {0}")]
    InvalidObserver(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PartialEq for SkypassError {
    fn eq(&self, other: &Self) -> bool {
        use SkypassError::*;
        match (self, other) {
            (Decode(a), Decode(b)) => a == b,
            (Propagation(a), Propagation(b)) => a == b,
            (ConstellationUnresolved(a), ConstellationUnresolved(b)) => a == b,
            (InvalidObserver(a), InvalidObserver(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,

            // not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
