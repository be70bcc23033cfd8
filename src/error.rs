use thiserror::Error;

/// Errors raised by the inference routines.
///
/// Input checks run before any numeric work; the computed statistics are
/// checked for overflow afterwards. A call either returns a complete,
/// finite result or one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Insufficient data: {label} has {actual} value(s), need at least {required}")]
    InsufficientData {
        label: String,
        required: usize,
        actual: usize,
    },

    #[error("Sample size mismatch: paired design got {left} and {right} observations")]
    SampleSizeMismatch { left: usize, right: usize },

    #[error("Degenerate variance: {0}")]
    DegenerateVariance(&'static str),

    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Non-finite value in {label} at index {index}")]
    NonFiniteValue { label: String, index: usize },

    #[error("Numerical overflow: {0}")]
    NumericalOverflow(&'static str),
}

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;
