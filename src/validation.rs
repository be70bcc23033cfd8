//! Input checks shared by every test.

use tracing::warn;

use crate::config::TestOptions;
use crate::error::{InferenceError, InferenceResult};

/// Minimum observations per sample or group.
pub(crate) const MIN_SAMPLE_SIZE: usize = 2;

pub(crate) fn require_finite(data: &[f64], label: &str) -> InferenceResult<()> {
    match data.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(InferenceError::NonFiniteValue {
            label: label.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

pub(crate) fn require_min_len(data: &[f64], min: usize, label: &str) -> InferenceResult<()> {
    if data.len() < min {
        return Err(InferenceError::InsufficientData {
            label: label.to_string(),
            required: min,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Length >= [`MIN_SAMPLE_SIZE`] and every value finite.
pub(crate) fn validate_sample(data: &[f64], label: &str) -> InferenceResult<()> {
    require_min_len(data, MIN_SAMPLE_SIZE, label)?;
    require_finite(data, label)
}

pub(crate) fn require_group_count(k: usize, min: usize) -> InferenceResult<()> {
    if k < min {
        return Err(InferenceError::InsufficientData {
            label: "groups".to_string(),
            required: min,
            actual: k,
        });
    }
    Ok(())
}

/// Unwraps a `u_numflow::stats` result for a sample already validated
/// by [`validate_sample`].
pub(crate) fn required_stat(value: Option<f64>, label: &str, n: usize) -> InferenceResult<f64> {
    value.ok_or_else(|| InferenceError::InsufficientData {
        label: label.to_string(),
        required: MIN_SAMPLE_SIZE,
        actual: n,
    })
}

/// Every computed quantity is finite. Finite inputs of extreme magnitude
/// can still overflow sums of squares.
pub(crate) fn require_finite_stats(context: &'static str, values: &[f64]) -> InferenceResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    warn!(context, "statistic is not finite");
    Err(InferenceError::NumericalOverflow(context))
}

/// Options are in range and any group names cover exactly `k` groups.
pub(crate) fn validate_options(options: &TestOptions, k: usize) -> InferenceResult<()> {
    options.validate()?;
    if let Some(names) = &options.group_names {
        if names.len() != k {
            return Err(InferenceError::InvalidParameter {
                name: "groupNames",
                value: names.len() as f64,
                reason: "must name every group exactly once",
            });
        }
    }
    Ok(())
}
