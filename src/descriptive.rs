//! Descriptive statistics for a single sample.
//!
//! # Examples
//!
//! ```
//! use u_inference::{describe, TestOptions};
//!
//! let d = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], &TestOptions::default()).unwrap();
//! assert_eq!(d.mean, 5.0);
//! assert_eq!(d.median, 4.5);
//! assert_eq!(d.mode, vec![4.0]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use u_numflow::{special, stats};

use crate::config::TestOptions;
use crate::error::InferenceResult;
use crate::result::{ConfidenceInterval, GroupStatistic};
use crate::validation::{require_finite_stats, required_stat, validate_sample};

/// Summary of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStatistics {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    /// Most frequent values in ascending order; empty when no value repeats.
    pub mode: Vec<f64>,
    /// Sample variance (n − 1 denominator).
    pub variance: f64,
    pub sd: f64,
    /// Standard error of the mean, sd / √n.
    pub se: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    /// First quartile (R-7).
    pub q1: f64,
    /// Third quartile (R-7).
    pub q3: f64,
    pub iqr: f64,
    /// Adjusted Fisher–Pearson skewness G₁; `None` if n < 3 or zero variance.
    pub skewness: Option<f64>,
    /// Excess kurtosis G₂; `None` if n < 4 or zero variance.
    pub kurtosis: Option<f64>,
    /// t-based interval for the mean at the configured confidence level.
    pub confidence_interval: ConfidenceInterval,
}

/// Computes descriptive statistics for `data`.
///
/// # Errors
///
/// - [`InsufficientData`](crate::InferenceError::InsufficientData) if n < 2
/// - [`NonFiniteValue`](crate::InferenceError::NonFiniteValue) for NaN/±∞
/// - [`InvalidParameter`](crate::InferenceError::InvalidParameter) for
///   out-of-range options
/// - [`NumericalOverflow`](crate::InferenceError::NumericalOverflow) if the
///   mean or variance exceeds `f64` range
pub fn describe(data: &[f64], options: &TestOptions) -> InferenceResult<DescriptiveStatistics> {
    options.validate()?;
    validate_sample(data, "sample")?;

    let n = data.len();
    let label = "sample";
    let mean = required_stat(stats::mean(data), label, n)?;
    let variance = required_stat(stats::variance(data), label, n)?;
    require_finite_stats("sample variance exceeds floating-point range", &[mean, variance])?;
    let sd = variance.sqrt();
    let se = sd / (n as f64).sqrt();
    let min = required_stat(stats::min(data), label, n)?;
    let max = required_stat(stats::max(data), label, n)?;

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = required_stat(stats::quantile_sorted(&sorted, 0.5), label, n)?;
    let q1 = required_stat(stats::quantile_sorted(&sorted, 0.25), label, n)?;
    let q3 = required_stat(stats::quantile_sorted(&sorted, 0.75), label, n)?;

    let level = options.confidence_level;
    let critical = special::t_distribution_quantile(0.5 + level / 2.0, (n - 1) as f64);

    let result = DescriptiveStatistics {
        n,
        mean,
        median,
        mode: modes(&sorted),
        variance,
        sd,
        se,
        min,
        max,
        range: max - min,
        q1,
        q3,
        iqr: q3 - q1,
        skewness: stats::skewness(data),
        kurtosis: stats::kurtosis(data),
        confidence_interval: ConfidenceInterval::symmetric(level, mean, critical, se),
    };
    debug!(n, mean, sd, "descriptive statistics computed");
    Ok(result)
}

/// Builds the [`GroupStatistic`] snapshot of one sample.
///
/// # Errors
///
/// Same checks as [`describe`], reported under `name`.
pub fn summarize_group(name: impl Into<String>, data: &[f64]) -> InferenceResult<GroupStatistic> {
    let name = name.into();
    validate_sample(data, &name)?;
    let n = data.len();
    let mean = required_stat(stats::mean(data), &name, n)?;
    let sd = required_stat(stats::std_dev(data), &name, n)?;
    require_finite_stats("group variance exceeds floating-point range", &[mean, sd * sd])?;
    Ok(GroupStatistic {
        n,
        mean,
        sd,
        median: required_stat(stats::median(data), &name, n)?,
        mean_rank: None,
        name,
    })
}

/// Validates every group and snapshots it under its configured name.
pub(crate) fn summarize_groups(
    groups: &[&[f64]],
    options: &TestOptions,
) -> InferenceResult<Vec<GroupStatistic>> {
    groups
        .iter()
        .enumerate()
        .map(|(i, g)| summarize_group(options.group_name(i), g))
        .collect()
}

fn modes(sorted: &[f64]) -> Vec<f64> {
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for &x in sorted {
        match runs.last_mut() {
            Some((value, count)) if *value == x => *count += 1,
            _ => runs.push((x, 1)),
        }
    }
    let max_count = runs.iter().map(|&(_, c)| c).max().unwrap_or(0);
    if max_count <= 1 {
        return Vec::new();
    }
    runs.into_iter()
        .filter(|&(_, c)| c == max_count)
        .map(|(v, _)| v)
        .collect()
}
