//! Wilcoxon signed-rank test for paired samples.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use u_numflow::stats;

use crate::config::TestOptions;
use crate::descriptive::summarize_groups;
use crate::distribution::normal_two_tailed_p;
use crate::error::{InferenceError, InferenceResult};
use crate::rank::rank;
use crate::result::{EffectSizeLabel, GroupStatistic};
use crate::validation::{require_min_len, required_stat, validate_options};

use super::continuity_corrected;

const MIN_PAIRS: usize = 5;
const MIN_NONZERO_DIFFERENCES: usize = 3;

/// Result of a Wilcoxon signed-rank test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WilcoxonResult {
    /// min(W⁺, W⁻).
    pub w: f64,
    /// Sum of ranks of positive differences (after > before).
    pub w_plus: f64,
    /// Sum of ranks of negative differences.
    pub w_minus: f64,
    /// Number of pairs supplied.
    pub n: usize,
    /// Pairs dropped for a zero difference.
    pub n_excluded: usize,
    /// Pairs entering the ranking, n − n_excluded.
    pub n_effective: usize,
    pub z: f64,
    pub p_value: f64,
    /// (W⁺ − W⁻) / (n_effective(n_effective+1)/2).
    pub rank_biserial_r: f64,
    pub effect_size_label: EffectSizeLabel,
    /// Median of after − before over all pairs.
    pub median_difference: f64,
    /// Snapshots of the before and after samples.
    pub groups: Vec<GroupStatistic>,
    pub significant: bool,
}

/// Wilcoxon signed-rank test on the differences `after[i] − before[i]`.
///
/// # Algorithm
///
/// 1. Drop zero differences (Wilcoxon's method)
/// 2. Rank |dᵢ| with average ranks; W⁺, W⁻ are the rank sums by sign
/// 3. W = min(W⁺, W⁻), μ = n(n+1)/4, σ² = n(n+1)(2n+1)/24 − T/48
/// 4. z = (W − μ ± 0.5) / σ with the correction pulling toward zero when
///    enabled; z ≤ 0 by construction
///
/// Reference: Wilcoxon (1945), "Individual comparisons by ranking
/// methods", *Biometrics Bulletin* 1(6), 80–83.
///
/// # Errors
///
/// - [`SampleSizeMismatch`](InferenceError::SampleSizeMismatch) for unequal lengths
/// - [`InsufficientData`](InferenceError::InsufficientData) for fewer than 5 pairs
///   or fewer than 3 non-zero differences
/// - [`NonFiniteValue`](InferenceError::NonFiniteValue) for NaN/±∞
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if a group's
///   variance exceeds `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{wilcoxon_signed_rank_test, TestOptions};
///
/// let before = [72.0, 68.0, 80.0, 75.0, 66.0, 79.0, 71.0, 74.0, 70.0, 77.0];
/// let after = [75.0, 70.0, 84.0, 76.0, 70.0, 83.0, 72.0, 79.0, 70.0, 75.0];
/// let r = wilcoxon_signed_rank_test(&before, &after, &TestOptions::default()).unwrap();
/// assert_eq!(r.n_excluded, 1);
/// assert_eq!(r.w, 3.5);
/// assert!(r.significant);
/// ```
pub fn wilcoxon_signed_rank_test(
    before: &[f64],
    after: &[f64],
    options: &TestOptions,
) -> InferenceResult<WilcoxonResult> {
    validate_options(options, 2)?;
    if before.len() != after.len() {
        return Err(InferenceError::SampleSizeMismatch {
            left: before.len(),
            right: after.len(),
        });
    }
    require_min_len(before, MIN_PAIRS, "pairs")?;
    let groups = summarize_groups(&[before, after], options)?;

    let all_diffs: Vec<f64> = before.iter().zip(after).map(|(b, a)| a - b).collect();
    let diffs: Vec<f64> = all_diffs.iter().copied().filter(|&d| d != 0.0).collect();
    let n = before.len();
    let n_effective = diffs.len();
    require_min_len(&diffs, MIN_NONZERO_DIFFERENCES, "non-zero differences")?;

    let abs_diffs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranking = rank(&abs_diffs);
    let (mut w_plus, mut w_minus) = (0.0, 0.0);
    for (&d, &r) in diffs.iter().zip(&ranking.ranks) {
        if d > 0.0 {
            w_plus += r;
        } else {
            w_minus += r;
        }
    }
    let w = w_plus.min(w_minus);

    let m = n_effective as f64;
    let total_rank = m * (m + 1.0) / 2.0;
    let mu = total_rank / 2.0;
    let variance = m * (m + 1.0) * (2.0 * m + 1.0) / 24.0 - ranking.tie_term / 48.0;
    if variance <= 0.0 {
        warn!("wilcoxon: signed-rank variance is zero");
        return Err(InferenceError::DegenerateVariance(
            "signed-rank variance is zero",
        ));
    }
    let deviation = w - mu;
    let numerator = if options.continuity_correction {
        continuity_corrected(deviation)
    } else {
        deviation
    };
    let z = numerator / variance.sqrt();
    let p_value = normal_two_tailed_p(z);
    let rank_biserial_r = (w_plus - w_minus) / total_rank;
    let median_difference = required_stat(stats::median(&all_diffs), "differences", n)?;

    debug!(w, z, p_value, rank_biserial_r, n_effective, "wilcoxon signed-rank test");
    Ok(WilcoxonResult {
        w,
        w_plus,
        w_minus,
        n,
        n_excluded: n - n_effective,
        n_effective,
        z,
        p_value,
        rank_biserial_r,
        effect_size_label: EffectSizeLabel::for_correlation(rank_biserial_r),
        median_difference,
        groups,
        significant: p_value < options.alpha,
    })
}
