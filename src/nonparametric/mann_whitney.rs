//! Mann–Whitney U test (Wilcoxon rank-sum) for two independent samples.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TestOptions;
use crate::descriptive::summarize_groups;
use crate::distribution::normal_two_tailed_p;
use crate::error::{InferenceError, InferenceResult};
use crate::rank::rank_groups;
use crate::result::{EffectSizeLabel, GroupStatistic};
use crate::validation::validate_options;

use super::continuity_corrected;

/// Result of a Mann–Whitney U test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MannWhitneyResult {
    /// min(U₁, U₂).
    pub u: f64,
    /// R₁ − n₁(n₁+1)/2.
    pub u1: f64,
    /// n₁n₂ − U₁.
    pub u2: f64,
    /// Normal approximation of U₂; negative when group 1 ranks higher.
    pub z: f64,
    pub p_value: f64,
    /// (U₁ − U₂) / (n₁n₂), positive when group 1 ranks higher.
    pub rank_biserial_r: f64,
    pub effect_size_label: EffectSizeLabel,
    /// Group snapshots including median and mean rank.
    pub groups: Vec<GroupStatistic>,
    /// Tie term T = Σ(t³ − t) of the pooled sample.
    pub tie_term: f64,
    pub continuity_corrected: bool,
    pub significant: bool,
}

/// Mann–Whitney U test with tie-adjusted normal approximation.
///
/// # Algorithm
///
/// 1. Rank the pooled sample (average ranks for ties)
/// 2. U₁ = R₁ − n₁(n₁+1)/2, U₂ = n₁n₂ − U₁, U = min(U₁, U₂)
/// 3. σ² = n₁n₂(N+1)/12 − n₁n₂T / (12N(N−1))
/// 4. z = (U₂ − n₁n₂/2 ± 0.5) / σ, the ±0.5 pulling toward zero when
///    continuity correction is enabled
/// 5. r = 1 − 2U₂/(n₁n₂)
///
/// Swapping the groups negates z and r and leaves U and p unchanged.
///
/// Reference: Mann & Whitney (1947), "On a test of whether one of two
/// random variables is stochastically larger than the other",
/// *Annals of Mathematical Statistics* 18(1), 50–60.
///
/// # Errors
///
/// - [`InsufficientData`](InferenceError::InsufficientData) if either group has n < 2
/// - [`NonFiniteValue`](InferenceError::NonFiniteValue) for NaN/±∞
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if every
///   pooled value is tied
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if a group's
///   variance exceeds `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{mann_whitney_u_test, TestOptions};
///
/// let g1 = [85.0, 72.0, 91.0, 68.0, 77.0, 95.0, 83.0, 89.0];
/// let g2 = [65.0, 78.0, 71.0, 62.0, 73.0, 69.0, 75.0, 67.0];
/// let r = mann_whitney_u_test(&g1, &g2, &TestOptions::default()).unwrap();
/// assert_eq!(r.u, 9.0);
/// assert_eq!(r.u1 + r.u2, 64.0);
/// assert!(r.z < 0.0 && r.rank_biserial_r > 0.0);
/// ```
pub fn mann_whitney_u_test(
    group1: &[f64],
    group2: &[f64],
    options: &TestOptions,
) -> InferenceResult<MannWhitneyResult> {
    validate_options(options, 2)?;
    let mut groups = summarize_groups(&[group1, group2], options)?;

    let ranking = rank_groups(&[group1, group2]);
    let n1 = group1.len() as f64;
    let n2 = group2.len() as f64;
    let n = n1 + n2;
    let n1n2 = n1 * n2;

    let u1 = ranking.rank_sums[0] - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1n2 - u1;
    let u = u1.min(u2);

    let variance =
        n1n2 * (n + 1.0) / 12.0 - n1n2 * ranking.tie_term / (12.0 * n * (n - 1.0));
    if variance <= 0.0 {
        warn!("mann-whitney: all pooled values are tied");
        return Err(InferenceError::DegenerateVariance(
            "all pooled values are tied",
        ));
    }

    let deviation = u2 - n1n2 / 2.0;
    let numerator = if options.continuity_correction {
        continuity_corrected(deviation)
    } else {
        deviation
    };
    let z = numerator / variance.sqrt();
    let p_value = normal_two_tailed_p(z);
    let rank_biserial_r = (u1 - u2) / n1n2;

    for (i, g) in groups.iter_mut().enumerate() {
        g.mean_rank = Some(ranking.mean_rank(i));
    }

    debug!(u, z, p_value, rank_biserial_r, "mann-whitney u test");
    Ok(MannWhitneyResult {
        u,
        u1,
        u2,
        z,
        p_value,
        rank_biserial_r,
        effect_size_label: EffectSizeLabel::for_correlation(rank_biserial_r),
        groups,
        tie_term: ranking.tie_term,
        continuity_corrected: options.continuity_correction,
        significant: p_value < options.alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const G1: [f64; 8] = [85.0, 72.0, 91.0, 68.0, 77.0, 95.0, 83.0, 89.0];
    const G2: [f64; 8] = [65.0, 78.0, 71.0, 62.0, 73.0, 69.0, 75.0, 67.0];

    #[test]
    fn reference_no_ties() {
        // R: wilcox.test(G1, G2, exact = FALSE, correct = TRUE)
        let r = mann_whitney_u_test(&G1, &G2, &TestOptions::default()).unwrap();
        assert_eq!((r.u1, r.u2, r.u), (55.0, 9.0, 9.0));
        assert!((r.z + 2.362_972_642).abs() < 1e-8);
        assert!((r.p_value - 0.018_129_008).abs() < 1e-8);
        assert!((r.rank_biserial_r - 0.718_75).abs() < 1e-12);
        assert_eq!(r.effect_size_label, EffectSizeLabel::Large);
        assert_eq!(r.groups[0].mean_rank, Some(11.375));
        assert_eq!(r.groups[1].mean_rank, Some(5.625));
        assert_eq!(r.groups[0].median, 84.0);
        assert!(r.significant);
    }

    #[test]
    fn without_continuity_correction() {
        let opts = TestOptions::default().with_continuity_correction(false);
        let r = mann_whitney_u_test(&G1, &G2, &opts).unwrap();
        assert!((r.z + 2.415_483_145).abs() < 1e-8);
        assert!((r.p_value - 0.015_714_350).abs() < 1e-8);
        assert!(!r.continuity_corrected);
    }

    #[test]
    fn tie_adjusted_variance() {
        let a = [3.0, 4.0, 4.0, 5.0, 6.0, 6.0, 7.0];
        let b = [1.0, 2.0, 4.0, 4.0, 5.0, 3.0];
        let r = mann_whitney_u_test(&a, &b, &TestOptions::default()).unwrap();
        assert_eq!((r.u1, r.u2), (34.0, 8.0));
        assert_eq!(r.tie_term, 78.0);
        assert!((r.z + 1.818_482_419).abs() < 1e-8);
        assert!((r.p_value - 0.068_990_431).abs() < 1e-8);
    }

    #[test]
    fn all_tied_is_degenerate() {
        assert!(matches!(
            mann_whitney_u_test(&[2.0, 2.0], &[2.0, 2.0, 2.0], &TestOptions::default()),
            Err(InferenceError::DegenerateVariance(_))
        ));
    }

    #[test]
    fn identical_distributions_give_zero_z() {
        let r =
            mann_whitney_u_test(&[1.0, 4.0], &[2.0, 3.0], &TestOptions::default()).unwrap();
        assert_eq!(r.u1, r.u2);
        assert_eq!(r.z, 0.0);
        assert_eq!(r.p_value, 1.0);
    }
}
