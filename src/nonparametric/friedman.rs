//! Friedman rank test for k related samples.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TestOptions;
use crate::descriptive::summarize_groups;
use crate::distribution::{chi_square_sf, normal_two_tailed_p};
use crate::error::{InferenceError, InferenceResult};
use crate::posthoc::{bonferroni_correction, pairwise_indices};
use crate::rank::rank;
use crate::result::{EffectSizeLabel, GroupStatistic, PostHocComparison};
use crate::validation::{require_group_count, require_min_len, validate_options};

/// Fewest subjects (blocks) the Friedman test accepts.
pub const MIN_FRIEDMAN_SUBJECTS: usize = 3;

/// Result of a Friedman test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriedmanResult {
    /// Tie-corrected χ²F.
    pub chi_square: f64,
    /// k − 1.
    pub df: usize,
    pub p_value: f64,
    /// Kendall's coefficient of concordance, χ²F / (n(k − 1)).
    pub kendalls_w: f64,
    pub effect_size_label: EffectSizeLabel,
    /// One entry per condition; `mean_rank` is the within-subject mean rank.
    pub conditions: Vec<GroupStatistic>,
    /// Bonferroni-adjusted z comparisons of mean ranks, every pair.
    pub post_hoc: Vec<PostHocComparison>,
    /// Number of subjects n.
    pub n_subjects: usize,
    pub significant: bool,
}

/// Friedman test: H₀ the k conditions have the same distribution within
/// subjects.
///
/// `conditions[j][i]` is subject i measured under condition j; every
/// condition lists the subjects in the same order.
///
/// # Algorithm
///
/// 1. Rank each subject's k values (average ranks for ties)
/// 2. Rⱼ = rank sum of condition j
/// 3. χ²F = 12 Σ(Rⱼ − n(k+1)/2)² / (nk(k+1) − ΣT / (k − 1)), where ΣT sums
///    t³ − t over the tie groups of every subject
/// 4. χ²F ~ χ²(k − 1) under H₀
/// 5. Pairwise z = (R̄ᵢ − R̄ⱼ) / √(k(k+1) / (6n)), Bonferroni-adjusted
///
/// # References
///
/// - Friedman (1937). "The use of ranks to avoid the assumption of
///   normality implicit in the analysis of variance". *JASA* 32(200),
///   675–701.
/// - Kendall & Babington Smith (1939). "The problem of m rankings".
///   *Annals of Mathematical Statistics* 10(3), 275–287.
///
/// # Errors
///
/// - [`InsufficientData`](InferenceError::InsufficientData) for k < 3 or
///   fewer than 3 subjects
/// - [`SampleSizeMismatch`](InferenceError::SampleSizeMismatch) if the
///   conditions list different numbers of subjects
/// - [`NonFiniteValue`](InferenceError::NonFiniteValue) for NaN/±∞
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if every
///   subject's values are tied
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if a
///   condition's variance exceeds `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{friedman_test, TestOptions};
///
/// let before = [1.0, 2.0, 3.0, 4.0];
/// let during = [2.0, 3.0, 4.0, 5.0];
/// let after = [3.0, 4.0, 5.0, 6.0];
/// let r = friedman_test(&[&before, &during, &after], &TestOptions::default()).unwrap();
/// assert_eq!(r.df, 2);
/// assert_eq!(r.kendalls_w, 1.0);
/// ```
pub fn friedman_test(
    conditions: &[&[f64]],
    options: &TestOptions,
) -> InferenceResult<FriedmanResult> {
    require_group_count(conditions.len(), 3)?;
    validate_options(options, conditions.len())?;
    let first = conditions[0];
    if let Some(other) = conditions.iter().find(|c| c.len() != first.len()) {
        return Err(InferenceError::SampleSizeMismatch {
            left: first.len(),
            right: other.len(),
        });
    }
    require_min_len(first, MIN_FRIEDMAN_SUBJECTS, "subjects")?;
    let mut stats = summarize_groups(conditions, options)?;

    let k = conditions.len();
    let n = first.len();
    let (kf, nf) = (k as f64, n as f64);

    let mut rank_sums = vec![0.0; k];
    let mut tie_term = 0.0;
    let mut row = Vec::with_capacity(k);
    for i in 0..n {
        row.clear();
        row.extend(conditions.iter().map(|c| c[i]));
        let ranking = rank(&row);
        tie_term += ranking.tie_term;
        for (sum, r) in rank_sums.iter_mut().zip(&ranking.ranks) {
            *sum += r;
        }
    }

    let denominator = nf * kf * (kf + 1.0) - tie_term / (kf - 1.0);
    if denominator <= 0.0 {
        warn!("friedman: every subject's values are tied");
        return Err(InferenceError::DegenerateVariance(
            "every subject's values are tied",
        ));
    }
    let expected = nf * (kf + 1.0) / 2.0;
    let spread: f64 = rank_sums.iter().map(|r| (r - expected).powi(2)).sum();
    let chi_square = 12.0 * spread / denominator;
    let df = k - 1;
    let p_value = chi_square_sf(chi_square, df as f64);
    let kendalls_w = (chi_square / (nf * (kf - 1.0))).clamp(0.0, 1.0);
    let significant = p_value < options.alpha;

    for (g, sum) in stats.iter_mut().zip(&rank_sums) {
        g.mean_rank = Some(sum / nf);
    }
    let post_hoc = mean_rank_comparisons(&stats, n, options.alpha);

    debug!(
        chi_square,
        df,
        p_value,
        kendalls_w,
        subjects = n,
        "friedman test"
    );

    Ok(FriedmanResult {
        chi_square,
        df,
        p_value,
        kendalls_w,
        effect_size_label: EffectSizeLabel::for_correlation(kendalls_w),
        conditions: stats,
        post_hoc,
        n_subjects: n,
        significant,
    })
}

fn mean_rank_comparisons(
    conditions: &[GroupStatistic],
    n: usize,
    alpha: f64,
) -> Vec<PostHocComparison> {
    let k = conditions.len() as f64;
    let se = (k * (k + 1.0) / (6.0 * n as f64)).sqrt();
    let mean_rank = |i: usize| conditions[i].mean_rank.unwrap_or(0.0);

    let pairs = pairwise_indices(conditions.len());
    let raw: Vec<(f64, f64)> = pairs
        .iter()
        .map(|&(i, j)| {
            let z = (mean_rank(i) - mean_rank(j)) / se;
            (z, normal_two_tailed_p(z))
        })
        .collect();
    let adjusted = bonferroni_correction(&raw.iter().map(|r| r.1).collect::<Vec<_>>());

    pairs
        .iter()
        .zip(raw)
        .zip(adjusted)
        .map(|((&(i, j), (z, raw_p)), p)| PostHocComparison {
            group1: conditions[i].name.clone(),
            group2: conditions[j].name.clone(),
            statistic: z,
            mean_difference: None,
            raw_p_value: raw_p,
            p_value: p,
            significant: p < alpha,
        })
        .collect()
}
