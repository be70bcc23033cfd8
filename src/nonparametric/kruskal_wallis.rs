//! Kruskal–Wallis H test with Dunn's post-hoc comparisons.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TestOptions;
use crate::descriptive::summarize_groups;
use crate::distribution::{chi_square_sf, normal_two_tailed_p};
use crate::error::{InferenceError, InferenceResult};
use crate::posthoc::{bonferroni_correction, pairwise_indices};
use crate::rank::{rank_groups, GroupRanking};
use crate::result::{EffectSizeLabel, GroupStatistic, PostHocComparison};
use crate::validation::{require_group_count, validate_options};

/// Result of a Kruskal–Wallis H test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KruskalWallisResult {
    /// Tie-corrected H.
    pub h_statistic: f64,
    /// k − 1.
    pub df: usize,
    pub p_value: f64,
    /// (H − k + 1) / (N − k), floored at 0.
    pub eta_squared_h: f64,
    pub effect_size_label: EffectSizeLabel,
    pub groups: Vec<GroupStatistic>,
    /// Dunn's z comparisons; empty unless significant with k ≥ 3.
    pub post_hoc: Vec<PostHocComparison>,
    /// 1 − T / (N³ − N).
    pub tie_correction: f64,
    pub significant: bool,
}

/// Kruskal–Wallis H test: H₀ all groups come from the same distribution.
///
/// # Algorithm
///
/// 1. Rank all observations jointly (average ranks for ties)
/// 2. H = 12 / (N(N+1)) Σ Rᵢ²/nᵢ − 3(N+1), divided by 1 − T/(N³ − N)
/// 3. H ~ χ²(k − 1) under H₀
/// 4. When significant and k ≥ 3, Dunn's test for every pair:
///    z = (R̄ᵢ − R̄ⱼ) / √((N(N+1)/12 − T/(12(N−1))) (1/nᵢ + 1/nⱼ)),
///    Bonferroni-adjusted
///
/// # References
///
/// - Kruskal & Wallis (1952). "Use of ranks in one-criterion variance
///   analysis". *JASA* 47(260), 583–621.
/// - Dunn (1964). "Multiple comparisons using rank sums".
///   *Technometrics* 6(3), 241–252.
///
/// # Errors
///
/// - [`InsufficientData`](InferenceError::InsufficientData) for k < 2 or any group with n < 2
/// - [`NonFiniteValue`](InferenceError::NonFiniteValue) for NaN/±∞
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if every
///   pooled value is tied
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if a group's
///   variance exceeds `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{kruskal_wallis_test, TestOptions};
///
/// let g1 = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let g2 = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let g3 = [11.0, 12.0, 13.0, 14.0, 15.0];
/// let r = kruskal_wallis_test(&[&g1, &g2, &g3], &TestOptions::default()).unwrap();
/// assert_eq!(r.df, 2);
/// assert!(r.p_value < 0.01);
/// assert_eq!(r.post_hoc.len(), 3);
/// ```
pub fn kruskal_wallis_test(
    groups: &[&[f64]],
    options: &TestOptions,
) -> InferenceResult<KruskalWallisResult> {
    require_group_count(groups.len(), 2)?;
    validate_options(options, groups.len())?;
    let mut stats = summarize_groups(groups, options)?;

    let ranking = rank_groups(groups);
    let tie_correction = ranking.tie_correction();
    if tie_correction <= 0.0 {
        warn!("kruskal-wallis: all pooled values are tied");
        return Err(InferenceError::DegenerateVariance(
            "all pooled values are tied",
        ));
    }

    let k = groups.len();
    let n = ranking.n_total as f64;
    let sum_r2_over_n: f64 = ranking
        .rank_sums
        .iter()
        .zip(groups)
        .map(|(r, g)| r * r / g.len() as f64)
        .sum();
    let h_raw = 12.0 / (n * (n + 1.0)) * sum_r2_over_n - 3.0 * (n + 1.0);
    let h_statistic = (h_raw / tie_correction).max(0.0);
    let df = k - 1;
    let p_value = chi_square_sf(h_statistic, df as f64);
    let eta_squared_h = ((h_statistic - k as f64 + 1.0) / (n - k as f64)).max(0.0);
    let significant = p_value < options.alpha;

    for (i, g) in stats.iter_mut().enumerate() {
        g.mean_rank = Some(ranking.mean_rank(i));
    }

    let post_hoc = if significant && k >= 3 {
        dunn(&stats, &ranking, options.alpha)
    } else {
        Vec::new()
    };

    debug!(
        h_statistic,
        df,
        p_value,
        eta_squared_h,
        comparisons = post_hoc.len(),
        "kruskal-wallis test"
    );

    Ok(KruskalWallisResult {
        h_statistic,
        df,
        p_value,
        eta_squared_h,
        effect_size_label: EffectSizeLabel::for_eta_squared(eta_squared_h),
        groups: stats,
        post_hoc,
        tie_correction,
        significant,
    })
}

fn dunn(groups: &[GroupStatistic], ranking: &GroupRanking, alpha: f64) -> Vec<PostHocComparison> {
    let n = ranking.n_total as f64;
    let base_variance = n * (n + 1.0) / 12.0 - ranking.tie_term / (12.0 * (n - 1.0));

    let pairs = pairwise_indices(groups.len());
    let raw: Vec<(f64, f64)> = pairs
        .iter()
        .map(|&(i, j)| {
            let se = (base_variance * (1.0 / groups[i].n as f64 + 1.0 / groups[j].n as f64))
                .sqrt();
            let z = (ranking.mean_rank(i) - ranking.mean_rank(j)) / se;
            (z, normal_two_tailed_p(z))
        })
        .collect();
    let adjusted = bonferroni_correction(&raw.iter().map(|r| r.1).collect::<Vec<_>>());

    pairs
        .iter()
        .zip(raw)
        .zip(adjusted)
        .map(|((&(i, j), (z, raw_p)), p)| PostHocComparison {
            group1: groups[i].name.clone(),
            group2: groups[j].name.clone(),
            statistic: z,
            mean_difference: None,
            raw_p_value: raw_p,
            p_value: p,
            significant: p < alpha,
        })
        .collect()
}
