//! One-way ANOVA with Bonferroni-corrected pairwise comparisons.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use u_numflow::stats;

use crate::config::TestOptions;
use crate::descriptive::summarize_groups;
use crate::distribution::{f_sf, t_two_tailed_p};
use crate::error::{InferenceError, InferenceResult};
use crate::posthoc::{bonferroni_correction, pairwise_indices};
use crate::result::{EffectSizeLabel, GroupStatistic, PostHocComparison};
use crate::validation::{
    require_finite_stats, require_group_count, required_stat, validate_options,
};

/// Result of a one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnovaResult {
    pub f_statistic: f64,
    /// k − 1.
    pub df_between: usize,
    /// N − k.
    pub df_within: usize,
    pub p_value: f64,
    pub ss_between: f64,
    pub ss_within: f64,
    pub ss_total: f64,
    pub ms_between: f64,
    pub ms_within: f64,
    pub grand_mean: f64,
    /// SS_between / SS_total.
    pub eta_squared: f64,
    pub effect_size_label: EffectSizeLabel,
    pub groups: Vec<GroupStatistic>,
    /// Pairwise t comparisons; empty unless significant with k ≥ 3.
    pub post_hoc: Vec<PostHocComparison>,
    pub significant: bool,
}

/// Sums of squares for a one-way layout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OneWayTable {
    pub grand_mean: f64,
    pub ss_between: f64,
    pub ss_within: f64,
    pub df_between: usize,
    pub df_within: usize,
}

impl OneWayTable {
    pub fn ms_between(&self) -> f64 {
        self.ss_between / self.df_between as f64
    }

    pub fn ms_within(&self) -> f64 {
        self.ss_within / self.df_within as f64
    }
}

/// Partitions the total sum of squares of already-validated groups.
pub(crate) fn one_way_table(groups: &[&[f64]]) -> InferenceResult<OneWayTable> {
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n_total = pooled.len();
    let grand_mean = required_stat(stats::mean(&pooled), "pooled sample", n_total)?;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let m = required_stat(stats::mean(g), "group", g.len())?;
        ss_between += g.len() as f64 * (m - grand_mean).powi(2);
        ss_within += g.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }
    require_finite_stats(
        "sum of squares exceeds floating-point range",
        &[grand_mean, ss_between, ss_within],
    )?;

    Ok(OneWayTable {
        grand_mean,
        ss_between,
        ss_within,
        df_between: groups.len() - 1,
        df_within: n_total - groups.len(),
    })
}

/// One-way ANOVA: H₀ all group means are equal.
///
/// # Algorithm
///
/// F = MS_between / MS_within with df (k − 1, N − k); η² = SS_between / SS_total.
/// When the omnibus test is significant and k ≥ 3, every pair (i, j) is
/// compared with t = (x̄ᵢ − x̄ⱼ) / √(MS_within (1/nᵢ + 1/nⱼ)) on N − k df,
/// and p-values are Bonferroni-adjusted over the C(k, 2) comparisons.
///
/// # Errors
///
/// - [`InsufficientData`](InferenceError::InsufficientData) for k < 2 or any group with n < 2
/// - [`NonFiniteValue`](InferenceError::NonFiniteValue) for NaN/±∞
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if every
///   group is constant (MS_within = 0)
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if a sum of
///   squares or F exceeds `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{one_way_anova, TestOptions};
///
/// let a = [4.2, 4.8, 5.1, 4.5, 4.9, 5.3];
/// let b = [5.9, 6.3, 5.7, 6.8, 6.1, 6.4];
/// let c = [4.9, 5.2, 5.6, 5.0, 5.4, 5.5];
/// let r = one_way_anova(&[&a, &b, &c], &TestOptions::default()).unwrap();
/// assert_eq!((r.df_between, r.df_within), (2, 15));
/// assert!(r.significant);
/// assert_eq!(r.post_hoc.len(), 3);
/// ```
pub fn one_way_anova(groups: &[&[f64]], options: &TestOptions) -> InferenceResult<AnovaResult> {
    require_group_count(groups.len(), 2)?;
    validate_options(options, groups.len())?;
    let group_stats = summarize_groups(groups, options)?;

    let table = one_way_table(groups)?;
    let ms_within = table.ms_within();
    if ms_within == 0.0 {
        warn!("anova: all groups have zero variance");
        return Err(InferenceError::DegenerateVariance(
            "within-group variance is zero",
        ));
    }
    let ms_between = table.ms_between();
    let f_statistic = ms_between / ms_within;
    let df_between = table.df_between;
    let df_within = table.df_within;
    let p_value = f_sf(f_statistic, df_between as f64, df_within as f64);
    let ss_total = table.ss_between + table.ss_within;
    let eta_squared = table.ss_between / ss_total;
    require_finite_stats(
        "F statistic exceeds floating-point range",
        &[f_statistic, p_value, eta_squared],
    )?;
    let significant = p_value < options.alpha;

    let post_hoc = if significant && groups.len() >= 3 {
        pairwise_t(&group_stats, ms_within, df_within as f64, options.alpha)
    } else {
        Vec::new()
    };

    debug!(
        f_statistic,
        df_between,
        df_within,
        p_value,
        eta_squared,
        comparisons = post_hoc.len(),
        "one-way anova"
    );

    Ok(AnovaResult {
        f_statistic,
        df_between,
        df_within,
        p_value,
        ss_between: table.ss_between,
        ss_within: table.ss_within,
        ss_total,
        ms_between,
        ms_within,
        grand_mean: table.grand_mean,
        eta_squared,
        effect_size_label: EffectSizeLabel::for_eta_squared(eta_squared),
        groups: group_stats,
        post_hoc,
        significant,
    })
}

fn pairwise_t(
    groups: &[GroupStatistic],
    ms_within: f64,
    df_within: f64,
    alpha: f64,
) -> Vec<PostHocComparison> {
    let pairs = pairwise_indices(groups.len());
    let raw: Vec<(f64, f64, f64)> = pairs
        .iter()
        .map(|&(i, j)| {
            let (gi, gj) = (&groups[i], &groups[j]);
            let diff = gi.mean - gj.mean;
            let se = (ms_within * (1.0 / gi.n as f64 + 1.0 / gj.n as f64)).sqrt();
            let t = diff / se;
            (diff, t, t_two_tailed_p(t, df_within))
        })
        .collect();
    let adjusted = bonferroni_correction(&raw.iter().map(|r| r.2).collect::<Vec<_>>());

    pairs
        .iter()
        .zip(raw)
        .zip(adjusted)
        .map(|((&(i, j), (diff, t, raw_p)), p)| PostHocComparison {
            group1: groups[i].name.clone(),
            group2: groups[j].name.clone(),
            statistic: t,
            mean_difference: Some(diff),
            raw_p_value: raw_p,
            p_value: p,
            significant: p < alpha,
        })
        .collect()
}
