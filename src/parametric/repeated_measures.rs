//! One-way repeated-measures ANOVA with Mauchly's sphericity test and the
//! Greenhouse–Geisser correction.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use u_numflow::matrix::Matrix;
use u_numflow::stats;

use crate::assumptions::DIAGNOSTIC_ALPHA;
use crate::config::TestOptions;
use crate::descriptive::summarize_groups;
use crate::distribution::{chi_square_sf, f_sf, t_two_tailed_p};
use crate::error::{InferenceError, InferenceResult};
use crate::posthoc::{bonferroni_correction, pairwise_indices};
use crate::result::{EffectSizeLabel, GroupStatistic, PostHocComparison};
use crate::validation::{
    require_finite_stats, require_group_count, require_min_len, validate_options,
};

/// Fewest subjects a repeated-measures ANOVA accepts.
pub const MIN_REPEATED_SUBJECTS: usize = 3;

/// Error sum of squares below this fraction of the total is rounding noise.
const SS_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Mauchly's test of sphericity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SphericityResult {
    /// Mauchly's W in [0, 1]; 1 when k = 2.
    pub mauchly_w: f64,
    pub chi_square: f64,
    /// (k − 1)k / 2 − 1.
    pub df: usize,
    pub p_value: f64,
    /// Greenhouse–Geisser ε in [1/(k − 1), 1].
    pub epsilon: f64,
    /// p below the diagnostic alpha (.05).
    pub violated: bool,
}

/// Degrees of freedom and p-value after scaling both df by ε.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenhouseGeisser {
    pub epsilon: f64,
    pub df_conditions: f64,
    pub df_error: f64,
    pub p_value: f64,
}

/// Result of a one-way repeated-measures ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedMeasuresResult {
    pub f_statistic: f64,
    /// k − 1.
    pub df_conditions: usize,
    /// (k − 1)(n − 1).
    pub df_error: usize,
    /// Uncorrected p-value.
    pub p_value: f64,
    pub ss_conditions: f64,
    pub ss_subjects: f64,
    pub ss_error: f64,
    pub ss_total: f64,
    pub ms_conditions: f64,
    pub ms_error: f64,
    /// SS_conditions / (SS_conditions + SS_error).
    pub partial_eta_squared: f64,
    pub effect_size_label: EffectSizeLabel,
    pub conditions: Vec<GroupStatistic>,
    pub sphericity: SphericityResult,
    /// Present when sphericity is violated; significance then follows its p.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<GreenhouseGeisser>,
    /// Bonferroni-adjusted paired t comparisons, every pair.
    pub post_hoc: Vec<PostHocComparison>,
    pub n_subjects: usize,
    pub significant: bool,
}

impl RepeatedMeasuresResult {
    /// p-value the significance decision is based on.
    pub fn reported_p_value(&self) -> f64 {
        self.correction.map_or(self.p_value, |c| c.p_value)
    }
}

/// One-way repeated-measures ANOVA: H₀ all condition means are equal.
///
/// `conditions[j][i]` is subject i measured under condition j; every
/// condition lists the subjects in the same order.
///
/// # Algorithm
///
/// 1. SS_total = SS_conditions + SS_subjects + SS_error, with
///    SS_error = Σ(xᵢⱼ − x̄ⱼ − x̄ᵢ + x̄)²
/// 2. F = MS_conditions / MS_error on (k − 1, (k − 1)(n − 1)) df
/// 3. Mauchly's W = det(M) / (tr(M) / p)ᵖ, where M is the covariance of
///    the p = k − 1 orthonormal Helmert contrasts; χ² = −(n − 1 − f) ln W
///    with f = (2p² + p + 2) / (6p(n − 1))
/// 4. Greenhouse–Geisser ε = tr(M)² / (p · tr(M²)); when Mauchly's p < .05
///    both df are scaled by ε and p is recomputed
/// 5. Every pair of conditions is compared with a paired t test on n − 1
///    df, Bonferroni-adjusted
///
/// # References
///
/// - Mauchly (1940). "Significance test for sphericity of a normal
///   n-variate distribution". *Annals of Mathematical Statistics* 11(2),
///   204–209.
/// - Greenhouse & Geisser (1959). "On methods in the analysis of profile
///   data". *Psychometrika* 24(2), 95–112.
///
/// # Errors
///
/// - [`InsufficientData`](InferenceError::InsufficientData) for k < 2 or
///   fewer than 3 subjects
/// - [`SampleSizeMismatch`](InferenceError::SampleSizeMismatch) if the
///   conditions list different numbers of subjects
/// - [`NonFiniteValue`](InferenceError::NonFiniteValue) for NaN/±∞
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if every
///   subject changes by the same amounts (SS_error = 0)
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if a sum of
///   squares exceeds `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{repeated_measures_anova, TestOptions};
///
/// let week1 = [45.0, 42.0, 36.0, 39.0, 51.0, 44.0];
/// let week2 = [50.0, 42.0, 41.0, 35.0, 55.0, 49.0];
/// let week3 = [55.0, 45.0, 43.0, 40.0, 59.0, 56.0];
/// let r = repeated_measures_anova(&[&week1, &week2, &week3], &TestOptions::default()).unwrap();
/// assert_eq!((r.df_conditions, r.df_error), (2, 10));
/// assert!(!r.sphericity.violated);
/// assert!(r.significant);
/// ```
pub fn repeated_measures_anova(
    conditions: &[&[f64]],
    options: &TestOptions,
) -> InferenceResult<RepeatedMeasuresResult> {
    require_group_count(conditions.len(), 2)?;
    validate_options(options, conditions.len())?;
    let first = conditions[0];
    if let Some(other) = conditions.iter().find(|c| c.len() != first.len()) {
        return Err(InferenceError::SampleSizeMismatch {
            left: first.len(),
            right: other.len(),
        });
    }
    require_min_len(first, MIN_REPEATED_SUBJECTS, "subjects")?;
    let summaries = summarize_groups(conditions, options)?;

    let k = conditions.len();
    let n = first.len();
    let (kf, nf) = (k as f64, n as f64);
    let grand_mean = summaries.iter().map(|c| c.mean).sum::<f64>() / kf;
    let subject_means: Vec<f64> = (0..n)
        .map(|i| conditions.iter().map(|c| c[i]).sum::<f64>() / kf)
        .collect();

    let ss_conditions = nf
        * summaries
            .iter()
            .map(|c| (c.mean - grand_mean).powi(2))
            .sum::<f64>();
    let ss_subjects = kf
        * subject_means
            .iter()
            .map(|m| (m - grand_mean).powi(2))
            .sum::<f64>();
    let mut ss_total = 0.0;
    let mut ss_error = 0.0;
    for (c, cs) in conditions.iter().zip(&summaries) {
        for (x, sm) in c.iter().zip(&subject_means) {
            ss_total += (x - grand_mean).powi(2);
            ss_error += (x - cs.mean - sm + grand_mean).powi(2);
        }
    }
    require_finite_stats(
        "sum of squares exceeds floating-point range",
        &[grand_mean, ss_conditions, ss_subjects, ss_total],
    )?;
    if ss_error <= SS_RELATIVE_TOLERANCE * ss_total {
        warn!("repeated-measures anova: residual variance is zero");
        return Err(InferenceError::DegenerateVariance(
            "every subject changes by the same amounts",
        ));
    }

    let df_conditions = k - 1;
    let df_error = (k - 1) * (n - 1);
    let ms_conditions = ss_conditions / df_conditions as f64;
    let ms_error = ss_error / df_error as f64;
    let f_statistic = ms_conditions / ms_error;
    let p_value = f_sf(f_statistic, df_conditions as f64, df_error as f64);
    let partial_eta_squared = ss_conditions / (ss_conditions + ss_error);

    let sphericity = mauchly(conditions)?;
    let correction = sphericity.violated.then(|| {
        let df1 = sphericity.epsilon * df_conditions as f64;
        let df2 = sphericity.epsilon * df_error as f64;
        GreenhouseGeisser {
            epsilon: sphericity.epsilon,
            df_conditions: df1,
            df_error: df2,
            p_value: f_sf(f_statistic, df1, df2),
        }
    });
    let decision_p = correction.map_or(p_value, |c| c.p_value);
    let significant = decision_p < options.alpha;
    let post_hoc = paired_comparisons(conditions, &summaries, options.alpha);

    debug!(
        f_statistic,
        df_conditions,
        df_error,
        p_value,
        partial_eta_squared,
        mauchly_w = sphericity.mauchly_w,
        epsilon = sphericity.epsilon,
        corrected = correction.is_some(),
        "repeated-measures anova"
    );

    Ok(RepeatedMeasuresResult {
        f_statistic,
        df_conditions,
        df_error,
        p_value,
        ss_conditions,
        ss_subjects,
        ss_error,
        ss_total,
        ms_conditions,
        ms_error,
        partial_eta_squared,
        effect_size_label: EffectSizeLabel::for_eta_squared(partial_eta_squared),
        conditions: summaries,
        sphericity,
        correction,
        post_hoc,
        n_subjects: n,
        significant,
    })
}

/// Orthonormal Helmert contrast j (1-based): ones on the first j
/// conditions, −j on condition j, scaled to unit length.
fn helmert_contrast(k: usize, j: usize) -> Vec<f64> {
    let norm = ((j * (j + 1)) as f64).sqrt();
    (0..k)
        .map(|c| match c {
            c if c < j => 1.0 / norm,
            c if c == j => -(j as f64) / norm,
            _ => 0.0,
        })
        .collect()
}

fn mauchly(conditions: &[&[f64]]) -> InferenceResult<SphericityResult> {
    let k = conditions.len();
    let n = conditions[0].len();
    let p = k - 1;
    if p < 2 {
        return Ok(SphericityResult {
            mauchly_w: 1.0,
            chi_square: 0.0,
            df: 0,
            p_value: 1.0,
            epsilon: 1.0,
            violated: false,
        });
    }

    let scores: Vec<Vec<f64>> = (1..k)
        .map(|j| {
            let h = helmert_contrast(k, j);
            (0..n)
                .map(|i| conditions.iter().zip(&h).map(|(c, w)| w * c[i]).sum())
                .collect()
        })
        .collect();
    let mut data = vec![0.0; p * p];
    for a in 0..p {
        for b in a..p {
            let cov = stats::covariance(&scores[a], &scores[b]).ok_or(
                InferenceError::NumericalOverflow("contrast covariance exceeds floating-point range"),
            )?;
            data[a * p + b] = cov;
            data[b * p + a] = cov;
        }
    }
    let trace: f64 = (0..p).map(|a| data[a * p + a]).sum();
    let trace_sq: f64 = data.iter().map(|v| v * v).sum();
    let det = Matrix::new(p, p, data)
        .and_then(|m| m.determinant())
        .map_err(|_| InferenceError::DegenerateVariance("contrast covariance is not square"))?;

    let pf = p as f64;
    let mauchly_w = (det / (trace / pf).powi(p as i32)).clamp(0.0, 1.0);
    let f = (2.0 * pf * pf + pf + 2.0) / (6.0 * pf * (n as f64 - 1.0));
    let chi_square = (-(n as f64 - 1.0 - f) * mauchly_w.max(1e-15).ln()).max(0.0);
    let df = p * (p + 1) / 2 - 1;
    let p_value = chi_square_sf(chi_square, df as f64);
    let epsilon = (trace * trace / (pf * trace_sq)).clamp(1.0 / pf, 1.0);
    require_finite_stats(
        "sphericity statistic exceeds floating-point range",
        &[mauchly_w, chi_square, epsilon],
    )?;

    Ok(SphericityResult {
        mauchly_w,
        chi_square,
        df,
        p_value,
        epsilon,
        violated: p_value < DIAGNOSTIC_ALPHA,
    })
}

fn paired_comparisons(
    conditions: &[&[f64]],
    summaries: &[GroupStatistic],
    alpha: f64,
) -> Vec<PostHocComparison> {
    let pairs = pairwise_indices(conditions.len());
    let raw: Vec<(f64, f64, f64)> = pairs
        .iter()
        .map(|&(i, j)| {
            let diffs: Vec<f64> = conditions[i]
                .iter()
                .zip(conditions[j])
                .map(|(a, b)| a - b)
                .collect();
            let n = diffs.len() as f64;
            let mean = diffs.iter().sum::<f64>() / n;
            let sd = stats::std_dev(&diffs).unwrap_or(0.0);
            let t = match (sd > 0.0, mean == 0.0) {
                (true, _) => mean / (sd / n.sqrt()),
                (false, true) => 0.0,
                (false, false) => f64::INFINITY.copysign(mean),
            };
            (mean, t, t_two_tailed_p(t, n - 1.0))
        })
        .collect();
    let adjusted = bonferroni_correction(&raw.iter().map(|r| r.2).collect::<Vec<_>>());

    pairs
        .iter()
        .zip(raw)
        .zip(adjusted)
        .map(|((&(i, j), (diff, t, raw_p)), p)| PostHocComparison {
            group1: summaries[i].name.clone(),
            group2: summaries[j].name.clone(),
            statistic: t,
            mean_difference: Some(diff),
            raw_p_value: raw_p,
            p_value: p,
            significant: p < alpha,
        })
        .collect()
}
