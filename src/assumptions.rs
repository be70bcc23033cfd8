//! Assumption diagnostics for the parametric tests.
//!
//! Advisory only: nothing here blocks or alters a test result.
//!
//! - [`shapiro_wilk_test`]: Shapiro–Wilk W normality test (Royston AS R94)
//! - [`levene_test`]: Levene's test for equal variances, Brown–Forsythe
//!   variant (ANOVA on absolute deviations from group medians)
//! - [`check_assumptions`]: runs both for a target test and produces
//!   localized recommendations
//!
//! # References
//!
//! - Shapiro & Wilk (1965). "An analysis of variance test for normality".
//!   *Biometrika* 52(3–4), 591–611.
//! - Royston (1995). "Remark AS R94: A remark on Algorithm AS 181".
//!   *Applied Statistics* 44(4), 547–551.
//! - Brown & Forsythe (1974). "Robust tests for the equality of
//!   variances". *JASA* 69(346), 364–367.

use serde::{Deserialize, Serialize};
use tracing::debug;
use u_numflow::{special, stats};

use crate::config::Locale;
use crate::distribution::f_sf;
use crate::error::InferenceResult;
use crate::parametric::one_way_table;
use crate::validation::{require_group_count, required_stat, validate_sample};

/// Significance level used for every diagnostic decision.
pub const DIAGNOSTIC_ALPHA: f64 = 0.05;

/// Largest sample accepted by the Shapiro–Wilk approximation.
pub const SHAPIRO_WILK_MAX_N: usize = 5000;

/// Within-group sum of squares below this fraction of the total is
/// rounding noise in Levene's test.
const SS_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Test whose assumptions are being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssumptionTarget {
    TTest,
    Anova,
    OneSampleT,
    MannWhitney,
    Wilcoxon,
    /// Pearson correlation; a violation points to Spearman.
    Correlation,
}

impl AssumptionTarget {
    fn checks_variance(self) -> bool {
        matches!(self, Self::TTest | Self::Anova)
    }
}

/// Result of the Shapiro–Wilk normality test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapiroWilkResult {
    /// The W statistic (0 < W ≤ 1). Values close to 1 suggest normality.
    pub w: f64,
    /// Small values reject the null hypothesis of normality.
    pub p_value: f64,
}

/// Shapiro–Wilk normality test: H₀ the data are normally distributed.
///
/// # Algorithm
///
/// Royston (1992, 1995), AS R94:
/// 1. Coefficients from Blom's normal order statistics
///    mᵢ = Φ⁻¹((i − .375)/(n + .25)) with polynomial corrections of the
///    outermost one or two weights
/// 2. W = (Σ aᵢ (x₍ₙ₊₁₋ᵢ₎ − x₍ᵢ₎))² / Σ (xᵢ − x̄)²
/// 3. ln(1 − W) mapped to a z-score (gamma transform for n ≤ 11,
///    log-normal for larger n); n = 3 uses the exact distribution
///
/// # Returns
///
/// `None` if n < 3, n > 5000, any value is non-finite, or all values are
/// identical.
///
/// # Examples
///
/// ```
/// use u_inference::assumptions::shapiro_wilk_test;
///
/// let data = [-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5];
/// let r = shapiro_wilk_test(&data).unwrap();
/// assert!(r.w > 0.9);
/// assert!(r.p_value > 0.05);
/// ```
pub fn shapiro_wilk_test(data: &[f64]) -> Option<ShapiroWilkResult> {
    let n = data.len();
    if !(3..=SHAPIRO_WILK_MAX_N).contains(&n) || data.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    if x[n - 1] - x[0] < 1e-300 {
        return None;
    }

    if n == 3 {
        return shapiro_wilk_n3(&x);
    }

    let a = sw_coefficients(n)?;
    let w = sw_statistic(&x, &a)?;
    if w > 1.0 + 1e-10 {
        return None;
    }
    let w = w.min(1.0);
    let p_value = sw_p_value(w, n).clamp(0.0, 1.0);

    debug!(n, w, p_value, "shapiro-wilk test");
    Some(ShapiroWilkResult { w, p_value })
}

// Exact for n = 3: a = (−√½, 0, √½), p = 1 − (6/π) acos(√W).
fn shapiro_wilk_n3(x: &[f64]) -> Option<ShapiroWilkResult> {
    let mean = (x[0] + x[1] + x[2]) / 3.0;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if ss < 1e-300 {
        return None;
    }
    let numerator = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
    let w = (numerator * numerator / ss).clamp(0.75, 1.0);
    let p_value = (1.0 - 6.0 / std::f64::consts::PI * w.sqrt().acos()).clamp(0.0, 1.0);
    Some(ShapiroWilkResult { w, p_value })
}

// AS R94 polynomial coefficients.
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// c₀ + c₁x + c₂x² + … by Horner's rule.
fn polynomial(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Weights for the lower half of the order statistics, largest first.
fn sw_coefficients(n: usize) -> Option<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;
    let m: Vec<f64> = (0..half)
        .map(|i| -special::inverse_normal_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let a1 = polynomial(&SW_C1, rsn) + m[0] / ssumm2;
    let corrected = if n <= 5 { 1 } else { 2 };
    let mut a = vec![0.0; half];
    a[0] = a1;
    let (fac_sq, one_minus) = if corrected == 1 {
        (summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    } else {
        let a2 = m[1] / ssumm2 + polynomial(&SW_C2, rsn);
        a[1] = a2;
        (
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return None;
    }
    let fac = (fac_sq / one_minus).sqrt();
    for (ai, mi) in a.iter_mut().zip(&m).skip(corrected) {
        *ai = mi / fac;
    }
    Some(a)
}

fn sw_statistic(x: &[f64], a: &[f64]) -> Option<f64> {
    let n = x.len();
    let sa: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    if ss < 1e-300 {
        return None;
    }
    Some(sa * sa / ss)
}

fn sw_p_value(w: f64, n: usize) -> f64 {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();
    let nf = n as f64;

    let z = if n <= 11 {
        let gamma = polynomial(&SW_G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        (y2 - polynomial(&SW_C3, nf)) / polynomial(&SW_C4, nf).exp()
    } else {
        let ln_n = nf.ln();
        (y - polynomial(&SW_C5, ln_n)) / polynomial(&SW_C6, ln_n).exp()
    };
    special::standard_normal_sf(z)
}

/// Result of Levene's (Brown–Forsythe) test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeveneResult {
    pub f_statistic: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub p_value: f64,
    /// p > 0.05.
    pub equal_variances: bool,
}

/// Levene's test for homogeneity of variance, median-centred.
///
/// Runs a one-way ANOVA on zᵢⱼ = |xᵢⱼ − median(xᵢ)|. When every group has
/// zero spread in z the test is uninformative and reports F = 0, p = 1;
/// zero within-group spread with unequal group levels reports F = ∞, p = 0.
/// Within-group spread under 10⁻¹² of the total sum of squares counts as
/// zero, so shifting a group by a constant cannot turn rounding error into
/// a huge finite F.
///
/// # Errors
///
/// - [`InsufficientData`](crate::InferenceError::InsufficientData) for
///   fewer than 2 groups or any group with n < 2
/// - [`NonFiniteValue`](crate::InferenceError::NonFiniteValue) for NaN/±∞
///
/// # Examples
///
/// ```
/// use u_inference::assumptions::levene_test;
///
/// let tight = [4.5, 4.8, 5.0, 5.2, 5.5];
/// let wide = [0.0, 2.0, 5.0, 8.0, 10.0];
/// let r = levene_test(&[&tight, &wide]).unwrap();
/// assert!(!r.equal_variances);
/// ```
pub fn levene_test(groups: &[&[f64]]) -> InferenceResult<LeveneResult> {
    require_group_count(groups.len(), 2)?;
    let mut deviations = Vec::with_capacity(groups.len());
    for (i, g) in groups.iter().enumerate() {
        validate_sample(g, &format!("Group {}", i + 1))?;
        let median = required_stat(stats::median(g), "group", g.len())?;
        deviations.push(g.iter().map(|v| (v - median).abs()).collect::<Vec<f64>>());
    }
    let refs: Vec<&[f64]> = deviations.iter().map(Vec::as_slice).collect();
    let table = one_way_table(&refs)?;

    let ss_total = table.ss_between + table.ss_within;
    let (f_statistic, p_value) = if table.ss_within > SS_RELATIVE_TOLERANCE * ss_total {
        let f = table.ms_between() / table.ms_within();
        (f, f_sf(f, table.df_between as f64, table.df_within as f64))
    } else if table.ss_between > 0.0 {
        (f64::INFINITY, 0.0)
    } else {
        (0.0, 1.0)
    };

    debug!(
        f_statistic,
        df_between = table.df_between,
        df_within = table.df_within,
        p_value,
        "levene test"
    );
    Ok(LeveneResult {
        f_statistic,
        df_between: table.df_between,
        df_within: table.df_within,
        p_value,
        equal_variances: p_value > DIAGNOSTIC_ALPHA,
    })
}

/// Normality verdict for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalityCheck {
    pub group: String,
    pub n: usize,
    pub w: f64,
    pub p_value: f64,
    /// p > 0.05.
    pub is_normal: bool,
}

/// Outcome of [`check_assumptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResult {
    /// One entry per group on which Shapiro–Wilk could run.
    pub normality: Vec<NormalityCheck>,
    /// Present for t-test and ANOVA targets with at least two usable groups.
    pub levene: Option<LeveneResult>,
    pub recommendations: Vec<String>,
}

impl DiagnosticsResult {
    /// True when no check found a violation.
    pub fn all_met(&self) -> bool {
        self.normality.iter().all(|c| c.is_normal)
            && self.levene.map_or(true, |l| l.equal_variances)
    }
}

/// Runs the normality and variance checks relevant to `target`.
///
/// Never fails: groups too small or malformed for a check are skipped.
/// A single group is labelled "Data", several are "Group 1", "Group 2", ….
///
/// # Examples
///
/// ```
/// use u_inference::assumptions::{check_assumptions, AssumptionTarget};
/// use u_inference::Locale;
///
/// let a = [4.5, 4.8, 5.0, 5.2, 5.5];
/// let b = [0.0, 2.0, 5.0, 8.0, 10.0];
/// let d = check_assumptions(AssumptionTarget::TTest, &[&a, &b], Locale::En);
/// assert_eq!(d.normality.len(), 2);
/// assert!(d.recommendations[0].starts_with("Equal variance violated"));
/// ```
pub fn check_assumptions(
    target: AssumptionTarget,
    groups: &[&[f64]],
    locale: Locale,
) -> DiagnosticsResult {
    let normality: Vec<NormalityCheck> = groups
        .iter()
        .enumerate()
        .filter_map(|(i, g)| {
            let sw = shapiro_wilk_test(g)?;
            let group = if groups.len() == 1 {
                "Data".to_string()
            } else {
                format!("Group {}", i + 1)
            };
            Some(NormalityCheck {
                group,
                n: g.len(),
                w: sw.w,
                p_value: sw.p_value,
                is_normal: sw.p_value > DIAGNOSTIC_ALPHA,
            })
        })
        .collect();

    let levene = if target.checks_variance() && groups.len() >= 2 {
        levene_test(groups).ok()
    } else {
        None
    };

    let mut recommendations = Vec::new();
    if normality.iter().any(|c| !c.is_normal) {
        if let Some(text) = normality_advice(target, locale) {
            recommendations.push(text.to_string());
        }
    }
    if levene.is_some_and(|l| !l.equal_variances) {
        if let Some(text) = variance_advice(target, locale) {
            recommendations.push(text.to_string());
        }
    }
    if recommendations.is_empty() {
        recommendations.push(
            match locale {
                Locale::En => "All assumptions met. Current test is appropriate.",
                Locale::Ko => "모든 가정이 충족되었습니다. 현재 검정을 사용해도 됩니다.",
            }
            .to_string(),
        );
    }

    debug!(
        ?target,
        groups = groups.len(),
        recommendations = recommendations.len(),
        "assumption diagnostics"
    );
    DiagnosticsResult {
        normality,
        levene,
        recommendations,
    }
}

fn normality_advice(target: AssumptionTarget, locale: Locale) -> Option<&'static str> {
    use AssumptionTarget::*;
    let text = match (target, locale) {
        (TTest, Locale::En) => "Normality violated: Consider Mann-Whitney U test.",
        (TTest, Locale::Ko) => "정규성 가정 위반: Mann-Whitney U 검정 사용을 권장합니다.",
        (Anova, Locale::En) => "Normality violated: Consider Kruskal-Wallis test.",
        (Anova, Locale::Ko) => "정규성 가정 위반: Kruskal-Wallis 검정 사용을 권장합니다.",
        (OneSampleT, Locale::En) => "Normality violated: Consider Wilcoxon signed-rank test.",
        (OneSampleT, Locale::Ko) => "정규성 가정 위반: Wilcoxon 부호순위 검정 사용을 권장합니다.",
        (Correlation, Locale::En) => "Normality violated: Consider Spearman rank correlation.",
        (Correlation, Locale::Ko) => "정규성 가정 위반: Spearman 순위상관 사용을 권장합니다.",
        (MannWhitney | Wilcoxon, _) => return None,
    };
    Some(text)
}

fn variance_advice(target: AssumptionTarget, locale: Locale) -> Option<&'static str> {
    let text = match (target, locale) {
        (AssumptionTarget::TTest, Locale::En) => {
            "Equal variance violated: Welch's t-test is automatically applied."
        }
        (AssumptionTarget::TTest, Locale::Ko) => "등분산 가정 위반: Welch's t-검정이 자동 적용됩니다.",
        (AssumptionTarget::Anova, Locale::En) => {
            "Equal variance violated: Consider Welch ANOVA or non-parametric test."
        }
        (AssumptionTarget::Anova, Locale::Ko) => "등분산 가정 위반: Welch ANOVA 또는 비모수 검정을 고려하세요.",
        _ => return None,
    };
    Some(text)
}
