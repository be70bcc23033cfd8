//! APA-style reporting strings.
//!
//! Every test family goes through the same numeric rules:
//!
//! - test statistics (t, F, H, U, W, z, χ²) to 2 decimals
//! - integer df printed as integers, fractional (Welch) df to 2 decimals
//! - p to 3 decimals without the leading zero, `p < .001` below .001
//! - effect sizes to 2 decimals; quantities bounded by 1 (r, V, w, W,
//!   power) drop the leading zero, unbounded ones (d, η², OR) keep it
//! - Greenhouse–Geisser corrected df to 2 decimals, an unbounded ratio as `∞`
//! - α without the leading zero, at least 2 and up to 6 decimals with
//!   trailing zeros trimmed: `.05`, `.10`, `.001`
//!
//! # Examples
//!
//! ```
//! use u_inference::format::{format_p_value, strip_leading_zero};
//!
//! assert_eq!(format_p_value(0.0127), "p = .013");
//! assert_eq!(format_p_value(0.0004), "p < .001");
//! assert_eq!(strip_leading_zero(-0.7188, 2), "-.72");
//! ```

use crate::categorical::{
    ChiSquareGoodnessResult, ChiSquareIndependenceResult, FisherExactResult, McNemarMethod,
    McNemarResult,
};
use crate::correlation::{CorrelationMethod, CorrelationResult};
use crate::nonparametric::{
    FriedmanResult, KruskalWallisResult, MannWhitneyResult, WilcoxonResult,
};
use crate::parametric::{AnovaResult, RepeatedMeasuresResult, TTestResult};
use crate::result::ConfidenceInterval;
use crate::power::{PowerResult, PowerTestType};
use crate::result::TestResult;

/// Below this a p-value is reported as `p < .001`.
pub const P_VALUE_FLOOR: f64 = 0.001;

/// Formats any test result as a one-line APA report.
///
/// # Examples
///
/// ```
/// use u_inference::{format_result_as_apa, mann_whitney_u_test, TestOptions};
///
/// let g1 = [85.0, 72.0, 91.0, 68.0, 77.0, 95.0, 83.0, 89.0];
/// let g2 = [65.0, 78.0, 71.0, 62.0, 73.0, 69.0, 75.0, 67.0];
/// let r = mann_whitney_u_test(&g1, &g2, &TestOptions::default()).unwrap();
/// assert_eq!(
///     format_result_as_apa(&r.into()),
///     "U = 9.00, z = -2.36, p = .018, r = .72"
/// );
/// ```
pub fn format_result_as_apa(result: &TestResult) -> String {
    match result {
        TestResult::TTest(r) => format_t_test(r),
        TestResult::Anova(r) => format_anova(r),
        TestResult::ChiSquareIndependence(r) => format_chi_square_independence(r),
        TestResult::ChiSquareGoodness(r) => format_chi_square_goodness(r),
        TestResult::MannWhitney(r) => format_mann_whitney(r),
        TestResult::KruskalWallis(r) => format_kruskal_wallis(r),
        TestResult::Wilcoxon(r) => format_wilcoxon(r),
        TestResult::Friedman(r) => format_friedman(r),
        TestResult::RepeatedMeasuresAnova(r) => format_repeated_measures(r),
        TestResult::Correlation(r) => format_correlation(r),
        TestResult::McNemar(r) => format_mcnemar(r),
        TestResult::FisherExact(r) => format_fisher_exact(r),
        TestResult::SampleSize(r) => format_sample_size(r),
    }
}

/// `p = .xxx`, `p < .001`.
pub fn format_p_value(p: f64) -> String {
    if p < P_VALUE_FLOOR {
        "p < .001".to_string()
    } else {
        format!("p = {}", strip_leading_zero(p, 3))
    }
}

/// Fixed-point with `decimals` places; `-0.00` is printed as `0.00`.
pub fn fixed(value: f64, decimals: usize) -> String {
    let s = format!("{value:.decimals$}");
    match s.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => s,
    }
}

/// Fixed-point without the leading zero: `0.305` → `.31`, `-0.72` → `-.72`.
pub fn strip_leading_zero(value: f64, decimals: usize) -> String {
    let s = fixed(value, decimals);
    if let Some(rest) = s.strip_prefix("-0.") {
        format!("-.{rest}")
    } else if let Some(rest) = s.strip_prefix("0.") {
        format!(".{rest}")
    } else {
        s
    }
}

/// Significance level: `.05`, `.10`, `.001`, `.0005`.
pub fn format_alpha(alpha: f64) -> String {
    let mut s = strip_leading_zero(alpha, 6);
    while s.ends_with('0') && s.split('.').nth(1).is_some_and(|d| d.len() > 2) {
        s.pop();
    }
    s
}

/// Integer-valued numbers without decimals, anything else to 2 decimals.
fn count_or_fixed(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        fixed(value, 2)
    }
}

/// `95`, `90`, `99.5`: a confidence level as a percentage.
fn percent(level: f64) -> String {
    count_or_fixed((level * 100.0 * 1e6).round() / 1e6)
}

/// Odds and risk ratios: 2 decimals, `∞` when unbounded.
fn ratio(value: f64) -> String {
    if value.is_infinite() {
        "∞".to_string()
    } else {
        fixed(value, 2)
    }
}

fn ratio_interval(ci: &ConfidenceInterval) -> String {
    format!(
        "{}% CI [{}, {}]",
        percent(ci.level),
        ratio(ci.lower),
        ratio(ci.upper)
    )
}

fn format_t_test(r: &TTestResult) -> String {
    let df = if r.has_fractional_df() {
        fixed(r.df, 2)
    } else {
        count_or_fixed(r.df)
    };
    let ci = &r.confidence_interval;
    format!(
        "t({df}) = {}, {}, d = {}, {}% CI [{}, {}]",
        fixed(r.t, 2),
        format_p_value(r.p_value),
        fixed(r.cohens_d, 2),
        percent(ci.level),
        fixed(ci.lower, 2),
        fixed(ci.upper, 2),
    )
}

fn format_anova(r: &AnovaResult) -> String {
    format!(
        "F({}, {}) = {}, {}, η² = {}",
        r.df_between,
        r.df_within,
        fixed(r.f_statistic, 2),
        format_p_value(r.p_value),
        fixed(r.eta_squared, 2),
    )
}

fn format_chi_square_independence(r: &ChiSquareIndependenceResult) -> String {
    format!(
        "χ²({}, N = {}) = {}, {}, V = {}",
        r.df,
        count_or_fixed(r.grand_total),
        fixed(r.chi_square, 2),
        format_p_value(r.p_value),
        strip_leading_zero(r.cramers_v, 2),
    )
}

fn format_chi_square_goodness(r: &ChiSquareGoodnessResult) -> String {
    format!(
        "χ²({}, N = {}) = {}, {}, w = {}",
        r.df,
        count_or_fixed(r.total),
        fixed(r.chi_square, 2),
        format_p_value(r.p_value),
        strip_leading_zero(r.cohens_w, 2),
    )
}

fn format_mann_whitney(r: &MannWhitneyResult) -> String {
    format!(
        "U = {}, z = {}, {}, r = {}",
        fixed(r.u, 2),
        fixed(r.z, 2),
        format_p_value(r.p_value),
        strip_leading_zero(r.rank_biserial_r, 2),
    )
}

fn format_kruskal_wallis(r: &KruskalWallisResult) -> String {
    format!(
        "H({}) = {}, {}, η²H = {}",
        r.df,
        fixed(r.h_statistic, 2),
        format_p_value(r.p_value),
        fixed(r.eta_squared_h, 2),
    )
}

fn format_wilcoxon(r: &WilcoxonResult) -> String {
    format!(
        "W = {}, z = {}, {}, r = {}",
        fixed(r.w, 2),
        fixed(r.z, 2),
        format_p_value(r.p_value),
        strip_leading_zero(r.rank_biserial_r, 2),
    )
}

fn format_friedman(r: &FriedmanResult) -> String {
    format!(
        "χ²({}) = {}, {}, W = {}",
        r.df,
        fixed(r.chi_square, 2),
        format_p_value(r.p_value),
        strip_leading_zero(r.kendalls_w, 2),
    )
}

fn format_repeated_measures(r: &RepeatedMeasuresResult) -> String {
    let (df1, df2, p, note) = match &r.correction {
        Some(gg) => (
            fixed(gg.df_conditions, 2),
            fixed(gg.df_error, 2),
            gg.p_value,
            " (Greenhouse-Geisser corrected)",
        ),
        None => (
            r.df_conditions.to_string(),
            r.df_error.to_string(),
            r.p_value,
            "",
        ),
    };
    format!(
        "F({df1}, {df2}) = {}, {}, η²p = {}{note}",
        fixed(r.f_statistic, 2),
        format_p_value(p),
        fixed(r.partial_eta_squared, 2),
    )
}

fn format_correlation(r: &CorrelationResult) -> String {
    let symbol = match r.method {
        CorrelationMethod::Pearson => "r",
        CorrelationMethod::Spearman => "rₛ",
    };
    format!(
        "{symbol}({}) = {}, {}",
        r.df,
        strip_leading_zero(r.r, 2),
        format_p_value(r.p_value),
    )
}

fn format_mcnemar(r: &McNemarResult) -> String {
    match r.method {
        McNemarMethod::Exact => {
            format!("McNemar's exact test, {}", format_p_value(r.p_value))
        }
        McNemarMethod::ChiSquare => format!(
            "McNemar's test, χ²({}) = {}, {}",
            r.df,
            fixed(r.chi_square, 2),
            format_p_value(r.p_value),
        ),
    }
}

fn format_fisher_exact(r: &FisherExactResult) -> String {
    format!(
        "Fisher's exact test, {}, OR = {}, {}, RR = {}, {}",
        format_p_value(r.p_value),
        ratio(r.odds_ratio),
        ratio_interval(&r.odds_ratio_ci),
        ratio(r.relative_risk),
        ratio_interval(&r.relative_risk_ci),
    )
}

fn format_sample_size(r: &PowerResult) -> String {
    let per_group = if r.n_per_group != r.n_total {
        format!(" ({} per group)", r.n_per_group)
    } else {
        String::new()
    };
    let article = if r.test_type == PowerTestType::TwoSampleT {
        "an"
    } else {
        "a"
    };
    format!(
        "A power analysis for {article} {} was conducted using an effect size of {}, α = {}, \
         and power = {}. The required sample size is N = {}{}, achieved power = {}.",
        r.test_type.description(),
        fixed(r.effect_size, 2),
        format_alpha(r.alpha),
        strip_leading_zero(r.target_power, 2),
        r.n_total,
        per_group,
        strip_leading_zero(r.achieved_power, 2),
    )
}
