//! Power analysis and sample-size determination.
//!
//! Power is evaluated from the exact non-central distribution of each
//! test statistic where one exists:
//!
//! | Family | Effect size | Power model |
//! |---|---|---|
//! | two-sample / paired / one-sample t | Cohen's d | non-central t |
//! | one-way ANOVA | Cohen's f | non-central F, λ = f²N |
//! | χ² (goodness-of-fit / independence) | Cohen's w | non-central χ², λ = w²N |
//! | correlation | r | Fisher z normal approximation |
//! | two proportions | Cohen's h | normal approximation |
//!
//! The required N is the smallest integer whose power reaches the target,
//! found by doubling and then bisecting on the monotone power curve, so
//! `achieved_power >= power` always holds.
//!
//! # References
//!
//! - Cohen (1988). *Statistical Power Analysis for the Behavioral
//!   Sciences*, 2nd ed. Lawrence Erlbaum.
//! - Faul, Erdfelder, Lang & Buchner (2007). "G*Power 3". *Behavior
//!   Research Methods* 39(2), 175–191.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use u_numflow::special;

use crate::distribution::{noncentral_chi_square_sf, noncentral_f_sf};
use crate::error::{InferenceError, InferenceResult};
use crate::result::EffectSizeLabel;

/// Default number of groups for ANOVA power.
pub const DEFAULT_NUM_GROUPS: usize = 3;

/// Default degrees of freedom for χ² power.
pub const DEFAULT_CHI_SQUARE_DF: usize = 1;

/// Largest sample size (per design unit) the solver will search.
pub const MAX_SAMPLE_SIZE: usize = 10_000_000;

/// Test family the sample size is planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerTestType {
    TwoSampleT,
    PairedT,
    OneSampleT,
    Anova,
    Correlation,
    #[serde(alias = "chi-square-2x2")]
    ChiSquare,
    Proportion,
}

impl PowerTestType {
    /// Smallest sample size for which the test is defined.
    fn min_n(self) -> usize {
        match self {
            Self::Correlation => 4,
            _ => 2,
        }
    }

    /// Human-readable test name for reports.
    pub fn description(self) -> &'static str {
        match self {
            Self::TwoSampleT => "independent-samples t-test",
            Self::PairedT => "paired-samples t-test",
            Self::OneSampleT => "one-sample t-test",
            Self::Anova => "one-way ANOVA",
            Self::Correlation => "correlation",
            Self::ChiSquare => "chi-square test",
            Self::Proportion => "two-proportion test",
        }
    }
}

/// Input to [`compute_sample_size`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerSpec {
    pub test_type: PowerTestType,
    /// d, f, r, w or h depending on `test_type`.
    pub effect_size: f64,
    pub alpha: f64,
    /// Target power 1 − β.
    pub power: f64,
    /// Groups for ANOVA; defaults to 3.
    #[serde(default)]
    pub num_groups: Option<usize>,
    /// Degrees of freedom for χ²; defaults to 1.
    #[serde(default)]
    pub df: Option<usize>,
}

impl PowerSpec {
    /// Defaults to α = .05 and power = .80.
    pub fn new(test_type: PowerTestType, effect_size: f64) -> Self {
        Self {
            test_type,
            effect_size,
            alpha: 0.05,
            power: 0.80,
            num_groups: None,
            df: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn with_num_groups(mut self, k: usize) -> Self {
        self.num_groups = Some(k);
        self
    }

    pub fn with_df(mut self, df: usize) -> Self {
        self.df = Some(df);
        self
    }

    fn groups(&self) -> usize {
        self.num_groups.unwrap_or(DEFAULT_NUM_GROUPS)
    }

    fn chi_square_df(&self) -> usize {
        self.df.unwrap_or(DEFAULT_CHI_SQUARE_DF)
    }

    /// Observations per design unit: groups for between-subjects designs.
    fn units(&self) -> usize {
        match self.test_type {
            PowerTestType::TwoSampleT | PowerTestType::Proportion => 2,
            PowerTestType::Anova => self.groups(),
            _ => 1,
        }
    }

    fn validate(&self) -> InferenceResult<()> {
        let invalid = |name: &'static str, value: f64, reason: &'static str| -> InferenceResult<()> {
            Err(InferenceError::InvalidParameter {
                name,
                value,
                reason,
            })
        };
        if !(self.effect_size.is_finite() && self.effect_size > 0.0) {
            return invalid("effectSize", self.effect_size, "must be positive");
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return invalid("alpha", self.alpha, "must lie in (0, 1)");
        }
        if !(self.power > 0.0 && self.power < 1.0) {
            return invalid("power", self.power, "must lie in (0, 1)");
        }
        match self.test_type {
            PowerTestType::Correlation if self.effect_size >= 1.0 => {
                invalid("effectSize", self.effect_size, "correlation must be below 1")
            }
            PowerTestType::Proportion if self.effect_size > std::f64::consts::PI => {
                invalid("effectSize", self.effect_size, "Cohen's h cannot exceed π")
            }
            PowerTestType::Anova if self.groups() < 2 => {
                invalid("numGroups", self.groups() as f64, "need at least 2 groups")
            }
            PowerTestType::ChiSquare if self.chi_square_df() < 1 => {
                invalid("df", self.chi_square_df() as f64, "must be at least 1")
            }
            _ => Ok(()),
        }
    }
}

/// Output of [`compute_sample_size`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerResult {
    pub test_type: PowerTestType,
    pub n_total: usize,
    /// Equals `n_total` for single-sample designs.
    pub n_per_group: usize,
    /// Power at the returned N; never below `target_power`.
    pub achieved_power: f64,
    pub effect_size: f64,
    pub effect_size_label: EffectSizeLabel,
    pub alpha: f64,
    #[serde(rename = "power")]
    pub target_power: f64,
}

/// Smallest sample size reaching the target power.
///
/// # Errors
///
/// [`InvalidParameter`](InferenceError::InvalidParameter) when the effect
/// size is not positive (or r ≥ 1), alpha or power lie outside (0, 1),
/// ANOVA has fewer than 2 groups, or the required N exceeds
/// [`MAX_SAMPLE_SIZE`] per group.
///
/// # Examples
///
/// ```
/// use u_inference::power::{compute_sample_size, PowerSpec, PowerTestType};
///
/// let r = compute_sample_size(&PowerSpec::new(PowerTestType::TwoSampleT, 0.5)).unwrap();
/// assert_eq!(r.n_per_group, 64);
/// assert_eq!(r.n_total, 128);
/// assert!(r.achieved_power >= 0.80);
/// ```
pub fn compute_sample_size(spec: &PowerSpec) -> InferenceResult<PowerResult> {
    spec.validate()?;
    let n = minimal_n(spec)?;
    let achieved_power = power_for(spec, n);
    let n_total = n * spec.units();

    debug!(
        test_type = ?spec.test_type,
        effect_size = spec.effect_size,
        n_per_group = n,
        n_total,
        achieved_power,
        "sample size"
    );
    Ok(PowerResult {
        test_type: spec.test_type,
        n_total,
        n_per_group: n,
        achieved_power,
        effect_size: spec.effect_size,
        effect_size_label: effect_size_label(spec.test_type, spec.effect_size),
        alpha: spec.alpha,
        target_power: spec.power,
    })
}

/// Power of the planned test with `n` observations per group (or in total
/// for single-sample designs). `spec.power` is ignored.
///
/// # Errors
///
/// Same parameter checks as [`compute_sample_size`], plus
/// [`InsufficientData`](InferenceError::InsufficientData) when `n` is below
/// the smallest size the test is defined for (4 for correlation, else 2).
///
/// # Examples
///
/// ```
/// use u_inference::power::{power_at, PowerSpec, PowerTestType};
///
/// let spec = PowerSpec::new(PowerTestType::TwoSampleT, 0.5);
/// let p = power_at(&spec, 63).unwrap();
/// assert!(p > 0.79 && p < 0.80);
/// ```
pub fn power_at(spec: &PowerSpec, n: usize) -> InferenceResult<f64> {
    spec.validate()?;
    let min = spec.test_type.min_n();
    if n < min {
        return Err(InferenceError::InsufficientData {
            label: "sample size".to_string(),
            required: min,
            actual: n,
        });
    }
    Ok(power_for(spec, n))
}

fn effect_size_label(test_type: PowerTestType, effect_size: f64) -> EffectSizeLabel {
    match test_type {
        PowerTestType::Anova => EffectSizeLabel::for_cohens_f(effect_size),
        PowerTestType::Correlation | PowerTestType::ChiSquare => {
            EffectSizeLabel::for_correlation(effect_size)
        }
        _ => EffectSizeLabel::for_cohens_d(effect_size),
    }
}

fn minimal_n(spec: &PowerSpec) -> InferenceResult<usize> {
    let reaches = |n: usize| power_for(spec, n) >= spec.power;

    let mut lo = spec.test_type.min_n();
    if reaches(lo) {
        return Ok(lo);
    }
    let mut hi = lo * 2;
    while !reaches(hi) {
        if hi >= MAX_SAMPLE_SIZE {
            warn!(
                test_type = ?spec.test_type,
                effect_size = spec.effect_size,
                "power search exceeded the sample size limit"
            );
            return Err(InferenceError::InvalidParameter {
                name: "effectSize",
                value: spec.effect_size,
                reason: "too small to reach the target power",
            });
        }
        lo = hi;
        hi = (hi * 2).min(MAX_SAMPLE_SIZE);
    }
    // Invariant: power(lo) < target <= power(hi).
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if reaches(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(hi)
}

fn power_for(spec: &PowerSpec, n: usize) -> f64 {
    let es = spec.effect_size;
    let alpha = spec.alpha;
    let nf = n as f64;
    match spec.test_type {
        PowerTestType::TwoSampleT => two_sided_t_power(es * (nf / 2.0).sqrt(), 2.0 * nf - 2.0, alpha),
        PowerTestType::PairedT | PowerTestType::OneSampleT => {
            two_sided_t_power(es * nf.sqrt(), nf - 1.0, alpha)
        }
        PowerTestType::Anova => {
            let k = spec.groups() as f64;
            let total = nf * k;
            let (df1, df2) = (k - 1.0, total - k);
            let critical = special::f_distribution_quantile(1.0 - alpha, df1, df2);
            noncentral_f_sf(critical, df1, df2, es * es * total)
        }
        PowerTestType::ChiSquare => {
            let df = spec.chi_square_df() as f64;
            let critical = special::chi_squared_quantile(1.0 - alpha, df);
            noncentral_chi_square_sf(critical, df, es * es * nf)
        }
        PowerTestType::Correlation => two_sided_z_power(es.atanh() * (nf - 3.0).sqrt(), alpha),
        PowerTestType::Proportion => two_sided_z_power(es * (nf / 2.0).sqrt(), alpha),
    }
}

/// P(|T'| > t_crit) for T' ~ t'(df, δ).
fn two_sided_t_power(delta: f64, df: f64, alpha: f64) -> f64 {
    let critical = special::t_distribution_quantile(1.0 - alpha / 2.0, df);
    let upper = 1.0 - special::noncentral_t_cdf(critical, df, delta);
    let lower = special::noncentral_t_cdf(-critical, df, delta);
    (upper + lower).clamp(0.0, 1.0)
}

/// P(|Z + μ| > z_crit) for Z ~ N(0, 1).
fn two_sided_z_power(mu: f64, alpha: f64) -> f64 {
    let critical = special::inverse_normal_cdf(1.0 - alpha / 2.0);
    special::standard_normal_cdf(mu - critical) + special::standard_normal_cdf(-mu - critical)
}
