//! Correlation tests: Pearson product-moment and Spearman rank.
//!
//! Both test H₀: ρ = 0 with t = r·√(df / (1 − r²)), df = n − 2, and report
//! a Fisher z interval at the configured confidence level. Spearman's ρ is
//! Pearson's r on average ranks.
//!
//! # References
//!
//! - Pearson (1895). "Note on regression and inheritance in the case of
//!   two parents". *Proc. Royal Society of London* 58, 240–242.
//! - Spearman (1904). "The proof and measurement of association between
//!   two things". *American Journal of Psychology* 15(1), 72–101.
//! - Fisher (1921). "On the probable error of a coefficient of
//!   correlation". *Metron* 1, 3–32.
//!
//! # Examples
//!
//! ```
//! use u_inference::{pearson_correlation, spearman_correlation, TestOptions};
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let y = [2.1, 3.9, 6.2, 7.8, 10.1, 12.2];
//! let p = pearson_correlation(&x, &y, &TestOptions::default()).unwrap();
//! assert!(p.r > 0.99);
//! assert_eq!(p.df, 4);
//!
//! let s = spearman_correlation(&x, &y, &TestOptions::default()).unwrap();
//! assert_eq!(s.r, 1.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use u_numflow::{special, stats};

use crate::config::TestOptions;
use crate::distribution::t_two_tailed_p;
use crate::error::{InferenceError, InferenceResult};
use crate::rank::rank;
use crate::result::{ConfidenceInterval, EffectSizeLabel};
use crate::validation::{require_finite, require_finite_stats, require_min_len, required_stat};

/// Fewest pairs a correlation test accepts.
pub const MIN_CORRELATION_PAIRS: usize = 3;

/// Which coefficient a [`CorrelationResult`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

/// Result of a correlation test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    pub method: CorrelationMethod,
    /// Correlation coefficient in [−1, 1].
    pub r: f64,
    pub r_squared: f64,
    /// ±∞ when |r| = 1.
    pub t: f64,
    /// n − 2.
    pub df: usize,
    /// Two-tailed p-value.
    pub p_value: f64,
    /// Fisher z interval for ρ; [−1, 1] when n = 3.
    pub confidence_interval: ConfidenceInterval,
    /// Number of (x, y) pairs.
    pub n: usize,
    pub effect_size_label: EffectSizeLabel,
    pub significant: bool,
}

/// Pearson product-moment correlation with a t test of H₀: ρ = 0.
///
/// # Algorithm
///
/// r = Sxy / √(Sxx · Syy) over centred values, clamped to [−1, 1].
///
/// # Errors
///
/// - [`SampleSizeMismatch`](InferenceError::SampleSizeMismatch) if `x` and
///   `y` differ in length
/// - [`InsufficientData`](InferenceError::InsufficientData) for fewer than 3 pairs
/// - [`NonFiniteValue`](InferenceError::NonFiniteValue) for NaN/±∞
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if either
///   variable is constant
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if the
///   sums of squares exceed `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{pearson_correlation, TestOptions};
///
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [5.0, 4.0, 3.0, 2.0, 1.0];
/// let r = pearson_correlation(&x, &y, &TestOptions::default()).unwrap();
/// assert_eq!(r.r, -1.0);
/// assert_eq!(r.p_value, 0.0);
/// ```
pub fn pearson_correlation(
    x: &[f64],
    y: &[f64],
    options: &TestOptions,
) -> InferenceResult<CorrelationResult> {
    validate_pairs(x, y, options)?;
    let r = coefficient(x, y)?;
    finish(CorrelationMethod::Pearson, r, x.len(), options)
}

/// Spearman rank correlation: Pearson's r on average ranks of `x` and `y`.
///
/// # Errors
///
/// Same as [`pearson_correlation`]; a variable whose values are all tied
/// is degenerate.
///
/// # Examples
///
/// ```
/// use u_inference::{spearman_correlation, TestOptions};
///
/// // Monotone but non-linear
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let y = [1.0, 4.0, 9.0, 16.0, 25.0, 36.0];
/// let r = spearman_correlation(&x, &y, &TestOptions::default()).unwrap();
/// assert_eq!(r.r, 1.0);
/// ```
pub fn spearman_correlation(
    x: &[f64],
    y: &[f64],
    options: &TestOptions,
) -> InferenceResult<CorrelationResult> {
    validate_pairs(x, y, options)?;
    let rx = rank(x).ranks;
    let ry = rank(y).ranks;
    let r = coefficient(&rx, &ry)?;
    finish(CorrelationMethod::Spearman, r, x.len(), options)
}

fn validate_pairs(x: &[f64], y: &[f64], options: &TestOptions) -> InferenceResult<()> {
    options.validate()?;
    if x.len() != y.len() {
        return Err(InferenceError::SampleSizeMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    require_min_len(x, MIN_CORRELATION_PAIRS, "pairs")?;
    require_finite(x, "x")?;
    require_finite(y, "y")
}

fn coefficient(x: &[f64], y: &[f64]) -> InferenceResult<f64> {
    let n = x.len();
    let mx = required_stat(stats::mean(x), "x", n)?;
    let my = required_stat(stats::mean(y), "y", n)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denominator = (sxx * syy).sqrt();
    require_finite_stats(
        "cross-product sum exceeds floating-point range",
        &[sxy, denominator],
    )?;
    if sxx == 0.0 || syy == 0.0 {
        warn!(sxx, syy, "correlation: constant variable");
        return Err(InferenceError::DegenerateVariance(
            "a variable has zero variance",
        ));
    }
    Ok((sxy / denominator).clamp(-1.0, 1.0))
}

fn finish(
    method: CorrelationMethod,
    r: f64,
    n: usize,
    options: &TestOptions,
) -> InferenceResult<CorrelationResult> {
    let df = n - 2;
    let dff = df as f64;
    let t = if r.abs() == 1.0 {
        f64::INFINITY.copysign(r)
    } else {
        r * (dff / (1.0 - r * r)).sqrt()
    };
    let p_value = t_two_tailed_p(t, dff);

    let level = options.confidence_level;
    let confidence_interval = if r.abs() == 1.0 {
        ConfidenceInterval {
            level,
            lower: r,
            upper: r,
        }
    } else {
        // se = ∞ at n = 3 widens the interval to [−1, 1].
        let critical = special::inverse_normal_cdf(0.5 + level / 2.0);
        let z = ConfidenceInterval::symmetric(
            level,
            r.atanh(),
            critical,
            1.0 / (n as f64 - 3.0).sqrt(),
        );
        ConfidenceInterval {
            level,
            lower: z.lower.tanh(),
            upper: z.upper.tanh(),
        }
    };

    debug!(?method, r, t, df, p_value, "correlation test");
    Ok(CorrelationResult {
        method,
        r,
        r_squared: r * r,
        t,
        df,
        p_value,
        confidence_interval,
        n,
        effect_size_label: EffectSizeLabel::for_correlation(r),
        significant: p_value < options.alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const X: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
    const Y: [f64; 10] = [2.0, 1.0, 4.0, 3.0, 7.0, 8.0, 6.0, 9.0, 12.0, 10.0];

    fn opts() -> TestOptions {
        TestOptions::default()
    }

    #[test]
    fn pearson_reference() {
        // R: cor.test(X, Y)
        let r = pearson_correlation(&X, &Y, &opts()).unwrap();
        assert_eq!(r.method, CorrelationMethod::Pearson);
        assert_abs_diff_eq!(r.r, 0.926_179_711, epsilon = 1e-8);
        assert_abs_diff_eq!(r.t, 6.947_106_958, epsilon = 1e-6);
        assert_eq!(r.df, 8);
        assert_abs_diff_eq!(r.p_value, 1.187_628e-4, epsilon = 1e-9);
        assert_abs_diff_eq!(r.confidence_interval.lower, 0.711_410_223, epsilon = 1e-6);
        assert_abs_diff_eq!(r.confidence_interval.upper, 0.982_729_910, epsilon = 1e-6);
        assert_abs_diff_eq!(r.r_squared, r.r * r.r, epsilon = 1e-15);
        assert_eq!(r.effect_size_label, EffectSizeLabel::Large);
        assert!(r.significant);
    }

    #[test]
    fn spearman_reference_with_ties() {
        let x = [1.0, 2.0, 2.0, 4.0, 5.0, 6.0];
        let y = [1.0, 3.0, 2.0, 2.0, 6.0, 5.0];
        // ranks x: 1, 2.5, 2.5, 4, 5, 6; ranks y: 1, 4, 2.5, 2.5, 6, 5
        let r = spearman_correlation(&x, &y, &opts()).unwrap();
        assert_eq!(r.method, CorrelationMethod::Spearman);
        assert_abs_diff_eq!(r.r, 0.808_823_529, epsilon = 1e-8);
        assert_abs_diff_eq!(r.p_value, 0.051_329_063, epsilon = 1e-8);
        assert!(!r.significant);
        assert_eq!(r.df, 4);
    }

    #[test]
    fn spearman_ignores_monotone_transform() {
        let cubed: Vec<f64> = Y.iter().map(|v| v * v * v).collect();
        let a = spearman_correlation(&X, &Y, &opts()).unwrap();
        let b = spearman_correlation(&X, &cubed, &opts()).unwrap();
        assert_eq!(a.r, b.r);
    }

    #[test]
    fn perfect_correlation_has_point_interval() {
        let y: Vec<f64> = X.iter().map(|v| 3.0 * v - 1.0).collect();
        let r = pearson_correlation(&X, &y, &opts()).unwrap();
        assert_eq!(r.r, 1.0);
        assert_eq!(r.t, f64::INFINITY);
        assert_eq!(r.p_value, 0.0);
        assert_eq!(
            (r.confidence_interval.lower, r.confidence_interval.upper),
            (1.0, 1.0)
        );
    }

    #[test]
    fn three_pairs_give_unit_interval() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[1.0, 3.0, 2.0], &opts()).unwrap();
        assert_abs_diff_eq!(r.r, 0.5, epsilon = 1e-12);
        assert_eq!(r.df, 1);
        assert_eq!(
            (r.confidence_interval.lower, r.confidence_interval.upper),
            (-1.0, 1.0)
        );
    }

    #[test]
    fn confidence_level_is_honoured() {
        let wide = pearson_correlation(&X, &Y, &opts().with_confidence_level(0.99)).unwrap();
        let narrow = pearson_correlation(&X, &Y, &opts()).unwrap();
        assert!(wide.confidence_interval.lower < narrow.confidence_interval.lower);
        assert_eq!(wide.confidence_interval.level, 0.99);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            pearson_correlation(&[1.0, 2.0, 3.0], &[1.0, 2.0], &opts()),
            Err(InferenceError::SampleSizeMismatch { left: 3, right: 2 })
        ));
        assert!(matches!(
            pearson_correlation(&[1.0, 2.0], &[1.0, 2.0], &opts()),
            Err(InferenceError::InsufficientData { actual: 2, .. })
        ));
        assert!(matches!(
            spearman_correlation(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0], &opts()),
            Err(InferenceError::NonFiniteValue { index: 1, .. })
        ));
        assert!(matches!(
            pearson_correlation(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0], &opts()),
            Err(InferenceError::DegenerateVariance(_))
        ));
        assert!(matches!(
            pearson_correlation(&[1e200, -1e200, 3e200], &[1.0, 2.0, 3.0], &opts()),
            Err(InferenceError::NumericalOverflow(_))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pairs() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        (3usize..30).prop_flat_map(|n| {
            (
                proptest::collection::vec(-100.0f64..100.0, n),
                proptest::collection::vec(-100.0f64..100.0, n),
            )
        })
    }

    proptest! {
        #[test]
        fn coefficient_is_symmetric_and_bounded((x, y) in pairs()) {
            if let (Ok(a), Ok(b)) = (
                pearson_correlation(&x, &y, &TestOptions::default()),
                pearson_correlation(&y, &x, &TestOptions::default()),
            ) {
                prop_assert!((a.r - b.r).abs() < 1e-12);
                prop_assert!((-1.0..=1.0).contains(&a.r));
                prop_assert!((0.0..=1.0).contains(&a.p_value));
                prop_assert!(a.confidence_interval.lower <= a.r + 1e-12);
                prop_assert!(a.confidence_interval.upper >= a.r - 1e-12);
            }
        }

        #[test]
        fn spearman_is_bounded((x, y) in pairs()) {
            if let Ok(s) = spearman_correlation(&x, &y, &TestOptions::default()) {
                prop_assert!((-1.0..=1.0).contains(&s.r));
            }
        }
    }
}
