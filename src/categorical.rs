//! Tests for categorical data.
//!
//! - [`chi_square_independence`]: association in an r × c [`ContingencyTable`]
//! - [`chi_square_goodness_of_fit`]: one observed count vector against
//!   expected proportions
//! - [`mcnemar_test`]: paired proportions in a 2 × 2 table
//! - [`fisher_exact_test`]: exact independence test for a 2 × 2 table
//!
//! # Examples
//!
//! ```
//! use u_inference::{chi_square_independence, ContingencyTable, TestOptions};
//!
//! let table = ContingencyTable::new(vec![
//!     vec![30.0, 10.0, 10.0],
//!     vec![15.0, 20.0, 15.0],
//! ]).unwrap();
//! let r = chi_square_independence(&table, &TestOptions::default()).unwrap();
//! assert_eq!(r.df, 2);
//! assert!(r.p_value < 0.01);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use u_numflow::special;

use crate::config::TestOptions;
use crate::distribution::chi_square_sf;
use crate::error::{InferenceError, InferenceResult};
use crate::result::{ConfidenceInterval, EffectSizeLabel};
use crate::validation::require_finite_stats;

/// Validated r × c table of non-negative counts with its margins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContingencyTable {
    observed: Vec<Vec<f64>>,
    row_totals: Vec<f64>,
    col_totals: Vec<f64>,
    grand_total: f64,
}

impl ContingencyTable {
    /// Builds a table from rows of counts.
    ///
    /// # Errors
    ///
    /// - [`MalformedTable`](InferenceError::MalformedTable) if there are fewer
    ///   than 2 rows or 2 columns, rows differ in length, or any cell is
    ///   negative or non-finite
    /// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if the
    ///   counts sum past `f64` range
    pub fn new(observed: Vec<Vec<f64>>) -> InferenceResult<Self> {
        if observed.len() < 2 {
            return Err(InferenceError::MalformedTable(format!(
                "need at least 2 rows, got {}",
                observed.len()
            )));
        }
        let cols = observed[0].len();
        if cols < 2 {
            return Err(InferenceError::MalformedTable(format!(
                "need at least 2 columns, got {cols}"
            )));
        }
        for (i, row) in observed.iter().enumerate() {
            if row.len() != cols {
                return Err(InferenceError::MalformedTable(format!(
                    "row {} has {} cells, expected {cols}",
                    i + 1,
                    row.len()
                )));
            }
            if let Some(j) = row.iter().position(|c| !c.is_finite() || *c < 0.0) {
                return Err(InferenceError::MalformedTable(format!(
                    "cell ({}, {}) = {} is not a non-negative count",
                    i + 1,
                    j + 1,
                    row[j]
                )));
            }
        }

        let row_totals: Vec<f64> = observed.iter().map(|r| r.iter().sum()).collect();
        let col_totals: Vec<f64> = (0..cols)
            .map(|j| observed.iter().map(|r| r[j]).sum())
            .collect();
        let grand_total: f64 = row_totals.iter().sum();
        if !grand_total.is_finite() {
            warn!("contingency table: total count overflows");
            return Err(InferenceError::NumericalOverflow(
                "table total exceeds floating-point range",
            ));
        }

        Ok(Self {
            observed,
            row_totals,
            col_totals,
            grand_total,
        })
    }

    pub fn rows(&self) -> usize {
        self.observed.len()
    }

    pub fn cols(&self) -> usize {
        self.col_totals.len()
    }

    pub fn observed(&self) -> &[Vec<f64>] {
        &self.observed
    }

    pub fn row_totals(&self) -> &[f64] {
        &self.row_totals
    }

    pub fn col_totals(&self) -> &[f64] {
        &self.col_totals
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }

    /// Expected counts under independence, rowTotal[i] · colTotal[j] / N.
    ///
    /// Each row of the result sums to the corresponding row total.
    pub fn expected(&self) -> Vec<Vec<f64>> {
        self.row_totals
            .iter()
            .map(|&r| {
                self.col_totals
                    .iter()
                    .map(|&c| r * c / self.grand_total)
                    .collect()
            })
            .collect()
    }
}

/// Result of a chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChiSquareIndependenceResult {
    pub chi_square: f64,
    /// (r − 1)(c − 1).
    pub df: usize,
    pub p_value: f64,
    /// √(χ² / (N · min(r − 1, c − 1))).
    pub cramers_v: f64,
    pub effect_size_label: EffectSizeLabel,
    pub observed: Vec<Vec<f64>>,
    pub expected: Vec<Vec<f64>>,
    pub row_totals: Vec<f64>,
    pub col_totals: Vec<f64>,
    pub grand_total: f64,
    pub significant: bool,
}

/// Result of a chi-square goodness-of-fit test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChiSquareGoodnessResult {
    pub chi_square: f64,
    /// k − 1.
    pub df: usize,
    pub p_value: f64,
    /// Cohen's w = √(χ² / N).
    pub cohens_w: f64,
    pub effect_size_label: EffectSizeLabel,
    pub observed: Vec<f64>,
    /// Expected counts, scaled to the observed total.
    pub expected: Vec<f64>,
    pub total: f64,
    pub significant: bool,
}

/// Pearson chi-square test of independence.
///
/// χ² = Σ (O − E)² / E over all cells, df = (r − 1)(c − 1).
///
/// # Errors
///
/// [`DegenerateVariance`](InferenceError::DegenerateVariance) if any
/// expected count is zero (an all-zero row or column).
pub fn chi_square_independence(
    table: &ContingencyTable,
    options: &TestOptions,
) -> InferenceResult<ChiSquareIndependenceResult> {
    options.validate()?;
    let expected = table.expected();
    if expected.iter().flatten().any(|&e| e == 0.0) {
        warn!("chi-square independence: zero expected count");
        return Err(InferenceError::DegenerateVariance(
            "an expected cell count is zero",
        ));
    }

    let chi_square: f64 = table
        .observed()
        .iter()
        .flatten()
        .zip(expected.iter().flatten())
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();
    let (r, c) = (table.rows(), table.cols());
    let df = (r - 1) * (c - 1);
    let p_value = chi_square_sf(chi_square, df as f64);
    let min_dim = (r.min(c) - 1) as f64;
    let cramers_v = (chi_square / (table.grand_total() * min_dim)).sqrt().min(1.0);

    debug!(chi_square, df, p_value, cramers_v, "chi-square independence");
    Ok(ChiSquareIndependenceResult {
        chi_square,
        df,
        p_value,
        cramers_v,
        effect_size_label: EffectSizeLabel::for_correlation(cramers_v),
        observed: table.observed().to_vec(),
        expected,
        row_totals: table.row_totals().to_vec(),
        col_totals: table.col_totals().to_vec(),
        grand_total: table.grand_total(),
        significant: p_value < options.alpha,
    })
}

/// Chi-square goodness-of-fit test.
///
/// `expected` gives the relative frequency of each category (counts,
/// proportions or any positive weights). `None` means a uniform
/// distribution.
///
/// The expected vector is always rescaled to the observed total N, so
/// Σ E = Σ O holds and df = k − 1 is valid. Expected counts that already
/// sum to N are used as given; counts with another total are treated as
/// weights, not compared verbatim against the observed counts.
///
/// # Errors
///
/// - [`MalformedTable`](InferenceError::MalformedTable) for fewer than 2
///   categories, a length mismatch, or negative/non-finite entries
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if any
///   expected count is zero
/// - [`NumericalOverflow`](InferenceError::NumericalOverflow) if the
///   observed counts sum past `f64` range
///
/// # Examples
///
/// ```
/// use u_inference::{chi_square_goodness_of_fit, TestOptions};
///
/// let r = chi_square_goodness_of_fit(&[50.0, 30.0, 20.0], None, &TestOptions::default()).unwrap();
/// assert_eq!(r.df, 2);
/// assert!((r.chi_square - 14.0).abs() < 1e-12);
/// ```
pub fn chi_square_goodness_of_fit(
    observed: &[f64],
    expected: Option<&[f64]>,
    options: &TestOptions,
) -> InferenceResult<ChiSquareGoodnessResult> {
    options.validate()?;
    let k = observed.len();
    if k < 2 {
        return Err(InferenceError::MalformedTable(format!(
            "need at least 2 categories, got {k}"
        )));
    }
    check_counts(observed, "observed")?;

    let total: f64 = observed.iter().sum();
    require_finite_stats("observed total exceeds floating-point range", &[total])?;
    let expected = match expected {
        None => vec![total / k as f64; k],
        Some(weights) => {
            if weights.len() != k {
                return Err(InferenceError::MalformedTable(format!(
                    "expected has {} categories, observed has {k}",
                    weights.len()
                )));
            }
            check_counts(weights, "expected")?;
            let weight_total: f64 = weights.iter().sum();
            if weight_total == 0.0 {
                vec![0.0; k]
            } else {
                weights.iter().map(|w| w / weight_total * total).collect()
            }
        }
    };
    if expected.iter().any(|&e| e == 0.0) {
        warn!("chi-square goodness of fit: zero expected count");
        return Err(InferenceError::DegenerateVariance(
            "an expected category count is zero",
        ));
    }

    let chi_square: f64 = observed
        .iter()
        .zip(&expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();
    let df = k - 1;
    let p_value = chi_square_sf(chi_square, df as f64);
    let cohens_w = (chi_square / total).sqrt();

    debug!(chi_square, df, p_value, cohens_w, "chi-square goodness of fit");
    Ok(ChiSquareGoodnessResult {
        chi_square,
        df,
        p_value,
        cohens_w,
        effect_size_label: EffectSizeLabel::for_correlation(cohens_w),
        observed: observed.to_vec(),
        expected,
        total,
        significant: p_value < options.alpha,
    })
}

// ---------------------------------------------------------------------------
// 2 × 2 tables: McNemar and Fisher's exact test
// ---------------------------------------------------------------------------

/// Discordant-pair total below which McNemar's test uses the exact
/// binomial distribution instead of χ²(1).
pub const MCNEMAR_EXACT_THRESHOLD: f64 = 25.0;

/// Largest table total Fisher's exact test enumerates.
pub const FISHER_MAX_TOTAL: f64 = 1e7;

/// Relative slack when collecting tables as extreme as the observed one.
const FISHER_RELATIVE_TOLERANCE: f64 = 1e-7;

/// Which reference distribution a [`McNemarResult`] p-value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McNemarMethod {
    /// Two-sided binomial test on the discordant pairs.
    Exact,
    /// χ²(1) approximation.
    ChiSquare,
}

/// Result of McNemar's test for paired proportions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McNemarResult {
    pub method: McNemarMethod,
    /// (|b − c| − 1)² / (b + c), or (b − c)² / (b + c) without continuity
    /// correction. Reported for both methods.
    pub chi_square: f64,
    /// Always 1.
    pub df: usize,
    pub p_value: f64,
    /// Pairs positive before and negative after (cell [0][1]).
    pub b: f64,
    /// Pairs negative before and positive after (cell [1][0]).
    pub c: f64,
    /// b / c; ∞ when c = 0.
    pub odds_ratio: f64,
    /// Log-scale interval; [0, ∞] when b or c is zero.
    pub odds_ratio_ci: ConfidenceInterval,
    /// (b + c) / N.
    pub proportion_changed: f64,
    pub n: f64,
    pub significant: bool,
}

/// Result of Fisher's exact test on a 2 × 2 table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FisherExactResult {
    /// Two-sided: total probability of tables no more likely than the
    /// observed one.
    pub p_value: f64,
    /// Sample odds ratio ad / bc; 0 or ∞ when a cell is zero.
    pub odds_ratio: f64,
    /// Woolf interval; [0, ∞] when any cell is zero.
    pub odds_ratio_ci: ConfidenceInterval,
    /// Risk in row 1 over risk in row 2, (a / (a + b)) / (c / (c + d)).
    pub relative_risk: f64,
    /// Log-scale interval; [0, ∞] when a or c is zero.
    pub relative_risk_ci: ConfidenceInterval,
    pub observed: Vec<Vec<f64>>,
    pub significant: bool,
}

/// Cells [[a, b], [c, d]] of a 2 × 2 table of whole counts.
fn two_by_two(table: &ContingencyTable, test: &str) -> InferenceResult<[f64; 4]> {
    if table.rows() != 2 || table.cols() != 2 {
        return Err(InferenceError::MalformedTable(format!(
            "{test} needs a 2 × 2 table, got {} × {}",
            table.rows(),
            table.cols()
        )));
    }
    let o = table.observed();
    let cells = [o[0][0], o[0][1], o[1][0], o[1][1]];
    if let Some(v) = cells.iter().find(|v| v.fract() != 0.0) {
        return Err(InferenceError::MalformedTable(format!(
            "{test} needs whole counts, got {v}"
        )));
    }
    Ok(cells)
}

/// Interval exp(ln(estimate) ± z · se), or [0, ∞] when `se` is `None`.
fn log_interval(level: f64, estimate: f64, se: Option<f64>) -> ConfidenceInterval {
    match se {
        Some(se) => {
            let critical = special::inverse_normal_cdf(0.5 + level / 2.0);
            let log = ConfidenceInterval::symmetric(level, estimate.ln(), critical, se);
            ConfidenceInterval {
                level,
                lower: log.lower.exp(),
                upper: log.upper.exp(),
            }
        }
        None => ConfidenceInterval {
            level,
            lower: 0.0,
            upper: f64::INFINITY,
        },
    }
}

/// `numerator / denominator`, with x / 0 = ∞ for x > 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::INFINITY
    } else {
        numerator / denominator
    }
}

/// McNemar's test of marginal homogeneity in a paired 2 × 2 table.
///
/// Rows are the first measurement, columns the second; only the
/// discordant cells b = [0][1] and c = [1][0] carry information.
///
/// # Algorithm
///
/// - b + c < 25: exact two-sided binomial test,
///   p = min(1, 2 · P(X ≥ max(b, c))) with X ~ Bin(b + c, ½)
/// - otherwise χ² = (|b − c| − 1)² / (b + c) on 1 df, with the continuity
///   correction following [`TestOptions::continuity_correction`]
///
/// # References
///
/// McNemar (1947). "Note on the sampling error of the difference between
/// correlated proportions or percentages". *Psychometrika* 12(2), 153–157.
///
/// # Errors
///
/// - [`MalformedTable`](InferenceError::MalformedTable) unless the table is
///   2 × 2 with whole counts
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if there
///   are no discordant pairs
///
/// # Examples
///
/// ```
/// use u_inference::{mcnemar_test, ContingencyTable, McNemarMethod, TestOptions};
///
/// let table = ContingencyTable::new(vec![vec![40.0, 9.0], vec![3.0, 48.0]]).unwrap();
/// let r = mcnemar_test(&table, &TestOptions::default()).unwrap();
/// assert_eq!(r.method, McNemarMethod::Exact);
/// assert!(!r.significant);
/// ```
pub fn mcnemar_test(
    table: &ContingencyTable,
    options: &TestOptions,
) -> InferenceResult<McNemarResult> {
    options.validate()?;
    let [_, b, c, _] = two_by_two(table, "McNemar's test")?;
    let discordant = b + c;
    if discordant == 0.0 {
        warn!("mcnemar: no discordant pairs");
        return Err(InferenceError::DegenerateVariance("no discordant pairs"));
    }

    let difference = if options.continuity_correction {
        ((b - c).abs() - 1.0).max(0.0)
    } else {
        (b - c).abs()
    };
    let chi_square = difference * difference / discordant;
    let (method, p_value) = if discordant < MCNEMAR_EXACT_THRESHOLD {
        let m = b.max(c);
        let upper = special::regularized_incomplete_beta(0.5, m, discordant - m + 1.0);
        (McNemarMethod::Exact, (2.0 * upper).min(1.0))
    } else {
        (McNemarMethod::ChiSquare, chi_square_sf(chi_square, 1.0))
    };

    let odds_ratio = ratio(b, c);
    let se = (b > 0.0 && c > 0.0).then(|| (1.0 / b + 1.0 / c).sqrt());
    let odds_ratio_ci = log_interval(options.confidence_level, odds_ratio, se);
    let n = table.grand_total();

    debug!(?method, b, c, chi_square, p_value, "mcnemar test");
    Ok(McNemarResult {
        method,
        chi_square,
        df: 1,
        p_value,
        b,
        c,
        odds_ratio,
        odds_ratio_ci,
        proportion_changed: discordant / n,
        n,
        significant: p_value < options.alpha,
    })
}

/// Fisher's exact test of independence in a 2 × 2 table.
///
/// # Algorithm
///
/// With the margins fixed, the count in cell [0][0] is hypergeometric.
/// The two-sided p-value sums the probabilities of every table whose
/// probability does not exceed the observed table's (within a relative
/// 10⁻⁷), evaluated in log space through ln Γ.
///
/// # References
///
/// - Fisher (1935). "The logic of inductive inference". *JRSS* 98(1), 39–82.
/// - Woolf (1955). "On estimating the relation between blood group and
///   disease". *Annals of Human Genetics* 19(4), 251–253.
///
/// # Errors
///
/// - [`MalformedTable`](InferenceError::MalformedTable) unless the table is
///   2 × 2 with whole counts
/// - [`DegenerateVariance`](InferenceError::DegenerateVariance) if a row or
///   column total is zero
/// - [`InvalidParameter`](InferenceError::InvalidParameter) if the total
///   exceeds [`FISHER_MAX_TOTAL`]; use [`chi_square_independence`] instead
///
/// # Examples
///
/// ```
/// use u_inference::{fisher_exact_test, ContingencyTable, TestOptions};
///
/// let table = ContingencyTable::new(vec![vec![8.0, 2.0], vec![1.0, 5.0]]).unwrap();
/// let r = fisher_exact_test(&table, &TestOptions::default()).unwrap();
/// assert!((r.p_value - 0.034_965).abs() < 1e-6);
/// assert_eq!(r.odds_ratio, 20.0);
/// ```
pub fn fisher_exact_test(
    table: &ContingencyTable,
    options: &TestOptions,
) -> InferenceResult<FisherExactResult> {
    options.validate()?;
    let [a, b, c, d] = two_by_two(table, "Fisher's exact test")?;
    if table.grand_total() > FISHER_MAX_TOTAL {
        return Err(InferenceError::InvalidParameter {
            name: "grandTotal",
            value: table.grand_total(),
            reason: "too large to enumerate exactly",
        });
    }
    let mut margins = table.row_totals().iter().chain(table.col_totals());
    if margins.any(|&m| m == 0.0) {
        warn!("fisher exact: zero margin");
        return Err(InferenceError::DegenerateVariance(
            "a row or column total is zero",
        ));
    }

    let (row1, row2, col1) = (a + b, c + d, a + c);
    let n = row1 + row2;
    let ln_denominator = ln_choose(n, col1);
    let ln_probability =
        |x: f64| ln_choose(row1, x) + ln_choose(row2, col1 - x) - ln_denominator;
    let observed = ln_probability(a);
    let cutoff = observed + FISHER_RELATIVE_TOLERANCE.ln_1p();
    let lowest = (col1 - row2).max(0.0) as u64;
    let highest = row1.min(col1) as u64;
    let p_value = (lowest..=highest)
        .map(|x| ln_probability(x as f64))
        .filter(|&lp| lp <= cutoff)
        .map(f64::exp)
        .sum::<f64>()
        .min(1.0);

    let level = options.confidence_level;
    let odds_ratio = ratio(a * d, b * c);
    let or_se = [a, b, c, d]
        .iter()
        .all(|&v| v > 0.0)
        .then(|| (1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d).sqrt());
    let relative_risk = ratio(a / row1, c / row2);
    let rr_se =
        (a > 0.0 && c > 0.0).then(|| (1.0 / a - 1.0 / row1 + 1.0 / c - 1.0 / row2).sqrt());

    debug!(p_value, odds_ratio, relative_risk, "fisher exact test");
    Ok(FisherExactResult {
        p_value,
        odds_ratio,
        odds_ratio_ci: log_interval(level, odds_ratio, or_se),
        relative_risk,
        relative_risk_ci: log_interval(level, relative_risk, rr_se),
        observed: table.observed().to_vec(),
        significant: p_value < options.alpha,
    })
}

fn ln_choose(n: f64, k: f64) -> f64 {
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

fn ln_factorial(n: f64) -> f64 {
    special::ln_gamma(n + 1.0)
}

fn check_counts(values: &[f64], label: &str) -> InferenceResult<()> {
    match values.iter().position(|v| !v.is_finite() || *v < 0.0) {
        Some(i) => Err(InferenceError::MalformedTable(format!(
            "{label}[{i}] = {} is not a non-negative count",
            values[i]
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[f64]]) -> ContingencyTable {
        ContingencyTable::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn independence_reference() {
        // R: chisq.test(matrix(c(30,15,10,20,10,15), 2))
        let t = table(&[&[30.0, 10.0, 10.0], &[15.0, 20.0, 15.0]]);
        let r = chi_square_independence(&t, &TestOptions::default()).unwrap();
        assert!((r.chi_square - 9.333_333_333).abs() < 1e-8);
        assert_eq!(r.df, 2);
        assert!((r.p_value - 0.009_403_563).abs() < 1e-8);
        assert!((r.cramers_v - 0.305_505_046).abs() < 1e-8);
        assert_eq!(r.grand_total, 100.0);
        assert_eq!(r.expected[0], vec![22.5, 15.0, 12.5]);
        assert_eq!(r.effect_size_label, EffectSizeLabel::Medium);
        assert!(r.significant);
    }

    #[test]
    fn margins() {
        let t = table(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.row_totals(), &[3.0, 7.0, 11.0]);
        assert_eq!(t.col_totals(), &[9.0, 12.0]);
        assert_eq!(t.grand_total(), 21.0);
    }

    #[test]
    fn malformed_tables() {
        let ragged = ContingencyTable::new(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(ragged, Err(InferenceError::MalformedTable(_))));
        let negative = ContingencyTable::new(vec![vec![1.0, -2.0], vec![3.0, 4.0]]);
        assert!(matches!(negative, Err(InferenceError::MalformedTable(_))));
        let one_row = ContingencyTable::new(vec![vec![1.0, 2.0]]);
        assert!(matches!(one_row, Err(InferenceError::MalformedTable(_))));
        let one_col = ContingencyTable::new(vec![vec![1.0], vec![2.0]]);
        assert!(matches!(one_col, Err(InferenceError::MalformedTable(_))));
        let overflow = ContingencyTable::new(vec![vec![1e308, 1e308], vec![1e308, 1.0]]);
        assert!(matches!(overflow, Err(InferenceError::NumericalOverflow(_))));
    }

    #[test]
    fn zero_margin_is_degenerate() {
        let t = table(&[&[0.0, 0.0], &[3.0, 4.0]]);
        assert!(matches!(
            chi_square_independence(&t, &TestOptions::default()),
            Err(InferenceError::DegenerateVariance(_))
        ));
    }

    #[test]
    fn goodness_uniform() {
        let r = chi_square_goodness_of_fit(&[50.0, 30.0, 20.0], None, &TestOptions::default())
            .unwrap();
        // E = 33.33…: (16.67² + 3.33² + 13.33²) / 33.33 = 14
        assert!((r.chi_square - 14.0).abs() < 1e-12);
        assert!((r.p_value - (-7.0_f64).exp()).abs() < 1e-12);
        assert!((r.cohens_w - 0.14_f64.sqrt()).abs() < 1e-12);
        assert_eq!(r.total, 100.0);
    }

    #[test]
    fn goodness_with_proportions() {
        let counts = chi_square_goodness_of_fit(
            &[50.0, 30.0, 20.0],
            Some(&[40.0, 40.0, 20.0]),
            &TestOptions::default(),
        )
        .unwrap();
        let props = chi_square_goodness_of_fit(
            &[50.0, 30.0, 20.0],
            Some(&[0.4, 0.4, 0.2]),
            &TestOptions::default(),
        )
        .unwrap();
        // (10² + 10²) / 40 = 5
        assert!((counts.chi_square - 5.0).abs() < 1e-12);
        assert!((props.chi_square - counts.chi_square).abs() < 1e-12);
        assert!(!counts.significant);
    }

    #[test]
    fn goodness_expected_counts_are_rescaled_to_total() {
        let opts = TestOptions::default();
        let exact = chi_square_goodness_of_fit(&[50.0, 30.0, 20.0], Some(&[45.0, 35.0, 20.0]), &opts)
            .unwrap();
        for (e, want) in exact.expected.iter().zip([45.0, 35.0, 20.0]) {
            assert!((e - want).abs() < 1e-12);
        }

        // Sums to 200, not 100: halved before comparison.
        let doubled =
            chi_square_goodness_of_fit(&[50.0, 30.0, 20.0], Some(&[90.0, 70.0, 40.0]), &opts)
                .unwrap();
        for (a, b) in doubled.expected.iter().zip(&exact.expected) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((doubled.chi_square - exact.chi_square).abs() < 1e-12);
        assert!((doubled.expected.iter().sum::<f64>() - doubled.total).abs() < 1e-12);
    }

    #[test]
    fn goodness_errors() {
        let opts = TestOptions::default();
        assert!(matches!(
            chi_square_goodness_of_fit(&[5.0], None, &opts),
            Err(InferenceError::MalformedTable(_))
        ));
        assert!(matches!(
            chi_square_goodness_of_fit(&[5.0, 6.0], Some(&[1.0]), &opts),
            Err(InferenceError::MalformedTable(_))
        ));
        assert!(matches!(
            chi_square_goodness_of_fit(&[5.0, 6.0], Some(&[1.0, 0.0]), &opts),
            Err(InferenceError::DegenerateVariance(_))
        ));
        assert!(matches!(
            chi_square_goodness_of_fit(&[0.0, 0.0], None, &opts),
            Err(InferenceError::DegenerateVariance(_))
        ));
        assert!(matches!(
            chi_square_goodness_of_fit(&[1e308, 1e308], None, &opts),
            Err(InferenceError::NumericalOverflow(_))
        ));
    }

    #[test]
    fn mcnemar_small_discordant_uses_exact_binomial() {
        // R: binom.test(9, 12); mcnemar.test(matrix(c(40, 3, 9, 48), 2))
        let t = table(&[&[40.0, 9.0], &[3.0, 48.0]]);
        let r = mcnemar_test(&t, &TestOptions::default()).unwrap();
        assert_eq!(r.method, McNemarMethod::Exact);
        assert!((r.p_value - 0.145_996_094).abs() < 1e-8);
        assert!((r.chi_square - 2.083_333_333).abs() < 1e-8);
        assert_eq!(r.df, 1);
        assert_eq!((r.b, r.c, r.n), (9.0, 3.0, 100.0));
        assert!((r.proportion_changed - 0.12).abs() < 1e-15);
        assert!((r.odds_ratio - 3.0).abs() < 1e-15);
        assert!((r.odds_ratio_ci.lower - 0.812_182_372).abs() < 1e-6);
        assert!((r.odds_ratio_ci.upper - 11.081_255_033).abs() < 1e-5);
        assert!(!r.significant);
    }

    #[test]
    fn mcnemar_large_discordant_uses_chi_square() {
        let t = table(&[&[50.0, 25.0], &[10.0, 15.0]]);
        let corrected = mcnemar_test(&t, &TestOptions::default()).unwrap();
        assert_eq!(corrected.method, McNemarMethod::ChiSquare);
        assert!((corrected.chi_square - 5.6).abs() < 1e-12);
        assert!((corrected.p_value - 0.017_960_478).abs() < 1e-8);
        assert!(corrected.significant);

        let plain = mcnemar_test(&t, &TestOptions::default().with_continuity_correction(false))
            .unwrap();
        assert!((plain.chi_square - 6.428_571_429).abs() < 1e-8);
        assert!((plain.p_value - 0.011_229_887).abs() < 1e-8);
        assert!((plain.odds_ratio_ci.lower - 1.200_741_593).abs() < 1e-6);
        assert!((plain.odds_ratio_ci.upper - 5.205_116_603).abs() < 1e-6);
    }

    #[test]
    fn mcnemar_balanced_and_one_sided_changes() {
        let balanced = mcnemar_test(&table(&[&[10.0, 5.0], &[5.0, 10.0]]), &TestOptions::default())
            .unwrap();
        assert_eq!(balanced.p_value, 1.0);
        assert_eq!(balanced.chi_square, 0.0);

        let one_way = mcnemar_test(&table(&[&[10.0, 6.0], &[0.0, 10.0]]), &TestOptions::default())
            .unwrap();
        assert_eq!(one_way.odds_ratio, f64::INFINITY);
        assert_eq!(
            (one_way.odds_ratio_ci.lower, one_way.odds_ratio_ci.upper),
            (0.0, f64::INFINITY)
        );
        // 2 · ½⁶
        assert!((one_way.p_value - 0.031_25).abs() < 1e-10);
    }

    #[test]
    fn mcnemar_rejects_unusable_tables() {
        let opts = TestOptions::default();
        assert!(matches!(
            mcnemar_test(&table(&[&[10.0, 0.0], &[0.0, 12.0]]), &opts),
            Err(InferenceError::DegenerateVariance(_))
        ));
        assert!(matches!(
            mcnemar_test(&table(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]), &opts),
            Err(InferenceError::MalformedTable(_))
        ));
        assert!(matches!(
            mcnemar_test(&table(&[&[1.0, 2.5], &[4.0, 5.0]]), &opts),
            Err(InferenceError::MalformedTable(_))
        ));
    }

    #[test]
    fn fisher_reference_tables() {
        // R: fisher.test(matrix(c(3, 1, 1, 3), 2))
        let r = fisher_exact_test(&table(&[&[3.0, 1.0], &[1.0, 3.0]]), &TestOptions::default())
            .unwrap();
        assert!((r.p_value - 0.485_714_286).abs() < 1e-8);
        assert_eq!(r.odds_ratio, 9.0);
        assert!((r.odds_ratio_ci.lower - 0.366_636_932).abs() < 1e-6);
        assert!((r.odds_ratio_ci.upper - 220.927_006_929).abs() < 1e-4);
        assert!((r.relative_risk - 3.0).abs() < 1e-12);
        assert!((r.relative_risk_ci.lower - 0.501_284_309).abs() < 1e-6);
        assert!((r.relative_risk_ci.upper - 17.953_883_318).abs() < 1e-5);
        assert!(!r.significant);

        let r = fisher_exact_test(
            &table(&[&[12.0, 5.0], &[3.0, 10.0]]),
            &TestOptions::default(),
        )
        .unwrap();
        assert!((r.p_value - 0.025_327_687).abs() < 1e-8);
        assert_eq!(r.odds_ratio, 8.0);
        assert!((r.odds_ratio_ci.lower - 1.522_282_954).abs() < 1e-6);
        assert!((r.odds_ratio_ci.upper - 42.042_118_280).abs() < 1e-5);
        assert!((r.relative_risk - 3.058_823_529).abs() < 1e-8);
        assert!((r.relative_risk_ci.lower - 1.082_434_176).abs() < 1e-6);
        assert!((r.relative_risk_ci.upper - 8.643_852_526).abs() < 1e-5);
        assert!(r.significant);
    }

    #[test]
    fn fisher_zero_cell_gives_unbounded_interval() {
        let r = fisher_exact_test(&table(&[&[0.0, 5.0], &[6.0, 2.0]]), &TestOptions::default())
            .unwrap();
        assert!((r.p_value - 0.020_979_021).abs() < 1e-8);
        assert_eq!((r.odds_ratio, r.relative_risk), (0.0, 0.0));
        assert_eq!(
            (r.odds_ratio_ci.lower, r.odds_ratio_ci.upper),
            (0.0, f64::INFINITY)
        );
        assert_eq!(r.relative_risk_ci.upper, f64::INFINITY);
    }

    #[test]
    fn fisher_interval_follows_confidence_level() {
        let t = table(&[&[8.0, 2.0], &[1.0, 5.0]]);
        let r95 = fisher_exact_test(&t, &TestOptions::default()).unwrap();
        let r90 = fisher_exact_test(&t, &TestOptions::default().with_confidence_level(0.90))
            .unwrap();
        assert!((r95.p_value - 0.034_965_035).abs() < 1e-8);
        assert!((r95.odds_ratio_ci.lower - 1.416_185_139).abs() < 1e-6);
        assert_eq!(r90.odds_ratio_ci.level, 0.90);
        assert!(r90.odds_ratio_ci.lower > r95.odds_ratio_ci.lower);
        assert!(r90.odds_ratio_ci.upper < r95.odds_ratio_ci.upper);
    }

    #[test]
    fn fisher_rejects_unusable_tables() {
        let opts = TestOptions::default();
        assert!(matches!(
            fisher_exact_test(&table(&[&[1e8, 2.0], &[3.0, 4.0]]), &opts),
            Err(InferenceError::InvalidParameter { name: "grandTotal", .. })
        ));
        assert!(matches!(
            fisher_exact_test(&table(&[&[0.0, 0.0], &[3.0, 4.0]]), &opts),
            Err(InferenceError::DegenerateVariance(_))
        ));
        assert!(matches!(
            fisher_exact_test(&table(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]), &opts),
            Err(InferenceError::MalformedTable(_))
        ));
    }
}
