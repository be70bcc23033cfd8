//! # u-inference
//!
//! Statistical inference: parametric and rank-based hypothesis tests,
//! correlation, categorical association tests, effect sizes, assumption diagnostics,
//! power analysis, and APA-style reporting.
//!
//! Every test is a pure function from raw `f64` samples (or a contingency
//! table) to an immutable result value. Inputs are validated before any
//! numeric work, so a call either returns a complete result or an
//! [`InferenceError`].
//!
//! ## Modules
//!
//! - [`distribution`]: Two-tailed p-values and non-central χ²/F tails over `u_numflow::special`
//! - [`descriptive`]: One-sample summary statistics with a CI of the mean
//! - [`rank`]: Average ranks and tie terms shared by the rank tests
//! - [`parametric`]: Welch, paired and one-sample t-tests; one-way and repeated-measures ANOVA
//! - [`nonparametric`]: Mann–Whitney U, Kruskal–Wallis H with Dunn post-hoc, Wilcoxon signed-rank, Friedman
//! - [`correlation`]: Pearson and Spearman correlation with Fisher z intervals
//! - [`categorical`]: χ² independence and goodness-of-fit, McNemar, Fisher's exact test
//! - [`assumptions`]: Shapiro–Wilk, Levene (Brown–Forsythe), recommendations
//! - [`power`]: Sample-size and power computation
//! - [`format`]: APA reporting strings
//!
//! ## Example
//!
//! ```
//! use u_inference::{welch_t_test, format_result_as_apa, TestOptions, TestResult};
//!
//! let a = [85.0, 90.0, 78.0, 92.0, 88.0, 95.0, 82.0, 91.0, 87.0, 93.0, 86.0, 89.0, 94.0, 80.0, 91.0];
//! let b = [78.0, 82.0, 75.0, 80.0, 77.0, 83.0, 79.0, 81.0, 76.0, 84.0, 73.0, 80.0, 82.0, 77.0, 79.0];
//! let r = welch_t_test(&a, &b, &TestOptions::default()).unwrap();
//! assert!(r.significant);
//! let report = format_result_as_apa(&TestResult::from(r));
//! assert_eq!(report, "t(23.15) = 5.85, p < .001, d = 2.13, 95% CI [5.82, 12.18]");
//! ```
//!
//! ## Design Philosophy
//!
//! - **Stateless**: no caches or global state; calls are safe to run in parallel
//! - **Numerical stability**: leverages `u-numflow` for stable statistics
//! - **Research-backed**: all algorithms reference academic literature

pub mod assumptions;
pub mod categorical;
pub mod config;
pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod error;
pub mod format;
pub mod nonparametric;
pub mod parametric;
pub mod posthoc;
pub mod power;
pub mod rank;
pub mod result;
mod validation;

pub use assumptions::{check_assumptions, AssumptionTarget, DiagnosticsResult};
pub use categorical::{
    chi_square_goodness_of_fit, chi_square_independence, fisher_exact_test, mcnemar_test,
    ContingencyTable, McNemarMethod,
};
pub use config::{Locale, TestOptions};
pub use correlation::{pearson_correlation, spearman_correlation, CorrelationMethod};
pub use descriptive::{describe, DescriptiveStatistics};
pub use error::{InferenceError, InferenceResult};
pub use format::format_result_as_apa;
pub use nonparametric::{
    friedman_test, kruskal_wallis_test, mann_whitney_u_test, wilcoxon_signed_rank_test,
};
pub use parametric::{
    one_sample_t_test, one_way_anova, paired_t_test, repeated_measures_anova, welch_t_test,
};
pub use power::{compute_sample_size, power_at, PowerResult, PowerSpec, PowerTestType};
pub use result::{EffectSizeLabel, GroupStatistic, PostHocComparison, TestResult};
