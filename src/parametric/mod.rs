//! Parametric mean-comparison tests.
//!
//! - [`welch_t_test`]: two independent samples, unequal variances
//! - [`paired_t_test`]: difference series of two matched samples
//! - [`one_sample_t_test`]: one sample against a hypothesized mean
//! - [`one_way_anova`]: k ≥ 2 groups, with Bonferroni post-hoc comparisons
//! - [`repeated_measures_anova`]: k ≥ 2 conditions measured on the same
//!   subjects, with Mauchly's test and the Greenhouse–Geisser correction
//!
//! # References
//!
//! - Welch, B.L. (1947). *Biometrika* 34(1–2), pp. 28–35.
//! - Cohen, J. (1988). *Statistical Power Analysis for the Behavioral
//!   Sciences*, 2nd ed.

mod anova;
mod repeated_measures;

pub(crate) use anova::one_way_table;
pub use anova::{one_way_anova, AnovaResult};
pub use repeated_measures::{
    repeated_measures_anova, GreenhouseGeisser, RepeatedMeasuresResult, SphericityResult,
    MIN_REPEATED_SUBJECTS,
};
pub use t_test::{one_sample_t_test, paired_t_test, welch_t_test, TTestDesign, TTestResult};
