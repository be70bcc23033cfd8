//! Rank-based tests.
//!
//! All tests rank through [`crate::rank`] and share its tie correction.
//!
//! - [`mann_whitney_u_test`]: two independent samples
//! - [`kruskal_wallis_test`]: k ≥ 2 independent samples, with Dunn's post-hoc
//! - [`wilcoxon_signed_rank_test`]: paired samples
//! - [`friedman_test`]: k ≥ 3 related samples, ranked within subjects
//!
//! # References
//!
//! - Hollander, M., Wolfe, D.A. & Chicken, E. (2014). *Nonparametric
//!   Statistical Methods*, 3rd ed.

mod friedman;
mod kruskal_wallis;
mod mann_whitney;
mod wilcoxon;

pub use friedman::{friedman_test, FriedmanResult, MIN_FRIEDMAN_SUBJECTS};
pub use kruskal_wallis::{kruskal_wallis_test, KruskalWallisResult};
pub use mann_whitney::{mann_whitney_u_test, MannWhitneyResult};
pub use wilcoxon::{wilcoxon_signed_rank_test, WilcoxonResult};

/// Shrinks `deviation` toward zero by ½, stopping at zero.
fn continuity_corrected(deviation: f64) -> f64 {
    deviation.signum() * (deviation.abs() - 0.5).max(0.0)
}
