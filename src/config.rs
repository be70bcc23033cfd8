//! Options shared by every test.
//!
//! [`TestOptions`] is plain data: it deserializes from any serde format
//! with missing fields falling back to the conventional defaults
//! (α = .05, 95% confidence intervals, continuity correction on).

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InferenceResult};

/// Significance level used when none is configured.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Confidence level used when none is configured.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Per-call options for the hypothesis tests.
///
/// # Examples
///
/// ```
/// use u_inference::TestOptions;
///
/// let opts = TestOptions::default()
///     .with_alpha(0.01)
///     .with_group_names(["Control", "Treatment"]);
/// assert_eq!(opts.alpha, 0.01);
/// assert_eq!(opts.group_name(1), "Treatment");
/// assert_eq!(opts.group_name(2), "Group 3");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestOptions {
    /// Significance level; a result is significant when p < alpha.
    pub alpha: f64,
    /// Coverage of reported confidence intervals.
    pub confidence_level: f64,
    /// Display names for groups, in input order.
    pub group_names: Option<Vec<String>>,
    /// Apply the ±0.5 continuity correction to rank-test z statistics.
    pub continuity_correction: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            group_names: None,
            continuity_correction: true,
        }
    }
}

impl TestOptions {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_group_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_continuity_correction(mut self, enabled: bool) -> Self {
        self.continuity_correction = enabled;
        self
    }

    /// Checks alpha and confidence level lie in the open interval (0, 1).
    pub fn validate(&self) -> InferenceResult<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(InferenceError::InvalidParameter {
                name: "alpha",
                value: self.alpha,
                reason: "must lie in (0, 1)",
            });
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(InferenceError::InvalidParameter {
                name: "confidenceLevel",
                value: self.confidence_level,
                reason: "must lie in (0, 1)",
            });
        }
        Ok(())
    }

    /// Name of the group at `index`, falling back to "Group {index + 1}".
    pub fn group_name(&self, index: usize) -> String {
        self.group_names
            .as_ref()
            .and_then(|names| names.get(index))
            .cloned()
            .unwrap_or_else(|| format!("Group {}", index + 1))
    }
}

/// Language of human-readable recommendation text.
///
/// Numbers are never affected by the locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}
