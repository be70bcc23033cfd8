//! Result types shared across test families.
//!
//! [`TestResult`] is the closed set of outcomes a calculator can produce.
//! Each variant wraps the family's own result struct; consumers match on it
//! exhaustively, and it serializes with a `"type"` tag.

use serde::{Deserialize, Serialize};

use crate::categorical::{
    ChiSquareGoodnessResult, ChiSquareIndependenceResult, FisherExactResult, McNemarResult,
};
use crate::correlation::CorrelationResult;
use crate::nonparametric::{
    FriedmanResult, KruskalWallisResult, MannWhitneyResult, WilcoxonResult,
};
use crate::parametric::{AnovaResult, RepeatedMeasuresResult, TTestResult};
use crate::power::PowerResult;

/// Read-only snapshot of one group, recomputed from its sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStatistic {
    pub name: String,
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator).
    pub sd: f64,
    pub median: f64,
    /// Mean rank in the pooled sample; set by rank-based tests only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_rank: Option<f64>,
}

/// Two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    /// Coverage, e.g. 0.95.
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// `center ± critical · se`.
    pub(crate) fn symmetric(level: f64, center: f64, critical: f64, se: f64) -> Self {
        Self {
            level,
            lower: center - critical * se,
            upper: center + critical * se,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// One pairwise comparison from a post-hoc procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostHocComparison {
    pub group1: String,
    pub group2: String,
    /// t (ANOVA) or z (Dunn).
    pub statistic: f64,
    /// Mean of group1 minus mean of group2 (ANOVA only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_difference: Option<f64>,
    /// Unadjusted two-tailed p-value.
    pub raw_p_value: f64,
    /// Bonferroni-adjusted p-value, min(1, p · m).
    pub p_value: f64,
    /// Adjusted p-value below alpha.
    pub significant: bool,
}

/// Conventional magnitude of an effect size (Cohen, 1988).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSizeLabel {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSizeLabel {
    /// Cohen's d and h: .2 / .5 / .8.
    pub fn for_cohens_d(d: f64) -> Self {
        Self::classify(d.abs(), [0.2, 0.5, 0.8])
    }

    /// r, Cramér's V and Cohen's w: .1 / .3 / .5.
    pub fn for_correlation(r: f64) -> Self {
        Self::classify(r.abs(), [0.1, 0.3, 0.5])
    }

    /// η² and η²H: .01 / .06 / .14.
    pub fn for_eta_squared(eta_squared: f64) -> Self {
        Self::classify(eta_squared, [0.01, 0.06, 0.14])
    }

    /// Cohen's f: .10 / .25 / .40.
    pub fn for_cohens_f(f: f64) -> Self {
        Self::classify(f.abs(), [0.10, 0.25, 0.40])
    }

    fn classify(value: f64, [small, medium, large]: [f64; 3]) -> Self {
        if value >= large {
            Self::Large
        } else if value >= medium {
            Self::Medium
        } else if value >= small {
            Self::Small
        } else {
            Self::Negligible
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl std::fmt::Display for EffectSizeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of any test family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TestResult {
    TTest(TTestResult),
    Anova(AnovaResult),
    ChiSquareIndependence(ChiSquareIndependenceResult),
    ChiSquareGoodness(ChiSquareGoodnessResult),
    MannWhitney(MannWhitneyResult),
    KruskalWallis(KruskalWallisResult),
    Wilcoxon(WilcoxonResult),
    Friedman(FriedmanResult),
    RepeatedMeasuresAnova(RepeatedMeasuresResult),
    Correlation(CorrelationResult),
    #[serde(rename = "mcnemar")]
    McNemar(McNemarResult),
    FisherExact(FisherExactResult),
    SampleSize(PowerResult),
}

impl TestResult {
    /// p-value of the omnibus test (Greenhouse–Geisser corrected when
    /// applied); `None` for sample-size results.
    pub fn p_value(&self) -> Option<f64> {
        match self {
            Self::TTest(r) => Some(r.p_value),
            Self::Anova(r) => Some(r.p_value),
            Self::ChiSquareIndependence(r) => Some(r.p_value),
            Self::ChiSquareGoodness(r) => Some(r.p_value),
            Self::MannWhitney(r) => Some(r.p_value),
            Self::KruskalWallis(r) => Some(r.p_value),
            Self::Wilcoxon(r) => Some(r.p_value),
            Self::Friedman(r) => Some(r.p_value),
            Self::RepeatedMeasuresAnova(r) => Some(r.reported_p_value()),
            Self::Correlation(r) => Some(r.p_value),
            Self::McNemar(r) => Some(r.p_value),
            Self::FisherExact(r) => Some(r.p_value),
            Self::SampleSize(_) => None,
        }
    }

    /// Whether the omnibus test rejected H₀ at the configured alpha.
    pub fn is_significant(&self) -> bool {
        match self {
            Self::TTest(r) => r.significant,
            Self::Anova(r) => r.significant,
            Self::ChiSquareIndependence(r) => r.significant,
            Self::ChiSquareGoodness(r) => r.significant,
            Self::MannWhitney(r) => r.significant,
            Self::KruskalWallis(r) => r.significant,
            Self::Wilcoxon(r) => r.significant,
            Self::Friedman(r) => r.significant,
            Self::RepeatedMeasuresAnova(r) => r.significant,
            Self::Correlation(r) => r.significant,
            Self::McNemar(r) => r.significant,
            Self::FisherExact(r) => r.significant,
            Self::SampleSize(_) => false,
        }
    }

    /// Short APA-style report; see [`crate::format::format_result_as_apa`].
    pub fn to_apa(&self) -> String {
        crate::format::format_result_as_apa(self)
    }
}

macro_rules! impl_from_result {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for TestResult {
                fn from(r: $ty) -> Self {
                    Self::$variant(r)
                }
            }
        )*
    };
}

impl_from_result!(
    TTest(TTestResult),
    Anova(AnovaResult),
    ChiSquareIndependence(ChiSquareIndependenceResult),
    ChiSquareGoodness(ChiSquareGoodnessResult),
    MannWhitney(MannWhitneyResult),
    KruskalWallis(KruskalWallisResult),
    Wilcoxon(WilcoxonResult),
    Friedman(FriedmanResult),
    RepeatedMeasuresAnova(RepeatedMeasuresResult),
    Correlation(CorrelationResult),
    McNemar(McNemarResult),
    FisherExact(FisherExactResult),
    SampleSize(PowerResult),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_size_thresholds() {
        assert_eq!(EffectSizeLabel::for_cohens_d(0.1), EffectSizeLabel::Negligible);
        assert_eq!(EffectSizeLabel::for_cohens_d(-0.5), EffectSizeLabel::Medium);
        assert_eq!(EffectSizeLabel::for_cohens_d(2.13), EffectSizeLabel::Large);
        assert_eq!(EffectSizeLabel::for_correlation(0.31), EffectSizeLabel::Medium);
        assert_eq!(EffectSizeLabel::for_eta_squared(0.05), EffectSizeLabel::Small);
        assert_eq!(EffectSizeLabel::for_cohens_f(0.25), EffectSizeLabel::Medium);
        assert_eq!(EffectSizeLabel::Large.to_string(), "large");
    }

    #[test]
    fn confidence_interval_contains() {
        let ci = ConfidenceInterval::symmetric(0.95, 10.0, 2.0, 1.5);
        assert_eq!((ci.lower, ci.upper), (7.0, 13.0));
        assert!(ci.contains(10.0));
        assert!(!ci.contains(13.5));
    }

    #[test]
    fn corrected_p_value_is_reported() {
        let a = [7.0, 9.9, 8.5, 5.1, 10.3, 8.0];
        let b = [5.3, 5.7, 4.7, 3.5, 7.7, 8.0];
        let c = [4.9, 7.6, 5.5, 2.8, 8.4, 6.1];
        let r = crate::parametric::repeated_measures_anova(
            &[&a, &b, &c],
            &crate::TestOptions::default(),
        )
        .expect("valid design");
        let corrected = r.correction.expect("sphericity violated").p_value;
        let result = TestResult::from(r);
        assert_eq!(result.p_value(), Some(corrected));
        assert!(result.is_significant());
    }

    #[test]
    fn tags_new_families_in_kebab_case() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let r = crate::correlation::pearson_correlation(&x, &y, &crate::TestOptions::default())
            .expect("valid pairs");
        let json = serde_json::to_string(&TestResult::from(r)).expect("serializes");
        assert!(json.contains(r#""type":"correlation""#), "{json}");
        assert!(json.contains(r#""method":"pearson""#), "{json}");
        let back: TestResult = serde_json::from_str(&json).expect("deserializes");
        assert!(matches!(back, TestResult::Correlation(_)));
    }

    #[test]
    fn group_statistic_omits_missing_mean_rank() {
        let g = GroupStatistic {
            name: "A".into(),
            n: 3,
            mean: 2.0,
            sd: 1.0,
            median: 2.0,
            mean_rank: None,
        };
        let json = serde_json::to_string(&g).expect("serializes");
        assert!(!json.contains("meanRank"));
        let back: GroupStatistic = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, g);
    }
}
