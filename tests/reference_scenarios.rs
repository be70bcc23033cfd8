//! End-to-end scenarios checked against R.
//!
//! Reference commands are quoted above each block; tolerances are well
//! inside the 4-decimal agreement the reports rely on.

use approx::assert_abs_diff_eq;
use u_inference::{
    check_assumptions, chi_square_independence, compute_sample_size, fisher_exact_test,
    format_result_as_apa, friedman_test, kruskal_wallis_test, mann_whitney_u_test,
    mcnemar_test, one_way_anova, repeated_measures_anova, spearman_correlation, welch_t_test,
    AssumptionTarget, ContingencyTable, EffectSizeLabel, InferenceError, Locale, PowerSpec,
    PowerTestType, TestOptions, TestResult,
};

const T_GROUP_A: [f64; 15] = [
    85.0, 90.0, 78.0, 92.0, 88.0, 95.0, 82.0, 91.0, 87.0, 93.0, 86.0, 89.0, 94.0, 80.0, 91.0,
];
const T_GROUP_B: [f64; 15] = [
    78.0, 82.0, 75.0, 80.0, 77.0, 83.0, 79.0, 81.0, 76.0, 84.0, 73.0, 80.0, 82.0, 77.0, 79.0,
];

const KW_G1: [f64; 7] = [12.0, 15.0, 18.0, 14.0, 16.0, 13.0, 17.0];
const KW_G2: [f64; 7] = [22.0, 25.0, 20.0, 28.0, 24.0, 26.0, 21.0];
const KW_G3: [f64; 7] = [8.0, 11.0, 9.0, 13.0, 10.0, 7.0, 12.0];

const MW_G1: [f64; 8] = [85.0, 72.0, 91.0, 68.0, 77.0, 95.0, 83.0, 89.0];
const MW_G2: [f64; 8] = [65.0, 78.0, 71.0, 62.0, 73.0, 69.0, 75.0, 67.0];

const RM_WEEK1: [f64; 6] = [45.0, 42.0, 36.0, 39.0, 51.0, 44.0];
const RM_WEEK2: [f64; 6] = [50.0, 42.0, 41.0, 35.0, 55.0, 49.0];
const RM_WEEK3: [f64; 6] = [55.0, 45.0, 43.0, 40.0, 59.0, 56.0];

fn paired_table() -> ContingencyTable {
    ContingencyTable::new(vec![vec![40.0, 9.0], vec![3.0, 48.0]]).unwrap()
}

fn table() -> ContingencyTable {
    ContingencyTable::new(vec![vec![30.0, 10.0, 10.0], vec![15.0, 20.0, 15.0]]).unwrap()
}

#[test]
fn welch_t_test_scenario() {
    // t.test(a, b)
    let r = welch_t_test(&T_GROUP_A, &T_GROUP_B, &TestOptions::default()).unwrap();
    assert_abs_diff_eq!(r.t, 5.845_149_610, epsilon = 1e-6);
    assert_abs_diff_eq!(r.df, 23.145_817_335, epsilon = 1e-6);
    assert_abs_diff_eq!(r.p_value, 5.744_125e-6, epsilon = 1e-9);
    assert_abs_diff_eq!(r.cohens_d, 2.134_346_862, epsilon = 1e-6);
    assert_abs_diff_eq!(r.confidence_interval.lower, 5.815_918_896, epsilon = 1e-6);
    assert_abs_diff_eq!(r.confidence_interval.upper, 12.184_081_104, epsilon = 1e-6);
    assert_eq!(r.effect_size_label, EffectSizeLabel::Large);
    assert_eq!(
        format_result_as_apa(&r.into()),
        "t(23.15) = 5.85, p < .001, d = 2.13, 95% CI [5.82, 12.18]"
    );
}

#[test]
fn chi_square_independence_scenario() {
    // chisq.test(matrix(c(30, 15, 10, 20, 10, 15), nrow = 2))
    let r = chi_square_independence(&table(), &TestOptions::default()).unwrap();
    assert_abs_diff_eq!(r.chi_square, 9.333_333_333, epsilon = 1e-8);
    assert_eq!(r.df, 2);
    assert_abs_diff_eq!(r.p_value, 0.009_403_563, epsilon = 1e-8);
    assert_abs_diff_eq!(r.cramers_v, 0.305_505_046, epsilon = 1e-8);
    for (row, total) in r.expected.iter().zip(&r.row_totals) {
        assert_abs_diff_eq!(row.iter().sum::<f64>(), *total, epsilon = 1e-12);
    }
    assert_eq!(
        format_result_as_apa(&r.into()),
        "χ²(2, N = 100) = 9.33, p = .009, V = .31"
    );
}

#[test]
fn kruskal_wallis_scenario() {
    // kruskal.test(list(g1, g2, g3))
    let r = kruskal_wallis_test(&[&KW_G1, &KW_G2, &KW_G3], &TestOptions::default()).unwrap();
    assert_abs_diff_eq!(r.h_statistic, 17.142_857_143, epsilon = 1e-8);
    assert_eq!(r.df, 2);
    assert_abs_diff_eq!(r.p_value, 1.894_418e-4, epsilon = 1e-9);
    assert_abs_diff_eq!(r.eta_squared_h, 0.841_269_841, epsilon = 1e-8);
    assert_eq!(r.post_hoc.len(), 3);
    assert_eq!(
        format_result_as_apa(&r.into()),
        "H(2) = 17.14, p < .001, η²H = 0.84"
    );
}

#[test]
fn mann_whitney_scenario() {
    // wilcox.test(g1, g2, exact = FALSE, correct = TRUE)
    let r = mann_whitney_u_test(&MW_G1, &MW_G2, &TestOptions::default()).unwrap();
    assert_eq!(r.u, 9.0);
    assert_eq!(r.u1 + r.u2, 64.0);
    assert_abs_diff_eq!(r.z, -2.362_972_642, epsilon = 1e-8);
    assert_abs_diff_eq!(r.p_value, 0.018_129_008, epsilon = 1e-8);
    assert_abs_diff_eq!(r.rank_biserial_r, 0.718_75, epsilon = 1e-12);
    assert_eq!(
        format_result_as_apa(&r.into()),
        "U = 9.00, z = -2.36, p = .018, r = .72"
    );
}

#[test]
fn sample_size_scenario() {
    let r = compute_sample_size(&PowerSpec::new(PowerTestType::TwoSampleT, 0.5)).unwrap();
    assert_eq!(r.n_total, 128);
    assert_eq!(r.n_per_group, 64);
    assert!(r.achieved_power >= 0.80);
    assert_eq!(r.effect_size_label, EffectSizeLabel::Medium);
}

#[test]
fn swapping_groups_mirrors_statistics() {
    let opts = TestOptions::default();
    let ab = welch_t_test(&T_GROUP_A, &T_GROUP_B, &opts).unwrap();
    let ba = welch_t_test(&T_GROUP_B, &T_GROUP_A, &opts).unwrap();
    assert_abs_diff_eq!(ab.t, -ba.t, epsilon = 1e-12);
    assert_abs_diff_eq!(ab.p_value, ba.p_value, epsilon = 1e-15);

    let ab = mann_whitney_u_test(&MW_G1, &MW_G2, &opts).unwrap();
    let ba = mann_whitney_u_test(&MW_G2, &MW_G1, &opts).unwrap();
    assert_abs_diff_eq!(ab.z, -ba.z, epsilon = 1e-12);
    assert_abs_diff_eq!(ab.rank_biserial_r, -ba.rank_biserial_r, epsilon = 1e-12);
    assert_abs_diff_eq!(ab.p_value, ba.p_value, epsilon = 1e-15);
}

#[test]
fn two_group_anova_matches_t_squared() {
    // With equal group sizes Welch's t coincides with Student's t.
    let opts = TestOptions::default();
    let anova = one_way_anova(&[&MW_G1, &MW_G2], &opts).unwrap();
    let t = welch_t_test(&MW_G1, &MW_G2, &opts).unwrap().t;
    assert_abs_diff_eq!(anova.f_statistic, t * t, epsilon = 1e-9);
}

#[test]
fn repeated_calls_are_bit_identical() {
    let opts = TestOptions::default();
    let first = kruskal_wallis_test(&[&KW_G1, &KW_G2, &KW_G3], &opts).unwrap();
    let second = kruskal_wallis_test(&[&KW_G1, &KW_G2, &KW_G3], &opts).unwrap();
    assert_eq!(first, second);
}

#[test]
fn results_serialize_with_type_tag() {
    let opts = TestOptions::default();
    let cases: Vec<(TestResult, &str)> = vec![
        (welch_t_test(&T_GROUP_A, &T_GROUP_B, &opts).unwrap().into(), "t-test"),
        (
            chi_square_independence(&table(), &opts).unwrap().into(),
            "chi-square-independence",
        ),
        (
            kruskal_wallis_test(&[&KW_G1, &KW_G2, &KW_G3], &opts).unwrap().into(),
            "kruskal-wallis",
        ),
        (mann_whitney_u_test(&MW_G1, &MW_G2, &opts).unwrap().into(), "mann-whitney"),
        (
            friedman_test(&[&RM_WEEK1, &RM_WEEK2, &RM_WEEK3], &opts).unwrap().into(),
            "friedman",
        ),
        (
            repeated_measures_anova(&[&RM_WEEK1, &RM_WEEK2, &RM_WEEK3], &opts)
                .unwrap()
                .into(),
            "repeated-measures-anova",
        ),
        (
            spearman_correlation(&MW_G1, &MW_G2, &opts).unwrap().into(),
            "correlation",
        ),
        (mcnemar_test(&paired_table(), &opts).unwrap().into(), "mcnemar"),
        (fisher_exact_test(&paired_table(), &opts).unwrap().into(), "fisher-exact"),
        (
            compute_sample_size(&PowerSpec::new(PowerTestType::TwoSampleT, 0.5))
                .unwrap()
                .into(),
            "sample-size",
        ),
    ];

    for (result, tag) in cases {
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], tag);

        let back: TestResult = serde_json::from_value(value).unwrap();
        assert_eq!(format_result_as_apa(&back), format_result_as_apa(&result));
        match (back.p_value(), result.p_value()) {
            (Some(a), Some(b)) => assert_abs_diff_eq!(a, b, epsilon = 1e-15),
            (None, None) => {}
            other => panic!("p-value presence changed: {other:?}"),
        }
    }
}

#[test]
fn within_subject_designs_agree() {
    // ez::ezANOVA and friedman.test on the same three weekly scores
    let opts = TestOptions::default().with_group_names(["week 1", "week 2", "week 3"]);
    let conditions = [&RM_WEEK1[..], &RM_WEEK2[..], &RM_WEEK3[..]];

    let rm = repeated_measures_anova(&conditions, &opts).unwrap();
    assert_abs_diff_eq!(rm.f_statistic, 12.533_980_583, epsilon = 1e-8);
    assert!(!rm.sphericity.violated);
    assert_eq!(
        format_result_as_apa(&rm.clone().into()),
        "F(2, 10) = 12.53, p = .002, η²p = 0.71"
    );
    assert_eq!(rm.post_hoc[1].group1, "week 1");
    assert_eq!(rm.post_hoc[1].group2, "week 3");

    let fr = friedman_test(&conditions, &opts).unwrap();
    assert!(fr.significant);
    assert_eq!(fr.conditions[2].mean_rank, Some(3.0));
}

#[test]
fn public_field_names_are_camel_case() {
    let r = chi_square_independence(&table(), &TestOptions::default()).unwrap();
    let value = serde_json::to_value(TestResult::from(r)).unwrap();
    for key in ["pValue", "cramersV", "rowTotals", "grandTotal", "effectSizeLabel"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }

    let r = compute_sample_size(&PowerSpec::new(PowerTestType::TwoSampleT, 0.5)).unwrap();
    let value = serde_json::to_value(TestResult::from(r)).unwrap();
    assert_eq!(value["nTotal"], 128);
    assert_eq!(value["nPerGroup"], 64);
    assert_eq!(value["testType"], "two-sample-t");
    assert!(value.get("achievedPower").is_some());
}

#[test]
fn diagnostics_never_block_the_test() {
    let skewed = [1.0, 1.1, 1.2, 1.3, 1.5, 1.8, 2.5, 4.0, 8.0, 15.0, 30.0, 60.0];
    let other = [2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0];
    let d = check_assumptions(AssumptionTarget::TTest, &[&skewed, &other], Locale::En);
    assert!(!d.all_met());
    assert_eq!(
        d.recommendations[0],
        "Normality violated: Consider Mann-Whitney U test."
    );
    assert!(welch_t_test(&skewed, &other, &TestOptions::default()).is_ok());
}

#[test]
fn errors_surface_before_computation() {
    let opts = TestOptions::default();
    assert!(matches!(
        welch_t_test(&[1.0], &[2.0, 3.0], &opts),
        Err(InferenceError::InsufficientData { .. })
    ));
    assert!(matches!(
        ContingencyTable::new(vec![vec![1.0, 2.0], vec![3.0]]),
        Err(InferenceError::MalformedTable(_))
    ));
    assert!(matches!(
        compute_sample_size(&PowerSpec::new(PowerTestType::TwoSampleT, 0.5).with_alpha(1.5)),
        Err(InferenceError::InvalidParameter { name: "alpha", .. })
    ));
}
