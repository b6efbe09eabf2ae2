//! Property-based tests for the tolerance interval formulas.
//!
//! Covers:
//! 1. Bounds bracket the mean
//! 2. Monotonicity in coverage and in sample size
//! 3. Raw data and summary statistics agree
//! 4. Coverage factor presence follows the limits

use proptest::prelude::*;
use tolerance_engine::{
    IntervalParameters, SampleSpecification, Sidedness, SpecificationLimits, ToleranceError,
    ToleranceIntervalEngine, ToleranceRequest,
};

fn engine() -> ToleranceIntervalEngine {
    ToleranceIntervalEngine::new()
}

fn two_sided_k(n: usize, alpha: f64, p: f64) -> f64 {
    engine()
        .compute_two_sided(
            &SampleSpecification::summary(0.0, 1.0, n),
            alpha,
            p,
            &SpecificationLimits::none(),
        )
        .unwrap()
        .k()
}

fn one_sided_k(n: usize, alpha: f64, p: f64) -> f64 {
    engine()
        .compute_one_sided(
            &SampleSpecification::summary(0.0, 1.0, n),
            alpha,
            p,
            Sidedness::OneSidedUpper,
            None,
        )
        .unwrap()
        .k()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_two_sided_bounds_bracket_mean(
        data in prop::collection::vec(-1000.0f64..1000.0, 2..60),
        alpha in 0.01f64..0.10,
        p in 0.01f64..0.99,
    ) {
        let sample = SampleSpecification::raw(data);
        let stats = sample.statistics().unwrap();
        prop_assume!(stats.sd > 1e-9);

        let result = engine()
            .compute_two_sided(&sample, alpha, p, &SpecificationLimits::none())
            .unwrap();

        prop_assert!(result.k() >= 0.0);
        prop_assert!(result.lower.unwrap() <= stats.mean);
        prop_assert!(stats.mean <= result.upper.unwrap());
        prop_assert!(result.k_res.is_none());
    }

    #[test]
    fn prop_width_grows_with_coverage(
        n in 3usize..200,
        alpha in 0.01f64..0.10,
        p in 0.05f64..0.90,
        dp in 0.01f64..0.09,
    ) {
        let sample = SampleSpecification::summary(5.0, 1.5, n);
        let none = SpecificationLimits::none();
        let narrow = engine().compute_two_sided(&sample, alpha, p, &none).unwrap();
        let wide = engine().compute_two_sided(&sample, alpha, p + dp, &none).unwrap();
        prop_assert!(wide.width().unwrap() >= narrow.width().unwrap());
    }

    #[test]
    fn prop_one_sided_distance_grows_with_coverage(
        n in 10usize..200,
        alpha in 0.01f64..0.10,
        p in 0.50f64..0.90,
        dp in 0.01f64..0.09,
    ) {
        let low = one_sided_k(n, alpha, p);
        let high = one_sided_k(n, alpha, p + dp);
        prop_assert!(high >= low);
    }

    #[test]
    fn prop_raw_and_summary_paths_agree(
        data in prop::collection::vec(0.0f64..50.0, 5..40),
        alpha in 0.01f64..0.10,
        p in 0.50f64..0.99,
        side in prop_oneof![
            Just(Sidedness::TwoSided),
            Just(Sidedness::OneSidedUpper),
            Just(Sidedness::OneSidedLower),
        ],
    ) {
        let raw = SampleSpecification::raw(data);
        let stats = raw.statistics().unwrap();
        prop_assume!(stats.sd > 1e-9);
        let summary = SampleSpecification::summary(stats.mean, stats.sd, stats.n);
        let params = IntervalParameters::new(alpha, p, side);

        let from_raw = engine().compute(&ToleranceRequest::new(raw, params));
        let from_summary = engine().compute(&ToleranceRequest::new(summary, params));

        match (from_raw, from_summary) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.statistics, b.statistics);
                prop_assert_eq!(a.factors, b.factors);
                prop_assert_eq!(a.upper, b.upper);
                prop_assert_eq!(a.lower, b.lower);
                prop_assert_eq!(a.k_res, b.k_res);
                prop_assert_eq!(a.statement, b.statement);
                prop_assert_eq!(a.summary_table, b.summary_table);
                // Only raw data has a histogram to show
                prop_assert!(a.plot.histogram.is_some());
                prop_assert!(b.plot.histogram.is_none());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "paths disagree: {:?} vs {:?}", a.is_ok(), b.is_ok()),
        }
    }

    #[test]
    fn prop_coverage_factor_iff_limits(
        mean in -10.0f64..10.0,
        sd in 0.1f64..5.0,
        n in 10usize..100,
        lower in prop::option::of(-50.0f64..-20.0),
        upper in prop::option::of(20.0f64..50.0),
        side in prop_oneof![
            Just(Sidedness::TwoSided),
            Just(Sidedness::OneSidedUpper),
            Just(Sidedness::OneSidedLower),
        ],
    ) {
        let limits = SpecificationLimits { lower, upper };
        let request = ToleranceRequest::new(
            SampleSpecification::summary(mean, sd, n),
            IntervalParameters::new(0.05, 0.95, side),
        )
        .with_limits(limits);
        let result = engine().compute(&request).unwrap();

        let applicable = match side {
            Sidedness::TwoSided => lower.is_some() && upper.is_some(),
            Sidedness::OneSidedUpper => upper.is_some(),
            Sidedness::OneSidedLower => lower.is_some(),
        };
        prop_assert_eq!(result.k_res.is_some(), applicable);
        if let Some(k_res) = result.k_res {
            prop_assert!(k_res.is_finite());
        }
    }
}

#[test]
fn test_factor_shrinks_with_sample_size() {
    for (alpha, p) in [(0.05, 0.95), (0.01, 0.99), (0.10, 0.90)] {
        let sizes = [5, 10, 20, 40, 80, 160, 320];
        let two: Vec<f64> = sizes.iter().map(|&n| two_sided_k(n, alpha, p)).collect();
        let one: Vec<f64> = sizes.iter().map(|&n| one_sided_k(n, alpha, p)).collect();
        for w in two.windows(2) {
            assert!(w[1] <= w[0], "two-sided k increased: {:?}", two);
        }
        for w in one.windows(2) {
            assert!(w[1] <= w[0], "one-sided k increased: {:?}", one);
        }
    }
}

#[test]
fn test_one_sided_reference_scenario() {
    let result = engine()
        .compute_one_sided(
            &SampleSpecification::summary(10.0, 2.0, 25),
            0.10,
            0.90,
            Sidedness::OneSidedUpper,
            None,
        )
        .unwrap();
    let tol = result.tolerance_limit().unwrap();
    assert_eq!(
        result.statement,
        format!(
            "With 90.0% confidence, 90.0% of the population will not exceed {}",
            (tol * 100.0).round() / 100.0
        )
    );
}

#[test]
fn test_spec_limit_scenario() {
    let result = engine()
        .compute_two_sided(
            &SampleSpecification::summary(10.0, 2.0, 25),
            0.05,
            0.95,
            &SpecificationLimits::two_sided(5.0, 15.0),
        )
        .unwrap();
    assert_eq!(result.k_res, Some(5.0));
}

#[test]
fn test_single_observation_is_rejected() {
    let err = engine()
        .compute_two_sided(
            &SampleSpecification::raw(vec![1.0]),
            0.05,
            0.95,
            &SpecificationLimits::none(),
        )
        .unwrap_err();
    assert!(matches!(err, ToleranceError::Domain(_)));
}

#[test]
fn test_result_serializes_to_json() {
    let result = engine()
        .compute_two_sided(
            &SampleSpecification::raw(vec![4.1, 3.9, 4.0, 4.2, 3.8, 4.05]),
            0.05,
            0.95,
            &SpecificationLimits::none(),
        )
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["sidedness"], "TwoSided");
    assert!(json["k_res"].is_null());
    assert_eq!(json["plot"]["y_label"], "Probability density");
}
