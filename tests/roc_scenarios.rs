mod common;

use common::{at, day, dense_case, init_logging, CaseBuilder};
use renal_risk::{
    AnomalyPolicy, EngineConfig, ParameterCategory, ParameterSeries, RenalRiskEngine, ReportAxis,
    RocItem,
};

fn engine(config: EngineConfig) -> RenalRiskEngine {
    RenalRiskEngine::new(config.with_workers(2)).unwrap()
}

fn roc(series: &ParameterSeries, config: EngineConfig) -> Vec<RocItem> {
    init_logging();
    let axis = ReportAxis::daily(day(0), day(12)).unwrap();
    engine(config).cumulative_roc(series, &axis, day(12)).unwrap()
}

#[test]
fn admission_anchored_dense_case_yields_three_negative_windows() {
    let mut series = ParameterSeries::new();
    dense_case(&mut series, "dense", 0, Some(4), None);

    let items = roc(&series, EngineConfig::default());
    assert_eq!(items.len(), 3, "[3,4] must be excluded by the discharge bound");
    assert!(items.iter().all(|item| item.label == 0));
    assert!(items.iter().all(|item| item.risk.is_finite()));
}

#[test]
fn therapy_anchored_sparse_case_yields_nothing() {
    let mut series = ParameterSeries::new();
    CaseBuilder::new(&mut series, "sparse")
        .stay(day(0), Some(day(8)))
        .weight(80.0, day(0))
        .creatinine(1.1, day(0))
        .therapy(day(5), Some(day(6)));

    assert!(roc(&series, EngineConfig::default()).is_empty());
}

#[test]
fn therapy_case_has_exactly_one_positive_closest_to_anchor() {
    let mut series = ParameterSeries::new();
    dense_case(&mut series, "therapy", 0, Some(9), Some(at(6, 12)));

    let items = roc(&series, EngineConfig::default());
    assert_eq!(items.len(), 3);
    assert_eq!(items.iter().filter(|item| item.is_positive()).count(), 1);
    assert!(items[0].is_positive(), "first emitted window is the one closest to the anchor");
}

#[test]
fn positive_label_survives_across_cases_and_shards() {
    let mut series = ParameterSeries::new();
    for i in 0..6 {
        let therapy = if i % 2 == 0 { Some(at(6, 12)) } else { None };
        dense_case(&mut series, &format!("case-{}", i), 0, Some(9), therapy);
    }

    let items = roc(&series, EngineConfig::default());
    assert_eq!(items.iter().filter(|item| item.is_positive()).count(), 3);
}

#[test]
fn cases_without_baseline_or_weight_are_skipped() {
    let mut series = ParameterSeries::new();
    CaseBuilder::new(&mut series, "no-weight")
        .stay(day(0), Some(day(9)))
        .daily_labs(0, 9, 40.0)
        .therapy(at(6, 12), Some(day(7)));
    CaseBuilder::new(&mut series, "no-creatinine")
        .stay(day(0), Some(day(9)))
        .weight(70.0, day(0))
        .daily_labs(0, 9, 40.0);
    series
        .get_mut(&ParameterCategory::Creatinine)
        .unwrap()
        .retain(|sample| sample.case_id != "no-creatinine");

    assert!(roc(&series, EngineConfig::default()).is_empty());
}

#[test]
fn open_stays_are_not_labeled() {
    let mut series = ParameterSeries::new();
    dense_case(&mut series, "open", 0, None, None);

    assert!(roc(&series, EngineConfig::default()).is_empty());
}

#[test]
fn anomaly_policy_controls_outliers() {
    let mut series = ParameterSeries::new();
    CaseBuilder::new(&mut series, "uremic")
        .stay(day(0), Some(day(4)))
        .weight(75.0, day(0))
        .daily_labs(0, 4, 2000.0);

    let retained = roc(&series, EngineConfig::default());
    assert_eq!(retained.len(), 3);
    assert!(retained.iter().all(|item| item.risk > 50.0));

    let discarded = roc(
        &series,
        EngineConfig::default().with_anomaly_policy(AnomalyPolicy::Discard),
    );
    assert!(discarded.is_empty());
}

#[test]
fn discarded_outlier_does_not_take_the_positive_label() {
    let mut series = ParameterSeries::new();
    dense_case(&mut series, "therapy", 0, Some(9), Some(at(6, 12)));
    // Closest to the middle of the window right before the anchor offset.
    series
        .entry(ParameterCategory::Urea)
        .or_default()
        .push(renal_risk::Sample::new("therapy", 5000.0, at(3, 1)));

    let retained = roc(&series, EngineConfig::default());
    assert_eq!(retained.len(), 3);
    assert!(retained[0].is_positive() && retained[0].risk > 50.0);

    let discarded = roc(
        &series,
        EngineConfig::default().with_anomaly_policy(AnomalyPolicy::Discard),
    );
    assert_eq!(discarded.len(), 2);
    assert!(discarded[0].is_positive());
    assert!(discarded[0].risk < 50.0);
}

#[test]
fn zero_baseline_yields_infinite_scores_unless_discarded() {
    let mut series = ParameterSeries::new();
    CaseBuilder::new(&mut series, "zero-baseline")
        .stay(day(0), Some(day(4)))
        .weight(75.0, day(0))
        .creatinine(0.0, at(0, 1))
        .daily_labs(0, 4, 40.0);

    let retained = roc(&series, EngineConfig::default());
    assert_eq!(retained.len(), 3);
    assert!(retained.iter().all(|item| item.risk.is_infinite()));

    let discard = EngineConfig::default().with_anomaly_policy(AnomalyPolicy::Discard);
    assert!(roc(&series, discard.clone()).is_empty());

    let axis = ReportAxis::daily(day(0), day(12)).unwrap();
    let timeline = engine(EngineConfig::default())
        .timeline(&series, &axis, day(12))
        .unwrap();
    let risks: Vec<f64> = timeline.risk_scores.into_iter().flatten().collect();
    assert_eq!(risks.len(), 3);
    assert!(risks.iter().all(|risk| risk.is_infinite()));

    let timeline = engine(discard).timeline(&series, &axis, day(12)).unwrap();
    assert!(timeline.risk_scores.iter().all(Vec::is_empty));
}
