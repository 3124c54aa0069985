//! End-to-end behaviour of the engine over a realistic batch: predictions are
//! created pending, outcomes are recorded, and the portfolio is summarized.

use analytics::{AccuracyEngine, AnalyticsError, FixedClock, PredictionFilter};
use chrono::{TimeZone, Utc};
use core_types::{Prediction, PredictionStatus};

fn engine() -> AccuracyEngine<FixedClock> {
    AccuracyEngine::with_clock(FixedClock(Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap()))
}

fn portfolio() -> Vec<Prediction> {
    vec![
        Prediction::pending(1, 12000).with_user(1).with_channel(10),
        Prediction::pending(2, 8000).with_user(1).with_channel(10),
        Prediction::pending(3, 500).with_user(1).with_channel(11),
        Prediction::pending(4, 0).with_user(2).with_channel(20),
    ]
}

#[test]
fn recording_outcomes_then_summarizing() {
    let engine = engine();
    let mut predictions = portfolio();

    predictions[0] = engine.record_actual(&predictions[0], 10000).unwrap();
    predictions[1] = engine.record_actual(&predictions[1], 10000).unwrap();
    predictions[3] = engine.record_actual(&predictions[3], 0).unwrap();

    let summary = engine.summarize(&predictions).unwrap();
    assert_eq!(summary.total_predictions, 4);
    assert_eq!(summary.completed_predictions, 3);
    assert_eq!(summary.pending_predictions, 1);
    assert_eq!(summary.average_accuracy, Some(260.0 / 3.0));
    assert_eq!(summary.average_absolute_error, Some(4000.0 / 3.0));
    // +20 and -20 cancel out, the zero call adds nothing.
    assert_eq!(summary.average_percentage_error, Some(0.0));
    assert_eq!(summary.best_prediction_id, Some(4));
    assert_eq!(summary.worst_prediction_id, Some(1));
}

#[test]
fn summaries_are_idempotent() {
    let engine = AccuracyEngine::new();
    let mut predictions = portfolio();
    predictions[2] = engine.record_actual(&predictions[2], 400).unwrap();

    let first = engine.summarize(&predictions).unwrap();
    let second = engine.summarize(&predictions).unwrap();

    assert_eq!(first.total_predictions, second.total_predictions);
    assert_eq!(first.average_accuracy, second.average_accuracy);
    assert_eq!(first.average_percentage_error, second.average_percentage_error);
    assert_eq!(first.best_prediction_id, second.best_prediction_id);
    assert_eq!(first.worst_prediction_id, second.worst_prediction_id);
    assert!(second.last_calculated_at >= first.last_calculated_at);
}

#[test]
fn failed_predictions_are_counted_but_never_scored() {
    let engine = engine();
    let mut predictions = portfolio();
    predictions[0] = engine.record_actual(&predictions[0], 10000).unwrap();
    predictions[1].status = PredictionStatus::Failed;

    let summary = engine.summarize(&predictions).unwrap();
    assert_eq!(summary.total_predictions, 4);
    assert_eq!(summary.failed_predictions(), 1);
    assert_eq!(summary.average_accuracy, Some(80.0));

    let err = engine.record_actual(&predictions[1], 10).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidTransition { id: 2, .. }));
}

#[test]
fn per_user_summaries_and_listing() {
    let engine = engine();
    let mut predictions = portfolio();
    predictions[3] = engine.record_actual(&predictions[3], 40).unwrap();

    let by_user = engine.summarize_by_user(&predictions).unwrap();
    assert_eq!(by_user[&1].completed_predictions, 0);
    assert_eq!(by_user[&1].average_accuracy, None);
    assert_eq!(by_user[&2].average_accuracy, Some(0.0));
    assert_eq!(by_user[&2].best_prediction_id, Some(4));

    let pending = engine.query(
        &predictions,
        &PredictionFilter {
            status: Some(PredictionStatus::Pending),
            channel_id: Some(10),
            ..Default::default()
        },
    );
    assert_eq!(pending.total, 2);
}

#[test]
fn summary_serializes_with_api_field_names() {
    let summary = engine().summarize(&[]).unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["total_predictions"], 0);
    assert!(json["average_accuracy"].is_null());
    assert!(json["best_prediction_id"].is_null());
    assert_eq!(json["last_calculated_at"], "2025-06-30T00:00:00Z");
    assert!(json.get("user_id").is_none());
}
