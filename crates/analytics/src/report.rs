use chrono::{DateTime, Utc};
use core_types::PredictionId;
use serde::{Deserialize, Serialize};

/// An aggregate view of how well a set of predictions performed.
///
/// This struct is the output of `AccuracyEngine::summarize` and is never
/// persisted: recompute it whenever the underlying predictions change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Owner of the summarized predictions, when grouped per user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    // I. Status Counts
    pub total_predictions: usize,
    pub completed_predictions: usize,
    pub pending_predictions: usize,

    // II. Averages over completed predictions. `None` means "no data", not zero.
    pub average_accuracy: Option<f64>,
    pub average_absolute_error: Option<f64>,
    pub average_percentage_error: Option<f64>, // signed, exposes over/under bias

    // III. Extremes
    pub best_prediction_id: Option<PredictionId>,
    pub worst_prediction_id: Option<PredictionId>,

    pub last_calculated_at: DateTime<Utc>,
}

impl PerformanceSummary {
    /// Creates an empty summary stamped with the given time.
    pub fn new(last_calculated_at: DateTime<Utc>) -> Self {
        Self {
            user_id: None,
            total_predictions: 0,
            completed_predictions: 0,
            pending_predictions: 0,
            average_accuracy: None,
            average_absolute_error: None,
            average_percentage_error: None,
            best_prediction_id: None,
            worst_prediction_id: None,
            last_calculated_at,
        }
    }

    /// Predictions that ended in the `failed` state.
    pub fn failed_predictions(&self) -> usize {
        self.total_predictions - self.completed_predictions - self.pending_predictions
    }
}
