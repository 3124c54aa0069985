use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::PredictionStatus;

/// Identifier of a prediction record as assigned by the persistence layer.
pub type PredictionId = i64;

/// Accuracy and error figures derived from a `(predicted, actual)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// 0 to 100, where 100 is an exact hit.
    pub accuracy_score: f64,
    /// `|predicted - actual|` in views.
    pub absolute_error: f64,
    /// Signed relative deviation in percent. Positive means over-prediction.
    pub percentage_error: f64,
}

/// A single view-count forecast for a video.
///
/// Field names follow the JSON shape served by the prediction API so records
/// can be passed through without translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: PredictionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<i64>,
    pub predicted_views: u64,
    #[serde(default)]
    pub actual_views: Option<u64>,
    pub status: PredictionStatus,
    #[serde(default)]
    pub accuracy_score: Option<f64>,
    #[serde(default)]
    pub absolute_error: Option<f64>,
    #[serde(default)]
    pub percentage_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Prediction {
    /// Creates a fresh prediction that is still waiting for its outcome.
    pub fn pending(id: PredictionId, predicted_views: u64) -> Self {
        Self {
            id,
            user_id: None,
            channel_id: None,
            video_id: None,
            predicted_views,
            actual_views: None,
            status: PredictionStatus::Pending,
            accuracy_score: None,
            absolute_error: None,
            percentage_error: None,
            completed_at: None,
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_channel(mut self, channel_id: i64) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    pub fn with_video(mut self, video_id: i64) -> Self {
        self.video_id = Some(video_id);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == PredictionStatus::Completed
    }

    /// Returns the stored derived figures, if all three are present.
    pub fn metrics(&self) -> Option<Metrics> {
        Some(Metrics {
            accuracy_score: self.accuracy_score?,
            absolute_error: self.absolute_error?,
            percentage_error: self.percentage_error?,
        })
    }
}
