use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Lifecycle state of a prediction.
///
/// `Pending` until the real view count is recorded, then `Completed`.
/// `Failed` is terminal and set by whoever runs the forecasting model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Pending,
    Completed,
    Failed,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Pending => "pending",
            PredictionStatus::Completed => "completed",
            PredictionStatus::Failed => "failed",
        }
    }

    /// Returns true if no further transition may leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PredictionStatus::Failed)
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(PredictionStatus::Pending),
            "completed" => Ok(PredictionStatus::Completed),
            "failed" => Ok(PredictionStatus::Failed),
            other => Err(CoreError::InvalidInput(
                "status".to_string(),
                format!("unknown prediction status '{}'", other),
            )),
        }
    }
}
