use core_types::{CoreError, PredictionId, PredictionStatus};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Prediction {id} is '{status}' and cannot record an outcome")]
    InvalidTransition {
        id: PredictionId,
        status: PredictionStatus,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}
