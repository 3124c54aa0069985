use analytics::AnalyticsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every variant is caller-correctable, so all of them map to 422 with the
/// message passed through for display.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Analytics(analytics_err) => {
                tracing::warn!(error = %analytics_err, "Rejected prediction data.");
                (StatusCode::UNPROCESSABLE_ENTITY, analytics_err.to_string())
            }
            AppError::Validation(message) => {
                tracing::warn!(error = %message, "Rejected request.");
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
