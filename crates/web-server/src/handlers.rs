use crate::{error::AppError, AppState};
use analytics::{PerformanceSummary, PredictionFilter, PredictionPage};
use axum::{
    extract::{Path, State},
    Json,
};
use core_types::{Metrics, Prediction, PredictionId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct MetricsRequest {
    pub predicted_views: f64,
    pub actual_views: f64,
}

#[derive(Debug, Deserialize)]
pub struct PredictionBatch {
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
pub struct RecordActualRequest {
    pub prediction: Prediction,
    pub actual_views: u64,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub filter: PredictionFilter,
}

/// # POST /api/predictions/metrics
pub async fn compute_metrics(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MetricsRequest>,
) -> Result<Json<Metrics>, AppError> {
    let metrics = state
        .engine
        .compute_metrics(request.predicted_views, request.actual_views)?;
    Ok(Json(metrics))
}

/// # POST /api/predictions/performance
/// Summarizes a batch of predictions.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<PredictionBatch>,
) -> Result<Json<PerformanceSummary>, AppError> {
    let summary = state.engine.summarize(&batch.predictions)?;
    tracing::debug!(
        total = summary.total_predictions,
        completed = summary.completed_predictions,
        "Summarized predictions."
    );
    Ok(Json(summary))
}

/// # POST /api/predictions/performance/by-user
pub async fn summarize_by_user(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<PredictionBatch>,
) -> Result<Json<BTreeMap<i64, PerformanceSummary>>, AppError> {
    let summaries = state.engine.summarize_by_user(&batch.predictions)?;
    Ok(Json(summaries))
}

/// # POST /api/predictions/:prediction_id/actual
/// Records the real view count and returns the completed prediction.
pub async fn record_actual(
    Path(prediction_id): Path<PredictionId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordActualRequest>,
) -> Result<Json<Prediction>, AppError> {
    if request.prediction.id != prediction_id {
        return Err(AppError::Validation(format!(
            "path id {} does not match prediction id {}",
            prediction_id, request.prediction.id
        )));
    }

    let updated = state
        .engine
        .record_actual(&request.prediction, request.actual_views)?;
    tracing::info!(
        prediction_id,
        accuracy = ?updated.accuracy_score,
        "Recorded actual views."
    );
    Ok(Json(updated))
}

/// # POST /api/predictions/query
/// Filters and paginates a batch of predictions.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Json<PredictionPage> {
    let mut filter = request.filter;
    filter.limit = filter.limit.or(Some(state.default_page_limit));
    Json(state.engine.query(&request.predictions, &filter))
}
