use crate::clock::{Clock, SystemClock};
use crate::error::AnalyticsError;
use crate::query::{self, PredictionFilter, PredictionPage};
use crate::report::PerformanceSummary;
use chrono::{DateTime, Utc};
use core_types::{Metrics, Prediction, PredictionId, PredictionStatus};
use std::collections::{BTreeMap, HashSet};

/// A stateless calculator for prediction accuracy and portfolio performance.
///
/// The only thing it holds is the clock used to stamp its output, so a single
/// instance can be shared freely between threads.
#[derive(Debug, Default, Clone)]
pub struct AccuracyEngine<C: Clock = SystemClock> {
    clock: C,
}

impl AccuracyEngine<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> AccuracyEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Computes accuracy and error figures for a single prediction.
    ///
    /// See [`compute_metrics`] for the exact rules.
    pub fn compute_metrics(&self, predicted: f64, actual: f64) -> Result<Metrics, AnalyticsError> {
        compute_metrics(predicted, actual)
    }

    /// Aggregates a batch of predictions into a `PerformanceSummary`.
    ///
    /// # Arguments
    ///
    /// * `predictions` - A snapshot of predictions in any order. Ids must be unique.
    ///
    /// # Returns
    ///
    /// The summary, or `AnalyticsError::InvalidInput` if an id repeats or a
    /// completed prediction is missing its accuracy score.
    ///
    /// Only `status` decides how a record is counted. Derived fields on a pending
    /// or failed record are ignored, and a completed record is scored from its
    /// stored metrics even when `actual_views` is absent.
    pub fn summarize(&self, predictions: &[Prediction]) -> Result<PerformanceSummary, AnalyticsError> {
        summarize_at(predictions, self.clock.now())
    }

    /// Summarizes predictions separately for each owning user.
    ///
    /// Every prediction must carry a `user_id`.
    pub fn summarize_by_user(
        &self,
        predictions: &[Prediction],
    ) -> Result<BTreeMap<i64, PerformanceSummary>, AnalyticsError> {
        let now = self.clock.now();
        let mut seen = HashSet::with_capacity(predictions.len());
        let mut groups: BTreeMap<i64, Vec<&Prediction>> = BTreeMap::new();

        for prediction in predictions {
            check_unique(&mut seen, prediction.id)?;
            let user_id = prediction.user_id.ok_or_else(|| {
                AnalyticsError::InvalidInput(format!(
                    "prediction {} has no user_id and cannot be grouped",
                    prediction.id
                ))
            })?;
            groups.entry(user_id).or_default().push(prediction);
        }

        groups
            .into_iter()
            .map(|(user_id, group)| {
                let mut summary = summarize_at(group, now)?;
                summary.user_id = Some(user_id);
                Ok::<_, AnalyticsError>((user_id, summary))
            })
            .collect()
    }

    /// Records the real view count for a prediction.
    ///
    /// Returns an updated copy with `actual_views`, derived metrics, `completed_at`
    /// filled in and the status set to `completed`. Recording again on a completed
    /// prediction overwrites the previous outcome. Failed predictions are rejected.
    pub fn record_actual(
        &self,
        prediction: &Prediction,
        actual_views: u64,
    ) -> Result<Prediction, AnalyticsError> {
        if prediction.status.is_terminal() {
            return Err(AnalyticsError::InvalidTransition {
                id: prediction.id,
                status: prediction.status,
            });
        }

        let metrics = compute_metrics(prediction.predicted_views as f64, actual_views as f64)?;
        // Counts above 2^53 lose precision as f64; take the difference in integers first.
        let absolute_error = prediction.predicted_views.abs_diff(actual_views) as f64;

        let mut updated = prediction.clone();
        updated.actual_views = Some(actual_views);
        updated.accuracy_score = Some(metrics.accuracy_score);
        updated.absolute_error = Some(absolute_error);
        updated.percentage_error = Some(metrics.percentage_error);
        updated.status = PredictionStatus::Completed;
        updated.completed_at = Some(self.clock.now());

        Ok(updated)
    }

    /// Lists predictions matching `filter`, one page at a time.
    pub fn query(&self, predictions: &[Prediction], filter: &PredictionFilter) -> PredictionPage {
        query::query(predictions, filter)
    }
}

/// Computes accuracy and error figures from a `(predicted, actual)` pair.
///
/// * `absolute_error` is `|predicted - actual|`.
/// * `percentage_error` is signed: positive for over-prediction, negative for
///   under-prediction. When `actual` is zero there is no meaningful ratio, so the
///   error is defined as `0` for an exact zero call and `100` otherwise.
/// * `accuracy_score` is `100 - |percentage_error|`, floored at `0`.
///
/// Fails with `InvalidInput` if either value is negative, NaN or infinite.
/// Inputs are `f64`, so view counts above 2^53 are already rounded by the caller;
/// `AccuracyEngine::record_actual` computes the absolute error from the integers.
pub fn compute_metrics(predicted: f64, actual: f64) -> Result<Metrics, AnalyticsError> {
    check_view_count("predicted", predicted)?;
    check_view_count("actual", actual)?;

    let absolute_error = (predicted - actual).abs();

    let percentage_error = if actual == 0.0 {
        if predicted == 0.0 { 0.0 } else { 100.0 }
    } else {
        // Scale before dividing so whole-percent cases come out exact.
        (predicted - actual) * 100.0 / actual
    };

    if !percentage_error.is_finite() {
        return Err(AnalyticsError::InvalidInput(format!(
            "percentage error for predicted={} actual={} is out of range",
            predicted, actual
        )));
    }

    let accuracy_score = (100.0 - percentage_error.abs()).max(0.0);

    Ok(Metrics {
        accuracy_score,
        absolute_error,
        percentage_error,
    })
}

fn check_view_count(name: &str, value: f64) -> Result<(), AnalyticsError> {
    if !value.is_finite() {
        return Err(AnalyticsError::InvalidInput(format!(
            "{} views must be a finite number, got {}",
            name, value
        )));
    }
    if value < 0.0 {
        return Err(AnalyticsError::InvalidInput(format!(
            "{} views must not be negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_unique(seen: &mut HashSet<PredictionId>, id: PredictionId) -> Result<(), AnalyticsError> {
    if !seen.insert(id) {
        return Err(AnalyticsError::InvalidInput(format!(
            "prediction id {} appears more than once",
            id
        )));
    }
    Ok(())
}

/// Rejects stored derived values that would poison an average.
fn finite_field(
    prediction: &Prediction,
    field: &str,
    value: Option<f64>,
) -> Result<Option<f64>, AnalyticsError> {
    match value {
        Some(v) if !v.is_finite() => Err(AnalyticsError::InvalidInput(format!(
            "prediction {} has a non-finite {}",
            prediction.id, field
        ))),
        other => Ok(other),
    }
}

#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// The best/worst candidate so far, as `(accuracy, id)`.
type Extreme = Option<(f64, PredictionId)>;

/// Keeps `current` unless `candidate` beats it, breaking ties on the lower id.
fn pick(current: Extreme, accuracy: f64, id: PredictionId, higher_wins: bool) -> Extreme {
    match current {
        Some((best, best_id)) => {
            let beats = if higher_wins { accuracy > best } else { accuracy < best };
            if beats || (accuracy == best && id < best_id) {
                Some((accuracy, id))
            } else {
                current
            }
        }
        None => Some((accuracy, id)),
    }
}

fn summarize_at<'a, I>(predictions: I, now: DateTime<Utc>) -> Result<PerformanceSummary, AnalyticsError>
where
    I: IntoIterator<Item = &'a Prediction>,
{
    let mut summary = PerformanceSummary::new(now);
    let mut seen = HashSet::new();

    let mut accuracy = Mean::default();
    let mut absolute_error = Mean::default();
    let mut percentage_error = Mean::default();
    let mut best: Extreme = None;
    let mut worst: Extreme = None;

    for prediction in predictions {
        check_unique(&mut seen, prediction.id)?;
        summary.total_predictions += 1;

        match prediction.status {
            PredictionStatus::Pending => summary.pending_predictions += 1,
            PredictionStatus::Failed => {}
            PredictionStatus::Completed => {
                summary.completed_predictions += 1;

                let score = finite_field(prediction, "accuracy_score", prediction.accuracy_score)?
                    .ok_or_else(|| {
                        AnalyticsError::InvalidInput(format!(
                            "completed prediction {} has no accuracy_score",
                            prediction.id
                        ))
                    })?;

                accuracy.push(score);
                if let Some(err) = finite_field(prediction, "absolute_error", prediction.absolute_error)? {
                    absolute_error.push(err);
                }
                if let Some(err) =
                    finite_field(prediction, "percentage_error", prediction.percentage_error)?
                {
                    percentage_error.push(err);
                }

                best = pick(best, score, prediction.id, true);
                worst = pick(worst, score, prediction.id, false);
            }
        }
    }

    summary.average_accuracy = accuracy.value();
    summary.average_absolute_error = absolute_error.value();
    summary.average_percentage_error = percentage_error.value();
    summary.best_prediction_id = best.map(|(_, id)| id);
    summary.worst_prediction_id = worst.map(|(_, id)| id);

    Ok(summary)
}
