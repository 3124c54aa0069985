use crate::error::AnalyticsError;
use core_types::{Prediction, PredictionStatus};
use serde::{Deserialize, Serialize};

/// Page size used when a filter does not specify one.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Criteria for listing predictions. Every `None` criterion matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionFilter {
    pub user_id: Option<i64>,
    pub channel_id: Option<i64>,
    pub video_id: Option<i64>,
    pub status: Option<PredictionStatus>,
    /// Number of matching predictions to skip before the page starts.
    pub skip: usize,
    pub limit: Option<usize>,
}

impl PredictionFilter {
    /// Sets the status criterion from its wire name (e.g. "pending").
    pub fn with_status_name(mut self, name: &str) -> Result<Self, AnalyticsError> {
        self.status = Some(name.parse::<PredictionStatus>()?);
        Ok(self)
    }

    pub fn matches(&self, prediction: &Prediction) -> bool {
        fn accepts(wanted: Option<i64>, actual: Option<i64>) -> bool {
            wanted.is_none() || wanted == actual
        }

        accepts(self.user_id, prediction.user_id)
            && accepts(self.channel_id, prediction.channel_id)
            && accepts(self.video_id, prediction.video_id)
            && self.status.is_none_or(|status| status == prediction.status)
    }
}

/// One page of matching predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPage {
    pub items: Vec<Prediction>,
    /// Number of matches before pagination was applied.
    pub total: usize,
}

/// Filters `predictions` and returns the requested page, keeping input order.
pub fn query(predictions: &[Prediction], filter: &PredictionFilter) -> PredictionPage {
    let limit = filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let mut total = 0;
    let mut items = Vec::new();

    for prediction in predictions.iter().filter(|p| filter.matches(p)) {
        if total >= filter.skip && items.len() < limit {
            items.push(prediction.clone());
        }
        total += 1;
    }

    PredictionPage { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Prediction> {
        let mut failed = Prediction::pending(4, 900).with_user(2).with_channel(20);
        failed.status = PredictionStatus::Failed;

        vec![
            Prediction::pending(1, 100).with_user(1).with_channel(10).with_video(100),
            Prediction::pending(2, 200).with_user(1).with_channel(10).with_video(101),
            Prediction::pending(3, 300).with_user(1).with_channel(11).with_video(102),
            failed,
        ]
    }

    #[test]
    fn empty_filter_returns_everything() {
        let page = query(&sample(), &PredictionFilter::default());
        assert_eq!(page.total, 4);
        assert_eq!(page.items.len(), 4);
    }

    #[test]
    fn criteria_are_combined() {
        let filter = PredictionFilter {
            user_id: Some(1),
            channel_id: Some(10),
            ..Default::default()
        };
        let page = query(&sample(), &filter);
        let ids: Vec<_> = page.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn status_filter() {
        let filter = PredictionFilter {
            status: Some(PredictionStatus::Failed),
            ..Default::default()
        };
        let page = query(&sample(), &filter);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, 4);
    }

    #[test]
    fn status_criterion_from_wire_name() {
        let filter = PredictionFilter::default().with_status_name("FAILED").unwrap();
        assert_eq!(filter.status, Some(PredictionStatus::Failed));
        assert_eq!(query(&sample(), &filter).total, 1);
    }

    #[test]
    fn unknown_status_name_is_a_core_error() {
        let err = PredictionFilter::default().with_status_name("archived").unwrap_err();
        assert!(matches!(err, AnalyticsError::Core(core_types::CoreError::InvalidInput(ref field, _)) if field == "status"));
        assert!(err.to_string().contains("archived"));
    }

    #[test]
    fn pagination_reports_total_before_paging() {
        let filter = PredictionFilter {
            skip: 1,
            limit: Some(2),
            ..Default::default()
        };
        let page = query(&sample(), &filter);
        let ids: Vec<_> = page.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(page.total, 4);
    }

    #[test]
    fn skip_past_the_end_yields_empty_page() {
        let filter = PredictionFilter {
            skip: 10,
            ..Default::default()
        };
        let page = query(&sample(), &filter);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 4);
    }
}
