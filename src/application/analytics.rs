//! Analytics service: aggregate statistics over stored reports.
//!
//! Backs the administrator dashboard: total volume, how often each
//! diagnosis was the top label, and the most recent activity.

use std::sync::Arc;

use serde::Serialize;

use crate::ports::ReportStore;
use crate::MediaidError;

/// One line of recent activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub report_id: i64,
    pub owner: String,
    pub date: String,
    pub diagnosis: String,
    pub confidence: String,
}

/// Aggregate report statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatistics {
    pub total_reports: usize,
    /// Top label → number of reports, most frequent first
    pub by_diagnosis: Vec<(String, usize)>,
    /// Newest first
    pub recent: Vec<RecentActivity>,
}

impl ReportStatistics {
    /// Share of reports whose top label is `label`, in percent.
    #[must_use]
    pub fn share_of(&self, label: &str) -> f64 {
        if self.total_reports == 0 {
            return 0.0;
        }
        let count = self
            .by_diagnosis
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, n)| *n);
        count as f64 * 100.0 / self.total_reports as f64
    }
}

/// Service for report analytics.
pub struct AnalyticsService<S>
where
    S: ReportStore,
{
    storage: Arc<S>,
}

impl<S> AnalyticsService<S>
where
    S: ReportStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new analytics service.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Get aggregate statistics with up to `recent_limit` recent reports.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn statistics(&self, recent_limit: usize) -> Result<ReportStatistics, MediaidError> {
        let total_reports = self
            .storage
            .count_reports(None)
            .map_err(|e| MediaidError::Storage(e.into()))?;
        let by_diagnosis = self
            .storage
            .diagnosis_counts()
            .map_err(|e| MediaidError::Storage(e.into()))?;
        let recent = self
            .storage
            .recent_reports(recent_limit)
            .map_err(|e| MediaidError::Storage(e.into()))?
            .into_iter()
            .map(|r| RecentActivity {
                report_id: r.id,
                date: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                confidence: r.confidence_label(),
                owner: r.owner,
                diagnosis: r.top_label,
            })
            .collect();

        tracing::info!(
            "Generated statistics: reports={}, distinct diagnoses={}",
            total_reports,
            by_diagnosis.len()
        );

        Ok(ReportStatistics {
            total_reports,
            by_diagnosis,
            recent,
        })
    }
}
