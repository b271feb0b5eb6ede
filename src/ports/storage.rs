//! Storage port: Trait for the append-only report store.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use crate::domain::{NewReport, ReportRecord};

/// A page of reports with pagination metadata.
#[derive(Debug, Clone)]
pub struct ReportPage {
    /// Reports in this page, newest first
    pub items: Vec<ReportRecord>,
    /// Total count of matching reports
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl ReportPage {
    #[must_use]
    pub fn new(items: Vec<ReportRecord>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    /// Get the next page offset.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        if self.has_more {
            Some(self.offset + self.limit)
        } else {
            None
        }
    }

    /// Get the previous page offset.
    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        if self.offset > 0 {
            Some(self.offset.saturating_sub(self.limit))
        } else {
            None
        }
    }
}

/// Trait for report persistence.
///
/// Reports are only ever appended and read. There is no update or delete.
/// Implementations must accept concurrent appends from different owners.
pub trait ReportStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append a report and return it with its assigned id.
    ///
    /// # Errors
    /// Returns error if the write fails; nothing is stored in that case.
    fn append_report(&self, report: &NewReport) -> Result<ReportRecord, Self::Error>;

    /// Load one owner's reports, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_reports(
        &self,
        owner: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ReportPage, Self::Error>;

    /// Load the most recent reports across all owners.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn recent_reports(&self, limit: usize) -> Result<Vec<ReportRecord>, Self::Error>;

    /// Count reports, optionally for a single owner.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_reports(&self, owner: Option<&str>) -> Result<usize, Self::Error>;

    /// Number of reports per top label, most frequent first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn diagnosis_counts(&self) -> Result<Vec<(String, usize)>, Self::Error>;
}
