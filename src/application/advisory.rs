//! Advisory resolver: label → guidance, never empty.

use std::sync::Arc;

use crate::domain::{AdvisoryRecord, AdvisoryTable};

/// Looks up the advisory for a diagnosis label.
#[derive(Debug, Clone)]
pub struct AdvisoryResolver {
    table: Arc<AdvisoryTable>,
}

impl AdvisoryResolver {
    #[must_use]
    pub fn new(table: Arc<AdvisoryTable>) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &AdvisoryTable {
        &self.table
    }

    /// Advisory for `label`.
    ///
    /// Unknown labels get the default record. Blank fields of a known
    /// record are filled from the default, so every field is non-empty.
    #[must_use]
    pub fn resolve(&self, label: &str) -> AdvisoryRecord {
        let Some(record) = self.table.get(label) else {
            tracing::debug!("No advisory for label {label}; using default");
            return AdvisoryRecord::default();
        };
        if record.is_complete() {
            return record.clone();
        }

        let fallback = AdvisoryRecord::default();
        let pick = |field: &String, default: String| {
            if field.trim().is_empty() {
                default
            } else {
                field.clone()
            }
        };
        AdvisoryRecord {
            tests: pick(&record.tests, fallback.tests),
            care: pick(&record.care, fallback.care),
            emergency: pick(&record.emergency, fallback.emergency),
        }
    }
}
