//! Report records: the append-only audit trail of inference calls.

use serde::{Deserialize, Serialize};

use super::{AdvisoryRecord, DiagnosisResult, SymptomSet};

/// A report ready to be appended; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub owner: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub symptoms: SymptomSet,
    pub top_label: String,
    /// Confidence percentage of the top label
    pub top_confidence: f64,
    pub advisory: AdvisoryRecord,
}

impl NewReport {
    /// Capture the persisted part of a diagnosis result.
    ///
    /// Returns `None` when the result has no ranked candidate.
    #[must_use]
    pub fn from_result(owner: impl Into<String>, result: &DiagnosisResult) -> Option<Self> {
        let top = result.top()?;
        Some(Self {
            owner: owner.into(),
            created_at: result.created_at,
            symptoms: result.symptoms.clone(),
            top_label: top.label.clone(),
            top_confidence: top.confidence,
            advisory: result.advisory.clone(),
        })
    }
}

/// A persisted report. Never updated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Store-assigned, auto-incrementing
    pub id: i64,
    pub owner: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub symptoms: SymptomSet,
    pub top_label: String,
    pub top_confidence: f64,
    pub advisory: AdvisoryRecord,
}

impl ReportRecord {
    #[must_use]
    pub fn from_new(id: i64, report: NewReport) -> Self {
        Self {
            id,
            owner: report.owner,
            created_at: report.created_at,
            symptoms: report.symptoms,
            top_label: report.top_label,
            top_confidence: report.top_confidence,
            advisory: report.advisory,
        }
    }

    /// Confidence as shown in history listings, e.g. `62.0%`.
    #[must_use]
    pub fn confidence_label(&self) -> String {
        format!("{:.1}%", self.top_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InferenceTrace, ProbabilityOutcome, RankedDiagnosis, ScalingOutcome};

    fn result(ranking: Vec<RankedDiagnosis>) -> DiagnosisResult {
        DiagnosisResult {
            ranking,
            symptoms: ["fever", "cough"].into_iter().collect(),
            advisory: AdvisoryRecord::default(),
            trace: InferenceTrace {
                encoding: Vec::new(),
                scaling: ScalingOutcome::Scaled,
                probability: ProbabilityOutcome::Distributed,
                ignored_symptoms: Vec::new(),
            },
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_new_report_takes_top_label() {
        let r = result(vec![
            RankedDiagnosis::new("Malaria", 71.34),
            RankedDiagnosis::new("Dengue", 20.0),
        ]);
        let report = NewReport::from_result("alice", &r).expect("Should have top label");
        assert_eq!(report.top_label, "Malaria");
        assert!((report.top_confidence - 71.34).abs() < f64::EPSILON);

        let record = ReportRecord::from_new(7, report);
        assert_eq!(record.id, 7);
        assert_eq!(record.confidence_label(), "71.3%");
    }

    #[test]
    fn test_empty_ranking_yields_no_report() {
        assert!(NewReport::from_result("alice", &result(Vec::new())).is_none());
    }
}
