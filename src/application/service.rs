//! Diagnosis service: validation, inference and report persistence.
//!
//! This service coordinates:
//! - Input validation
//! - The inference pipeline (when artifacts are available)
//! - Appending exactly one report per successful call
//! - The per-owner session cache used for report re-display

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{
    AdvisoryTable, Demographics, DiagnosisResult, NewReport, ReportRecord, SymptomSet,
};
use crate::ports::{ArtifactSource, ReportPage, ReportStore};
use crate::MediaidError;

use super::{InferenceContext, InferencePipeline, SessionCache};

/// One diagnosis request as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnoseRequest {
    pub owner: String,

    #[serde(flatten)]
    pub demographics: Demographics,

    pub symptoms: SymptomSet,
}

/// Outcome of a successful diagnosis: the result and its persisted report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub result: DiagnosisResult,
    pub report: ReportRecord,
}

/// Service for running diagnoses against a report store.
pub struct DiagnosisService<S>
where
    S: ReportStore,
{
    pipeline: Option<InferencePipeline>,
    storage: Arc<S>,
    sessions: SessionCache,
}

impl<S> DiagnosisService<S>
where
    S: ReportStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a service. `None` means no model is available; every
    /// `diagnose` call then fails with `ModelUnavailable`.
    pub fn new(pipeline: Option<InferencePipeline>, storage: Arc<S>) -> Self {
        Self {
            pipeline,
            storage,
            sessions: SessionCache::new(),
        }
    }

    /// Create a service by loading artifacts from `source`.
    ///
    /// A load failure does not fail construction: the service starts with
    /// inference disabled and history still available.
    pub fn from_source(
        source: &dyn ArtifactSource,
        advisory: Arc<AdvisoryTable>,
        top_k: usize,
        storage: Arc<S>,
    ) -> Self {
        tracing::info!("Initializing diagnosis service...");

        let pipeline = match InferenceContext::load(source) {
            Ok(context) => {
                Some(InferencePipeline::new(Arc::new(context), advisory).with_top_k(top_k))
            }
            Err(e) => {
                tracing::warn!("Inference disabled: {}", e);
                None
            }
        };

        Self::new(pipeline, storage)
    }

    /// Whether a model is loaded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.pipeline.is_some()
    }

    #[must_use]
    pub fn pipeline(&self) -> Option<&InferencePipeline> {
        self.pipeline.as_ref()
    }

    /// Run one diagnosis for `owner` and persist its report.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` without a model, `Validation` for bad
    /// input, `Storage` if the report cannot be written (the result is then
    /// discarded), or a pipeline error.
    pub fn diagnose(
        &self,
        owner: &str,
        demographics: &Demographics,
        symptoms: &SymptomSet,
    ) -> Result<Diagnosis, MediaidError> {
        let pipeline = self.pipeline.as_ref().ok_or(MediaidError::ModelUnavailable)?;

        if owner.trim().is_empty() {
            return Err(MediaidError::Validation("owner must not be empty".to_string()));
        }
        demographics
            .validate()
            .map_err(|errors| MediaidError::Validation(errors.join("; ")))?;
        if symptoms.is_empty() {
            return Err(MediaidError::Validation(
                "select at least one symptom".to_string(),
            ));
        }

        tracing::info!("Starting diagnosis for {} symptom(s)...", symptoms.len());
        let result = pipeline.infer(demographics, symptoms)?;

        let new_report = NewReport::from_result(owner, &result).ok_or_else(|| {
            MediaidError::Prediction("result has no ranked candidate".to_string())
        })?;
        let report = self
            .storage
            .append_report(&new_report)
            .map_err(|e| MediaidError::Storage(e.into()))?;

        self.sessions.store(owner, result.clone());

        tracing::info!(
            "Diagnosis complete: report={}, prediction={}, confidence={:.1}%, degraded={}",
            report.id,
            report.top_label,
            report.top_confidence,
            result.trace.is_degraded()
        );

        Ok(Diagnosis { result, report })
    }

    /// Run a diagnosis from a request.
    ///
    /// # Errors
    /// See [`Self::diagnose`].
    pub fn handle(&self, request: &DiagnoseRequest) -> Result<Diagnosis, MediaidError> {
        self.diagnose(&request.owner, &request.demographics, &request.symptoms)
    }

    /// One page of the owner's reports, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn history(
        &self,
        owner: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ReportPage, MediaidError> {
        self.storage
            .load_reports(owner, offset, limit)
            .map_err(|e| MediaidError::Storage(e.into()))
    }

    /// The owner's latest result in this session, for re-display.
    #[must_use]
    pub fn last_result(&self, owner: &str) -> Option<DiagnosisResult> {
        self.sessions.latest(owner)
    }

    /// Drop the owner's session state. Stored reports are kept.
    pub fn end_session(&self, owner: &str) {
        if self.sessions.clear(owner) {
            tracing::debug!("Session state cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteReportStore;
    use crate::application::pipeline::fixtures;
    use crate::ports::{ArtifactError, LoadedArtifacts};

    fn service() -> DiagnosisService<SqliteReportStore> {
        let storage = Arc::new(SqliteReportStore::in_memory().expect("Should create db"));
        DiagnosisService::new(Some(fixtures::pipeline()), storage)
    }

    fn symptoms() -> SymptomSet {
        ["fever", "chills"].into_iter().collect()
    }

    struct NoArtifacts;

    impl ArtifactSource for NoArtifacts {
        fn load(&self) -> Result<LoadedArtifacts, ArtifactError> {
            Err(ArtifactError::Missing("model.json".into()))
        }
    }

    #[test]
    fn test_diagnose_persists_one_report() {
        let service = service();
        let diagnosis = service
            .diagnose("alice", &fixtures::demographics(), &symptoms())
            .expect("Should diagnose");

        let top = diagnosis.result.top().expect("Should have a top label");
        assert_eq!(diagnosis.report.top_label, top.label);
        assert_eq!(
            diagnosis.report.confidence_label(),
            format!("{:.1}%", top.confidence)
        );
        assert_eq!(diagnosis.report.advisory, diagnosis.result.advisory);
        assert_eq!(diagnosis.report.symptoms, symptoms());

        let page = service.history("alice", 0, 10).expect("Should load history");
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0], diagnosis.report);
    }

    #[test]
    fn test_unavailable_model() {
        let storage = Arc::new(SqliteReportStore::in_memory().expect("Should create db"));
        let service = DiagnosisService::from_source(
            &NoArtifacts,
            Arc::new(AdvisoryTable::builtin()),
            3,
            Arc::clone(&storage),
        );
        assert!(!service.is_available());

        let err = service
            .diagnose("alice", &fixtures::demographics(), &symptoms())
            .expect_err("Should refuse");
        assert!(matches!(err, MediaidError::ModelUnavailable));
        assert!(err.is_unavailable());
        assert_eq!(storage.count_reports(None).expect("Should count"), 0);

        // History keeps working without a model.
        assert_eq!(service.history("alice", 0, 10).expect("Should load").total_count, 0);
    }

    #[test]
    fn test_validation_failures_store_nothing() {
        let service = service();

        let err = service
            .diagnose("alice", &fixtures::demographics(), &SymptomSet::new())
            .expect_err("Empty symptoms should fail");
        assert!(matches!(err, MediaidError::Validation(_)));

        let bad_age = Demographics {
            age: 0,
            ..fixtures::demographics()
        };
        let err = service
            .diagnose("alice", &bad_age, &symptoms())
            .expect_err("Age 0 should fail");
        assert!(matches!(err, MediaidError::Validation(_)));

        let err = service
            .diagnose("  ", &fixtures::demographics(), &symptoms())
            .expect_err("Blank owner should fail");
        assert!(matches!(err, MediaidError::Validation(_)));

        assert_eq!(service.history("alice", 0, 10).expect("Should load").total_count, 0);
    }

    #[test]
    fn test_schema_mismatch_stores_nothing() {
        let storage = Arc::new(SqliteReportStore::in_memory().expect("Should create db"));
        let service = DiagnosisService::new(
            Some(fixtures::stale_pipeline()),
            Arc::clone(&storage),
        );

        let err = service
            .diagnose("alice", &fixtures::demographics(), &symptoms())
            .expect_err("Should fail");
        assert!(matches!(err, MediaidError::SchemaMismatch(_)));
        assert_eq!(storage.count_reports(None).expect("Should count"), 0);
        assert!(service.last_result("alice").is_none());
    }

    #[test]
    fn test_session_cache_per_owner() {
        let service = service();
        let diagnosis = service
            .diagnose("alice", &fixtures::demographics(), &symptoms())
            .expect("Should diagnose");

        assert_eq!(service.last_result("alice"), Some(diagnosis.result));
        assert!(service.last_result("bob").is_none());

        service.end_session("alice");
        assert!(service.last_result("alice").is_none());
        assert_eq!(service.history("alice", 0, 10).expect("Should load").total_count, 1);
    }

    #[test]
    fn test_handle_request_json() {
        let json = r#"{
            "owner": "alice",
            "age": 30,
            "gender": "Male",
            "region": "Punjab",
            "duration_days": 4,
            "comorbidity": "None",
            "symptoms": ["fever", "cough", "fatigue"]
        }"#;
        let request: DiagnoseRequest = serde_json::from_str(json).expect("Should parse");
        assert_eq!(request.demographics, fixtures::demographics());

        let diagnosis = service().handle(&request).expect("Should diagnose");
        assert_eq!(diagnosis.report.owner, "alice");
        assert_eq!(diagnosis.report.symptoms.to_csv(), "cough,fatigue,fever");
    }

    #[test]
    fn test_concurrent_diagnoses() {
        let service = Arc::new(service());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    let owner = format!("owner{i}");
                    for _ in 0..3 {
                        service
                            .diagnose(&owner, &fixtures::demographics(), &symptoms())
                            .expect("Should diagnose");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("Thread should finish");
        }

        for i in 0..4 {
            let page = service
                .history(&format!("owner{i}"), 0, 10)
                .expect("Should load");
            assert_eq!(page.total_count, 3);
        }
    }
}
