//! # MediAid
//!
//! Symptom-based diagnosis inference with an auditable report history.
//!
//! This crate provides:
//! - A deterministic inference pipeline over pre-fitted artifacts
//!   (feature schema, categorical encoders, numeric scaler, classifier)
//! - Top-K ranking of candidate diagnoses with advisory lookup
//! - An append-only SQLite report store
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (demographics, symptoms, results, reports)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (artifact files, fitted models, SQLite)
//! - `application`: Pipeline components and use cases
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{DiagnosisService, InferenceContext, InferencePipeline};
pub use domain::{Demographics, DiagnosisResult, SymptomSet};

/// Result type for MediAid operations
pub type Result<T> = std::result::Result<T, MediaidError>;

/// Main error type for MediAid
///
/// Only `ArtifactMissing`, `ArtifactInvalid` and `SchemaMismatch` come out of
/// the pipeline itself. Encoding, scaling and probability failures degrade
/// inside the pipeline and show up in the result's trace instead.
#[derive(Debug, thiserror::Error)]
pub enum MediaidError {
    #[error("Prediction unavailable: {0}")]
    ArtifactMissing(String),

    #[error("Prediction unavailable: invalid artifact: {0}")]
    ArtifactInvalid(String),

    #[error("Internal data error: schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Prediction unavailable: model not loaded")]
    ModelUnavailable,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ports::ArtifactError> for MediaidError {
    fn from(err: ports::ArtifactError) -> Self {
        match err {
            ports::ArtifactError::Missing(what) => Self::ArtifactMissing(what),
            ports::ArtifactError::Invalid(what) | ports::ArtifactError::Integrity(what) => {
                Self::ArtifactInvalid(what)
            }
            ports::ArtifactError::Io(e) => Self::Io(e),
        }
    }
}

impl MediaidError {
    /// Whether the error disables inference rather than failing one call.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ArtifactMissing(_) | Self::ArtifactInvalid(_) | Self::ModelUnavailable
        )
    }
}
