//! Artifact port: Trait for loading the fitted inference artifacts.
//!
//! The storage layer behind this trait decides where artifacts live; the
//! application only sees fully loaded, read-only objects.

use std::collections::BTreeMap;

use crate::domain::FeatureSchema;

use super::{CategoricalEncoder, Classifier, NumericScaler};

/// Errors that can occur while loading artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact missing: {0}")]
    Missing(String),

    #[error("Artifact invalid: {0}")]
    Invalid(String),

    #[error("Artifact integrity check failed: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The fitted objects a pipeline needs, as loaded from storage.
pub struct LoadedArtifacts {
    pub schema: FeatureSchema,

    /// Encoders keyed by categorical column name
    pub encoders: BTreeMap<String, Box<dyn CategoricalEncoder>>,

    pub scaler: Option<Box<dyn NumericScaler>>,

    pub classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for LoadedArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedArtifacts")
            .field("n_features", &self.schema.len())
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .field("scaler", &self.scaler.is_some())
            .field("classes", &self.classifier.classes())
            .finish()
    }
}

/// Trait for artifact storage.
pub trait ArtifactSource: Send + Sync {
    /// Load every artifact.
    ///
    /// # Errors
    /// Returns `Missing` if a required artifact is absent, `Invalid` or
    /// `Integrity` if one cannot be trusted.
    fn load(&self) -> Result<LoadedArtifacts, ArtifactError>;
}
