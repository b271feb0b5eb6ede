//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and its collaborators (fitted model artifacts,
//! artifact storage, report storage).

mod artifacts;
mod classifier;
mod preprocessing;
mod storage;

pub use artifacts::{ArtifactError, ArtifactSource, LoadedArtifacts};
pub use classifier::{Classifier, ClassifierError};
pub use preprocessing::{CategoricalEncoder, EncodingError, NumericScaler, ScalingError};
pub use storage::{ReportPage, ReportStore};
