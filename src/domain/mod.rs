//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. All types are serializable and the ones built
//! from user input carry their own validation.

pub mod advisory;
mod diagnosis;
mod patient;
mod record;
mod report;
pub mod schema;

pub use advisory::{AdvisoryRecord, AdvisoryTable};
pub use diagnosis::{
    DiagnosisResult, EncodingOutcome, InferenceTrace, ProbabilityOutcome, RankedDiagnosis,
    ScalingOutcome,
};
pub use patient::{Demographics, SymptomSet, COMORBIDITIES, GENDERS, REGIONS};
pub use record::{EncodedVector, RawRecord, RawValue};
pub use report::{NewReport, ReportRecord};
pub use schema::{FeatureKind, FeatureSchema, SchemaError};
