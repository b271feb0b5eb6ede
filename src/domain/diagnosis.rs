//! Diagnosis result types.
//!
//! Represents the ranked output of one inference call together with the
//! advisory for the top label and a trace of every degradation that
//! happened along the way.

use serde::{Deserialize, Serialize};

use super::{AdvisoryRecord, SymptomSet};

/// One candidate diagnosis with its confidence percentage (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDiagnosis {
    pub label: String,
    pub confidence: f64,
}

impl RankedDiagnosis {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl std::fmt::Display for RankedDiagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.1}%)", self.label, self.confidence)
    }
}

/// How one categorical column was encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EncodingOutcome {
    /// The fitted encoder knew the value
    Encoded { column: String, code: i64 },
    /// No encoder was fitted for the column; emitted code 0
    EncoderMissing { column: String },
    /// The encoder never saw this value; emitted code 0
    UnseenCategory { column: String, value: String },
}

impl EncodingOutcome {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Encoded { column, .. }
            | Self::EncoderMissing { column }
            | Self::UnseenCategory { column, .. } => column,
        }
    }

    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::Encoded { code, .. } => *code,
            Self::EncoderMissing { .. } | Self::UnseenCategory { .. } => 0,
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Encoded { .. })
    }
}

/// How the numeric sub-vector was conditioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScalingOutcome {
    Scaled,
    /// No scaler available; values passed through unscaled
    ScalerMissing,
    /// The scaler failed; values passed through unscaled
    Failed { reason: String },
}

/// Whether class probabilities were available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbabilityOutcome {
    Distributed,
    /// Degraded to a single hard label at 100%
    Unsupported { reason: String },
}

/// Record of how each fallible stage behaved during one inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceTrace {
    pub encoding: Vec<EncodingOutcome>,
    pub scaling: ScalingOutcome,
    pub probability: ProbabilityOutcome,
    /// Selected symptoms that are not part of the schema
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_symptoms: Vec<String>,
}

impl InferenceTrace {
    /// Whether any stage fell back to a default.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.encoding.iter().any(EncodingOutcome::is_degraded)
            || self.scaling != ScalingOutcome::Scaled
            || self.probability != ProbabilityOutcome::Distributed
    }

    #[must_use]
    pub fn encoding_for(&self, column: &str) -> Option<&EncodingOutcome> {
        self.encoding.iter().find(|o| o.column() == column)
    }
}

/// Output of one inference call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Up to K candidates, descending by confidence
    pub ranking: Vec<RankedDiagnosis>,

    /// Symptoms the result was produced from
    pub symptoms: SymptomSet,

    pub advisory: AdvisoryRecord,

    pub trace: InferenceTrace,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl DiagnosisResult {
    /// Highest-confidence candidate.
    #[must_use]
    pub fn top(&self) -> Option<&RankedDiagnosis> {
        self.ranking.first()
    }

    /// Timestamp in the `YYYY-MM-DD HH:MM:SS` form stored in reports.
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
