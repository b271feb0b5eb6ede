//! Feature schema: the ordered feature names the fitted artifacts expect.
//!
//! The order is fixed when the schema artifact is loaded. Every raw record and
//! encoded vector built afterwards follows it exactly.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Demographic columns, in the order the training pipeline emitted them.
pub const DEMOGRAPHIC_FEATURES: [&str; 5] =
    ["age", "gender", "region", "duration_days", "comorbidity"];

/// Demographic columns holding category strings.
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["gender", "region", "comorbidity"];

/// Demographic columns holding integers, in the order the scaler was fitted on.
pub const NUMERIC_COLUMNS: [&str; 2] = ["age", "duration_days"];

/// Symptom indicators of the reference model, in training order.
pub const REFERENCE_SYMPTOMS: [&str; 35] = [
    "abdominal_pain",
    "back_pain",
    "chest_pain",
    "chills",
    "conjunctivitis",
    "constipation",
    "cough",
    "dark_urine",
    "dehydration",
    "diarrhea",
    "dysuria",
    "fatigue",
    "fever",
    "frequency",
    "headache",
    "itching",
    "joint_pain",
    "jaundice",
    "loss_of_appetite",
    "loss_of_smell_taste",
    "lower_abdominal_pain",
    "muscle_pain",
    "nausea",
    "night_sweats",
    "persistent_cough",
    "rash",
    "retro_orbital_pain",
    "runny_nose",
    "shortness_of_breath",
    "sore_throat",
    "sputum",
    "sweating",
    "vesicular_rash",
    "vomiting",
    "weight_loss",
];

/// Partition a feature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// One of [`DEMOGRAPHIC_FEATURES`]
    Demographic,
    /// Boolean symptom indicator
    Symptom,
}

/// Problems found when a feature list cannot serve as a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Feature schema is empty")]
    Empty,

    #[error("Duplicate feature name: {0}")]
    Duplicate(String),

    #[error("Feature schema lacks demographic column: {0}")]
    MissingDemographic(String),
}

/// Canonical ordered list of feature names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from an ordered name list.
    ///
    /// # Errors
    /// Returns error if the list is empty, repeats a name, or lacks any of
    /// the demographic columns.
    pub fn new<I, S>(names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }

        if let Some(missing) = DEMOGRAPHIC_FEATURES
            .iter()
            .find(|d| !seen.contains(**d))
        {
            return Err(SchemaError::MissingDemographic((*missing).to_string()));
        }

        Ok(Self { names })
    }

    /// Schema taken as-is, skipping validation. Stands in for a stale or
    /// hand-edited export in tests.
    #[cfg(test)]
    pub(crate) fn unchecked<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Schema of the reference model: demographics followed by symptoms.
    #[must_use]
    pub fn reference() -> Self {
        let names = DEMOGRAPHIC_FEATURES
            .iter()
            .chain(REFERENCE_SYMPTOMS.iter())
            .map(|s| (*s).to_string())
            .collect();
        Self { names }
    }

    /// Feature names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a feature, if present.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Classify a feature name.
    #[must_use]
    pub fn kind_of(name: &str) -> FeatureKind {
        if DEMOGRAPHIC_FEATURES.contains(&name) {
            FeatureKind::Demographic
        } else {
            FeatureKind::Symptom
        }
    }

    /// Symptom partition, in schema order.
    pub fn symptoms(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|n| Self::kind_of(n) == FeatureKind::Symptom)
    }

    /// Whether `name` belongs to the symptom partition of this schema.
    #[must_use]
    pub fn is_symptom(&self, name: &str) -> bool {
        Self::kind_of(name) == FeatureKind::Symptom && self.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_schema_layout() {
        let schema = FeatureSchema::reference();
        assert_eq!(schema.len(), 40);
        assert_eq!(&schema.names()[..5], &DEMOGRAPHIC_FEATURES.map(String::from));
        assert_eq!(schema.symptoms().count(), 35);
        assert_eq!(schema.index_of("abdominal_pain"), Some(5));
        assert_eq!(schema.index_of("weight_loss"), Some(39));
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = FeatureSchema::new([
            "age",
            "gender",
            "region",
            "duration_days",
            "comorbidity",
            "fever",
            "fever",
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::Duplicate("fever".into()));
    }

    #[test]
    fn test_rejects_missing_demographic() {
        let err = FeatureSchema::new(["age", "gender", "region", "fever"]).unwrap_err();
        assert_eq!(err, SchemaError::MissingDemographic("duration_days".into()));
        assert_eq!(
            FeatureSchema::new(Vec::<String>::new()).unwrap_err(),
            SchemaError::Empty
        );
    }

    #[test]
    fn test_symptom_partition() {
        let schema = FeatureSchema::reference();
        assert!(schema.is_symptom("fever"));
        assert!(!schema.is_symptom("age"));
        assert!(!schema.is_symptom("sneezing"));
        assert_eq!(FeatureSchema::kind_of("region"), FeatureKind::Demographic);
    }
}
