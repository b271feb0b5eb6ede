//! Patient input types: demographic fields and the symptom checklist.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Gender options offered by the intake form.
pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];

/// Region options offered by the intake form.
pub const REGIONS: [&str; 7] = [
    "Punjab",
    "Sindh",
    "Khyber Pakhtunkhwa",
    "Balochistan",
    "Islamabad",
    "Gilgit-Baltistan",
    "Azad Kashmir",
];

/// Pre-existing condition options offered by the intake form.
pub const COMORBIDITIES: [&str; 6] = [
    "None",
    "Diabetes",
    "Hypertension",
    "Chronic Lung Disease",
    "HIV",
    "Heart Disease",
];

/// Self-reported demographic fields.
///
/// Category strings are used verbatim; they are expected to come from the
/// same closed sets the encoders were fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    /// Age in years (1-120)
    pub age: u32,

    pub gender: String,

    pub region: String,

    /// How long symptoms have lasted, in days (1-30)
    pub duration_days: u32,

    /// Pre-existing condition, `"None"` when absent
    pub comorbidity: String,
}

impl Demographics {
    /// Validate ranges of the numeric fields and presence of the category fields.
    ///
    /// Category membership is deliberately not checked here: unknown
    /// categories are handled by the encoder fallback.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(1..=120).contains(&self.age) {
            errors.push(format!("Age {} out of range [1, 120]", self.age));
        }
        if !(1..=30).contains(&self.duration_days) {
            errors.push(format!(
                "Symptom duration {} days out of range [1, 30]",
                self.duration_days
            ));
        }
        for (field, value) in [
            ("gender", &self.gender),
            ("region", &self.region),
            ("comorbidity", &self.comorbidity),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{field} must not be empty"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Unordered, duplicate-free set of present symptoms.
///
/// Backed by a `BTreeSet` so iteration order never depends on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymptomSet(BTreeSet<String>);

impl SymptomSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symptom. Returns `false` if it was already present.
    pub fn insert(&mut self, symptom: impl Into<String>) -> bool {
        self.0.insert(symptom.into())
    }

    #[must_use]
    pub fn contains(&self, symptom: &str) -> bool {
        self.0.contains(symptom)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-joined form used in report records.
    #[must_use]
    pub fn to_csv(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }

    /// Parse the comma-joined form back into a set.
    #[must_use]
    pub fn from_csv(csv: &str) -> Self {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for SymptomSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
