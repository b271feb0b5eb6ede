//! Per-request feature records: the raw record before encoding and the
//! numeric vector handed to the classifier.

use serde::Serialize;

/// A single raw feature value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Integer demographic (age, duration_days)
    Integer(i64),
    /// Symptom indicator, 0 or 1
    Indicator(u8),
    /// Category string (gender, region, comorbidity)
    Category(String),
}

impl RawValue {
    /// Numeric view of the value; categories have none until encoded.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Indicator(v) => Some(f64::from(*v)),
            Self::Category(_) => None,
        }
    }

    #[must_use]
    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Category(s) => Some(s),
            _ => None,
        }
    }
}

/// Mapping from every schema name to its raw value, in schema order.
///
/// Only built by the feature vector builder, which guarantees exact schema
/// coverage. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    entries: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub(crate) fn from_entries(entries: Vec<(String, RawValue)>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fixed-length numeric vector in schema order; the only classifier input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedVector(Vec<f64>);

impl EncodedVector {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
