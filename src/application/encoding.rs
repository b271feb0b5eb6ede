//! Preprocessing stage: categorical encoding and numeric scaling.
//!
//! Both steps are fallible per column but never fail the inference. An
//! encoder that is missing or rejects a value yields code 0; a scaler that is
//! missing or fails leaves the numeric values unscaled. Every fallback is
//! recorded so callers can tell a degraded result from a clean one.

use std::collections::BTreeMap;

use crate::domain::{EncodedVector, EncodingOutcome, RawRecord, RawValue, ScalingOutcome};
use crate::ports::{CategoricalEncoder, NumericScaler};

/// Encoded model input plus what happened while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub vector: EncodedVector,
    /// One outcome per categorical column, in record order
    pub encoding: Vec<EncodingOutcome>,
    pub scaling: ScalingOutcome,
}

/// Encode one categorical value.
#[must_use]
pub fn encode_category(
    column: &str,
    value: &str,
    encoder: Option<&dyn CategoricalEncoder>,
) -> EncodingOutcome {
    let Some(encoder) = encoder else {
        tracing::warn!("No encoder fitted for column {column}; using code 0");
        return EncodingOutcome::EncoderMissing {
            column: column.to_string(),
        };
    };

    match encoder.transform(value) {
        Ok(code) => EncodingOutcome::Encoded {
            column: column.to_string(),
            code,
        },
        Err(e) => {
            tracing::warn!("Encoding fallback for column {column}: {e}");
            EncodingOutcome::UnseenCategory {
                column: column.to_string(),
                value: value.to_string(),
            }
        }
    }
}

/// Scale the scaler's columns of `values` in place.
///
/// `values` must be laid out like `record`. On any failure `values` is left
/// untouched.
pub fn scale_numeric(
    record: &RawRecord,
    values: &mut [f64],
    scaler: Option<&dyn NumericScaler>,
) -> ScalingOutcome {
    let Some(scaler) = scaler else {
        tracing::warn!("No scaler available; numeric features left unscaled");
        return ScalingOutcome::ScalerMissing;
    };

    let mut positions = Vec::with_capacity(scaler.columns().len());
    for column in scaler.columns() {
        match record.names().position(|n| n == column.as_str()) {
            Some(pos) => positions.push(pos),
            None => {
                return scaling_failed(format!("column {column} is not part of the record"));
            }
        }
    }

    let input: Vec<f64> = positions.iter().map(|&i| values[i]).collect();
    match scaler.transform(&input) {
        Ok(scaled) if scaled.len() == positions.len() => {
            for (pos, v) in positions.into_iter().zip(scaled) {
                values[pos] = v;
            }
            ScalingOutcome::Scaled
        }
        Ok(scaled) => scaling_failed(format!(
            "scaler returned {} values for {} columns",
            scaled.len(),
            positions.len()
        )),
        Err(e) => scaling_failed(e.to_string()),
    }
}

fn scaling_failed(reason: String) -> ScalingOutcome {
    tracing::warn!("Scaling fallback: {reason}");
    ScalingOutcome::Failed { reason }
}

/// Turn a raw record into the numeric vector the classifier consumes.
///
/// Integers and indicators pass through as numbers, categories go through
/// their column's encoder, then the scaler runs over its columns.
#[must_use]
pub fn encode_record(
    record: &RawRecord,
    encoders: &BTreeMap<String, Box<dyn CategoricalEncoder>>,
    scaler: Option<&dyn NumericScaler>,
) -> EncodedRecord {
    let mut values = Vec::with_capacity(record.len());
    let mut encoding = Vec::new();

    for (name, value) in record.iter() {
        match value {
            RawValue::Category(category) => {
                let encoder = encoders.get(name).map(AsRef::as_ref);
                let outcome = encode_category(name, category, encoder);
                values.push(outcome.code() as f64);
                encoding.push(outcome);
            }
            RawValue::Integer(v) => values.push(*v as f64),
            RawValue::Indicator(v) => values.push(f64::from(*v)),
        }
    }

    let scaling = scale_numeric(record, &mut values, scaler);

    EncodedRecord {
        vector: EncodedVector::new(values),
        encoding,
        scaling,
    }
}
