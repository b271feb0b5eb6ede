//! Fitted preprocessing adapters: label encoders and a standard scaler.
//!
//! Both are exported by the training pipeline as plain JSON and follow the
//! scikit-learn conventions the model was trained with.

use serde::{Deserialize, Serialize};

use crate::ports::{CategoricalEncoder, EncodingError, NumericScaler, ScalingError};

/// Label encoder: the code of a category is its index in the fitted class list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }
}

impl CategoricalEncoder for LabelEncoder {
    fn transform(&self, value: &str) -> Result<i64, EncodingError> {
        self.classes
            .iter()
            .position(|c| c == value)
            .map(|i| i as i64)
            .ok_or_else(|| EncodingError::UnseenCategory(value.to_string()))
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Standard scaler: `(x - mean) / scale` per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler, checking that all parameter vectors agree in length.
    ///
    /// # Errors
    /// Returns a description of the inconsistency.
    pub fn new(columns: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        let scaler = Self {
            columns,
            mean,
            scale,
        };
        scaler.check()?;
        Ok(scaler)
    }

    /// Validate a deserialized scaler.
    ///
    /// # Errors
    /// Returns a description of the inconsistency.
    pub fn check(&self) -> Result<(), String> {
        let n = self.columns.len();
        if n == 0 {
            return Err("scaler has no columns".into());
        }
        if self.mean.len() != n || self.scale.len() != n {
            return Err(format!(
                "scaler parameter lengths (mean={}, scale={}) do not match {} columns",
                self.mean.len(),
                self.scale.len(),
                n
            ));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err("scaler parameters must be finite".into());
        }
        Ok(())
    }
}

impl NumericScaler for StandardScaler {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ScalingError> {
        if values.len() != self.columns.len() {
            return Err(ScalingError::Width {
                expected: self.columns.len(),
                got: values.len(),
            });
        }

        values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .zip(&self.columns)
            .map(|((x, (mean, scale)), column)| {
                // Zero-variance columns keep a unit scale, as scikit-learn does.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                let scaled = (x - mean) / scale;
                if scaled.is_finite() {
                    Ok(scaled)
                } else {
                    Err(ScalingError::NonFinite(column.clone()))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoder_codes() {
        let enc = LabelEncoder::new(["Female", "Male", "Other"]);
        assert_eq!(enc.transform("Female"), Ok(0));
        assert_eq!(enc.transform("Other"), Ok(2));
        assert_eq!(
            enc.transform("male"),
            Err(EncodingError::UnseenCategory("male".into()))
        );
    }

    #[test]
    fn test_label_encoder_json_is_plain_list() {
        let enc: LabelEncoder =
            serde_json::from_str(r#"["None", "Diabetes"]"#).expect("Should parse");
        assert_eq!(enc.classes(), &["None".to_string(), "Diabetes".to_string()]);
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler::new(
            vec!["age".into(), "duration_days".into()],
            vec![40.0, 5.0],
            vec![10.0, 0.0],
        )
        .expect("Should build");

        let out = scaler.transform(&[30.0, 7.0]).expect("Should scale");
        assert!((out[0] + 1.0).abs() < 1e-12);
        assert!((out[1] - 2.0).abs() < 1e-12);

        assert_eq!(
            scaler.transform(&[1.0]),
            Err(ScalingError::Width {
                expected: 2,
                got: 1
            })
        );
        assert!(matches!(
            scaler.transform(&[f64::INFINITY, 1.0]),
            Err(ScalingError::NonFinite(_))
        ));
    }

    #[test]
    fn test_scaler_rejects_inconsistent_parameters() {
        assert!(StandardScaler::new(vec!["age".into()], vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(StandardScaler::new(Vec::new(), Vec::new(), Vec::new()).is_err());
        assert!(StandardScaler::new(vec!["age".into()], vec![f64::NAN], vec![1.0]).is_err());
    }
}
