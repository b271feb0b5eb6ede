//! Linear classifier adapter: a multinomial (softmax) linear model exported
//! by the training pipeline.

use serde::{Deserialize, Serialize};

use crate::domain::EncodedVector;
use crate::ports::{Classifier, ClassifierError};

/// Model kinds the artifact loader understands.
///
/// Matches the JSON produced by the export step: `{"kind": "softmax_linear", ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedModel {
    SoftmaxLinear(SoftmaxLinearModel),
}

impl ExportedModel {
    /// Validate and turn the export into a classifier.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency found.
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, String> {
        match self {
            Self::SoftmaxLinear(model) => {
                model.check()?;
                Ok(Box::new(model))
            }
        }
    }
}

fn default_true() -> bool {
    true
}

/// One weight row and intercept per class; class order is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxLinearModel {
    pub classes: Vec<String>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    /// Exports without calibrated probabilities set this to false
    #[serde(default = "default_true")]
    pub supports_probability: bool,
}

impl SoftmaxLinearModel {
    /// Check shapes and values.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency found.
    pub fn check(&self) -> Result<(), String> {
        let k = self.classes.len();
        if k == 0 {
            return Err("model has no classes".into());
        }
        for (i, class) in self.classes.iter().enumerate() {
            if self.classes[..i].contains(class) {
                return Err(format!("duplicate class label {class:?}"));
            }
        }
        if self.coefficients.len() != k || self.intercepts.len() != k {
            return Err(format!(
                "model has {k} classes but {} coefficient rows and {} intercepts",
                self.coefficients.len(),
                self.intercepts.len()
            ));
        }
        let n = self.coefficients[0].len();
        if n == 0 || self.coefficients.iter().any(|row| row.len() != n) {
            return Err("coefficient rows must share a non-zero width".into());
        }
        if self
            .coefficients
            .iter()
            .flatten()
            .chain(&self.intercepts)
            .any(|v| !v.is_finite())
        {
            return Err("model parameters must be finite".into());
        }
        Ok(())
    }

    fn logits(&self, input: &EncodedVector) -> Result<Vec<f64>, ClassifierError> {
        let k = self.classes.len();
        if self.coefficients.len() != k || self.intercepts.len() != k {
            return Err(ClassifierError::Failed(format!(
                "model has {k} classes but {} coefficient rows and {} intercepts",
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }

        let x = input.as_slice();
        if x.len() != self.n_features() || self.coefficients.iter().any(|r| r.len() != x.len()) {
            return Err(ClassifierError::InputWidth {
                expected: self.n_features(),
                got: x.len(),
            });
        }

        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect();

        if logits.iter().any(|z| !z.is_finite()) {
            return Err(ClassifierError::Failed("non-finite decision value".into()));
        }
        Ok(logits)
    }
}

impl Classifier for SoftmaxLinearModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }

    fn predict(&self, input: &EncodedVector) -> Result<String, ClassifierError> {
        let logits = self.logits(input)?;

        // First maximum wins, so ties resolve to the earlier class.
        let mut best = 0;
        for (i, z) in logits.iter().enumerate().skip(1) {
            if *z > logits[best] {
                best = i;
            }
        }
        self.classes
            .get(best)
            .cloned()
            .ok_or_else(|| ClassifierError::Failed(format!("no class at index {best}")))
    }

    fn predict_proba(&self, input: &EncodedVector) -> Result<Vec<f64>, ClassifierError> {
        if !self.supports_probability {
            return Err(ClassifierError::ProbabilityUnsupported);
        }

        let logits = self.logits(input)?;
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        Ok(exp.into_iter().map(|e| e / total).collect())
    }
}
