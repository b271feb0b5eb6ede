//! Classifier adapter: normalizes a fitted classifier's output.

use crate::domain::{EncodedVector, ProbabilityOutcome};
use crate::ports::{Classifier, ClassifierError};
use crate::MediaidError;

/// What the classifier produced for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutput {
    /// Only a hard label is available
    Labeled(String),
    /// Probability per class, aligned with `labels`
    Distributed {
        labels: Vec<String>,
        probabilities: Vec<f64>,
    },
}

/// Wraps a [`Classifier`] and decides between a distribution and a hard
/// label.
pub struct ClassifierAdapter {
    inner: Box<dyn Classifier>,
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("classes", &self.inner.classes())
            .field("n_features", &self.inner.n_features())
            .finish()
    }
}

impl ClassifierAdapter {
    /// # Errors
    /// Returns `ArtifactInvalid` if the classifier has no classes.
    pub fn new(inner: Box<dyn Classifier>) -> Result<Self, MediaidError> {
        if inner.classes().is_empty() {
            return Err(MediaidError::ArtifactInvalid(
                "classifier has no classes".to_string(),
            ));
        }
        Ok(Self { inner })
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        self.inner.classes()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.inner.n_features()
    }

    /// Classify one encoded vector.
    ///
    /// A usable probability vector yields [`ClassifierOutput::Distributed`].
    /// If probabilities are unsupported, fail, or do not line up with the
    /// classes, the hard label is returned instead and the reason recorded.
    ///
    /// # Errors
    /// Returns `Prediction` if the classifier cannot produce even a label.
    pub fn classify(
        &self,
        input: &EncodedVector,
    ) -> Result<(ClassifierOutput, ProbabilityOutcome), MediaidError> {
        let label = self
            .inner
            .predict(input)
            .map_err(|e| MediaidError::Prediction(e.to_string()))?;

        let reason = match self.inner.predict_proba(input) {
            Ok(probabilities) => match self.check_distribution(&probabilities) {
                Ok(()) => {
                    let output = ClassifierOutput::Distributed {
                        labels: self.inner.classes().to_vec(),
                        probabilities,
                    };
                    return Ok((output, ProbabilityOutcome::Distributed));
                }
                Err(reason) => reason,
            },
            Err(ClassifierError::ProbabilityUnsupported) => {
                "classifier does not estimate probabilities".to_string()
            }
            Err(e) => e.to_string(),
        };

        tracing::warn!("Probability fallback, reporting hard label only: {reason}");
        Ok((
            ClassifierOutput::Labeled(label),
            ProbabilityOutcome::Unsupported { reason },
        ))
    }

    fn check_distribution(&self, probabilities: &[f64]) -> Result<(), String> {
        let expected = self.inner.classes().len();
        if probabilities.len() != expected {
            return Err(format!(
                "got {} probabilities for {expected} classes",
                probabilities.len()
            ));
        }
        if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err("probabilities must be finite and non-negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::linear::SoftmaxLinearModel;

    struct Fixed {
        classes: Vec<String>,
        proba: Result<Vec<f64>, ClassifierError>,
    }

    impl Classifier for Fixed {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn n_features(&self) -> usize {
            1
        }

        fn predict(&self, _input: &EncodedVector) -> Result<String, ClassifierError> {
            Ok(self.classes[0].clone())
        }

        fn predict_proba(&self, _input: &EncodedVector) -> Result<Vec<f64>, ClassifierError> {
            self.proba.clone()
        }
    }

    fn fixed(proba: Result<Vec<f64>, ClassifierError>) -> ClassifierAdapter {
        ClassifierAdapter::new(Box::new(Fixed {
            classes: vec!["A".into(), "B".into()],
            proba,
        }))
        .expect("Should wrap")
    }

    fn x() -> EncodedVector {
        EncodedVector::new(vec![0.0])
    }

    #[test]
    fn test_distribution_passed_through() {
        let (output, outcome) = fixed(Ok(vec![0.3, 0.7])).classify(&x()).expect("Should classify");
        assert_eq!(outcome, ProbabilityOutcome::Distributed);
        assert_eq!(
            output,
            ClassifierOutput::Distributed {
                labels: vec!["A".into(), "B".into()],
                probabilities: vec![0.3, 0.7],
            }
        );
    }

    #[test]
    fn test_unsupported_probability_degrades_to_label() {
        let (output, outcome) = fixed(Err(ClassifierError::ProbabilityUnsupported))
            .classify(&x())
            .expect("Should classify");
        assert_eq!(output, ClassifierOutput::Labeled("A".into()));
        assert!(matches!(outcome, ProbabilityOutcome::Unsupported { .. }));
    }

    #[test]
    fn test_malformed_distribution_degrades_to_label() {
        for proba in [vec![1.0], vec![f64::NAN, 0.5], vec![-0.1, 1.1]] {
            let (output, _) = fixed(Ok(proba)).classify(&x()).expect("Should classify");
            assert_eq!(output, ClassifierOutput::Labeled("A".into()));
        }
    }

    #[test]
    fn test_predict_failure_is_an_error() {
        let model = SoftmaxLinearModel {
            classes: vec!["A".into()],
            coefficients: vec![vec![1.0, 1.0]],
            intercepts: vec![0.0],
            supports_probability: true,
        };
        let adapter = ClassifierAdapter::new(Box::new(model)).expect("Should wrap");
        let err = adapter.classify(&x()).expect_err("Width mismatch should fail");
        assert!(matches!(err, MediaidError::Prediction(_)));
    }

    #[test]
    fn test_more_weight_rows_than_classes_is_an_error() {
        let model = SoftmaxLinearModel {
            classes: vec!["A".into()],
            coefficients: vec![vec![0.0], vec![5.0]],
            intercepts: vec![0.0, 0.0],
            supports_probability: true,
        };
        let adapter = ClassifierAdapter::new(Box::new(model)).expect("Should wrap");
        let err = adapter
            .classify(&EncodedVector::new(vec![1.0]))
            .expect_err("Inconsistent model should fail");
        assert!(matches!(err, MediaidError::Prediction(_)));
    }

    #[test]
    fn test_rejects_classifier_without_classes() {
        let empty = Fixed {
            classes: Vec::new(),
            proba: Ok(Vec::new()),
        };
        assert!(ClassifierAdapter::new(Box::new(empty)).is_err());
    }
}
