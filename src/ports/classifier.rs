//! Classifier port: Trait for the pre-fitted multiclass model.
//!
//! The model is an opaque artifact. The pipeline only relies on its class
//! list, its expected input width, and the two prediction calls.

use crate::domain::EncodedVector;

/// Errors raised by a classifier implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Probability estimation not supported by this model")]
    ProbabilityUnsupported,

    #[error("Input has {got} features, model expects {expected}")]
    InputWidth { expected: usize, got: usize },

    #[error("Prediction failed: {0}")]
    Failed(String),
}

/// Trait for a trained multiclass classifier.
///
/// Implementations must be immutable after construction; they are shared by
/// every concurrent inference call.
pub trait Classifier: Send + Sync {
    /// Class labels in the model's native order.
    ///
    /// `predict_proba` returns probabilities aligned with this list.
    fn classes(&self) -> &[String];

    /// Number of input features the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predict a single label.
    ///
    /// # Errors
    /// Returns error if the input cannot be evaluated.
    fn predict(&self, input: &EncodedVector) -> Result<String, ClassifierError>;

    /// Estimate the probability of every class in [`Classifier::classes`] order.
    ///
    /// # Errors
    /// Returns `ProbabilityUnsupported` by default.
    fn predict_proba(&self, _input: &EncodedVector) -> Result<Vec<f64>, ClassifierError> {
        Err(ClassifierError::ProbabilityUnsupported)
    }
}
