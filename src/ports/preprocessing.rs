//! Preprocessing ports: fitted categorical encoders and the numeric scaler.

/// Errors raised by a categorical encoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("Category {0:?} was not seen during fitting")]
    UnseenCategory(String),
}

/// Errors raised by a numeric scaler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalingError {
    #[error("Scaler expects {expected} values, got {got}")]
    Width { expected: usize, got: usize },

    #[error("Scaler produced a non-finite value for column {0}")]
    NonFinite(String),
}

/// A fitted mapping from category labels to integer codes, for one column.
pub trait CategoricalEncoder: Send + Sync {
    /// Code for `value`.
    ///
    /// # Errors
    /// Returns `UnseenCategory` if the value was never fitted.
    fn transform(&self, value: &str) -> Result<i64, EncodingError>;

    /// Fitted labels in code order.
    fn classes(&self) -> &[String];
}

/// A fitted transform over the numeric columns.
pub trait NumericScaler: Send + Sync {
    /// Columns the scaler was fitted on, in input order.
    fn columns(&self) -> &[String];

    /// Transform one row of values ordered as [`NumericScaler::columns`].
    ///
    /// # Errors
    /// Returns error if the row does not fit the scaler.
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ScalingError>;
}
