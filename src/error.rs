//! Error types for the monthcast library.

use crate::core::Month;
use thiserror::Error;

/// Result type alias for transformation and forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during transformation and forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// A raw column is absent from the dataset. Always fatal, never a gap.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Input value or parameter is unusable (e.g. reverse-transforming NaN).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reverse transformation requires a base value that is not present.
    #[error("missing base value for column '{column}' at {month}")]
    MissingBaseValue { column: String, month: Month },

    /// A regressor value required by the forecast loop is not present.
    #[error("missing regressor value for column '{column}' at {month}")]
    MissingRegressor { column: String, month: Month },

    /// Not enough usable observations for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The regressor matrix is singular or rank-deficient.
    #[error("singular regressor matrix: {0}")]
    SingularMatrix(String),

    /// Malformed estimation or forecast window.
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// A diagnostics sink failed to record an artifact.
    #[error("diagnostics error: {0}")]
    Diagnostics(String),
}
