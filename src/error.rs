//! Error and diagnostic types for u-params.
//!
//! Two kinds of condition exist:
//!
//! - [`ParamsError`] — fatal, returned through `Result`. Malformed arguments,
//!   shape violations, unknown required columns.
//! - [`Diagnostic`] — non-fatal. Processing continues with best-effort
//!   semantics and the diagnostic is returned alongside the result.

use serde::Serialize;
use thiserror::Error;

/// All errors produced by u-params operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    /// A parameter value is outside its valid domain.
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// Dimension mismatch between related inputs.
    #[error("expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A required column is absent.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },

    /// Column is not numeric where numeric data is required.
    #[error("column '{column}' is not numeric")]
    NonNumericColumn { column: String },

    /// Insufficient data for the requested operation.
    #[error("need at least {min_required} values, got {actual}")]
    InsufficientData { min_required: usize, actual: usize },
}

impl ParamsError {
    pub(crate) fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Non-fatal condition reported while processing continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A requested column does not exist and was skipped.
    ColumnNotFound { name: String },
    /// A non-numeric column was recoded to zero-based integers.
    CategoricalRecoded { column: String, levels: usize },
    /// A column's output name is already taken by an earlier output; the
    /// column was skipped.
    OutputNameCollision { column: String, name: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnNotFound { name } => {
                write!(f, "column '{name}' not found, skipped")
            }
            Self::CategoricalRecoded { column, levels } => {
                write!(
                    f,
                    "column '{column}' is not numeric, recoded {levels} levels to 0..{levels}"
                )
            }
            Self::OutputNameCollision { column, name } => {
                write!(f, "output name '{name}' for column '{column}' already used, skipped")
            }
        }
    }
}
