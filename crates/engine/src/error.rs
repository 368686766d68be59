use thiserror::Error;

/// Recoverable grid-operation failures. Every variant leaves the table
/// unchanged, so the caller can surface the error and keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no cell origin at ({row}, {col})")]
    NotFound { row: usize, col: usize },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
