//! Error types for the record migrator

use thiserror::Error;

/// Fatal errors raised by the transformation pipeline.
///
/// Any of these aborts the migration of the whole record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Required legacy field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Malformed legacy field '{field}': {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("Cannot migrate {field}: key '{key}' written twice")]
    Collision { field: &'static str, key: String },
}

impl TransformError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        TransformError::Malformed {
            field,
            reason: reason.into(),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Duplicate rows (inclusion requests) surface as conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for pipeline steps
pub type TransformResult<T> = Result<T, TransformError>;
