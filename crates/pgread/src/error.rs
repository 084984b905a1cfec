//! Error types for pgread

use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result type alias for pgread operations
pub type ReadResult<T> = Result<T, ReadError>;

/// Error types for read operations
#[derive(Debug, Error)]
pub enum ReadError {
    /// Malformed caller input, naming the offending field
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// Well-formed input that violates a cross-field rule
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Raw statement rejected by the read-only gate
    #[error("Query constraint violation: {0}")]
    QueryConstraint(String),

    /// Any failure reported by the store, unchanged
    #[error("Backend error: {0}")]
    Backend(#[from] tokio_postgres::Error),

    /// Cell decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl ReadError {
    /// Create a validation error for a specific field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a constraint error
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint(message.into())
    }

    /// Create a query constraint error
    pub fn query_constraint(message: impl Into<String>) -> Self {
        Self::QueryConstraint(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Name of the offending field, for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    pub fn is_query_constraint(&self) -> bool {
        matches!(self, Self::QueryConstraint(_))
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// SQLSTATE reported by the server, if this is a backend error carrying one
    pub fn sql_state(&self) -> Option<&SqlState> {
        match self {
            Self::Backend(err) => err.code(),
            _ => None,
        }
    }

    /// Column used outside an aggregate without being grouped (42803)
    pub fn is_grouping_error(&self) -> bool {
        self.sql_state() == Some(&SqlState::GROUPING_ERROR)
    }

    /// Statement issued inside an aborted transaction (25P02)
    pub fn is_in_failed_transaction(&self) -> bool {
        self.sql_state() == Some(&SqlState::IN_FAILED_SQL_TRANSACTION)
    }
}
