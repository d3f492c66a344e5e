//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Client-supplied data broke one or more documented constraints.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// The store rejected the operation on access-control grounds.
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The email provider rejected or failed a delivery.
    #[error("Email provider error: {0}")]
    Provider(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::not_found("Entity", "unknown"),
            RepoError::Constraint(msg) => Self::Duplicate(msg),
            RepoError::PermissionDenied(msg) => Self::Permission(msg),
            RepoError::Connection(msg) | RepoError::Query(msg) => Self::Backend(msg),
        }
    }
}
