//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures of the command model
/// (validation, decoding of stored data, lifecycle rules). Store and transport
/// concerns belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation before reaching the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A stored document could not be turned back into a domain value.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// An identifier was invalid (e.g. empty).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A lifecycle transition was attempted that is not strictly forward.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::Decoding(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
