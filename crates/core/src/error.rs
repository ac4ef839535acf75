//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a synchronous, non-retryable rejection of the single call
/// that produced it. A call returning any of these has committed nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The caller lacks the privilege the operation requires (administrator
    /// flag for creation, current ownership for a sale).
    #[error("unauthorized")]
    Unauthorized,

    /// A record with the same caller-assigned identifier already exists.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// The operation targets a record that does not exist.
    #[error("not found")]
    NotFound,

    /// The record's current state forbids the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn duplicate_id(id: impl core::fmt::Display) -> Self {
        Self::DuplicateId(id.to_string())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Unauthorized => "unauthorized",
            DomainError::DuplicateId(_) => "duplicate_id",
            DomainError::NotFound => "not_found",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}
