//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur while parsing or validating input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A header line could not be split into a name and a value.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
