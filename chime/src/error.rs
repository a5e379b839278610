//! Error types

use thiserror::Error;

/// Machine-readable error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Caller-supplied data violated a precondition. Reported synchronously
    /// from validation, never from the running loop.
    Invalid,
    /// Unexpected programming-level failure. A defect, not a recoverable
    /// condition.
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Invalid => "invalid",
            ErrorCode::Internal => "internal",
        }
    }
}

/// Errors surfaced by event validation and clock plumbing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid: {0}")]
    Invalid(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// Build an `invalid` error with a human-readable reason.
    pub fn invalid(description: impl Into<String>) -> Self {
        Error::Invalid(description.into())
    }

    /// Build an `internal` error with a human-readable reason.
    pub fn internal(description: impl Into<String>) -> Self {
        Error::Internal(description.into())
    }

    /// Get the machine-readable class of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Invalid(_) => ErrorCode::Invalid,
            Error::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Check if this is a validation error
    pub fn is_invalid(&self) -> bool {
        matches!(self, Error::Invalid(_))
    }
}

/// Result type alias for chime errors
pub type Result<T, E = Error> = std::result::Result<T, E>;
