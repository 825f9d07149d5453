//! Error types for Fable Core

use thiserror::Error;

/// Result type alias using FableError
pub type Result<T> = std::result::Result<T, FableError>;

/// Top-level error taxonomy for all Fable operations
///
/// Every user-facing failure carries a structured reason; `Internal` is the
/// one variant whose detail must never reach a client.
#[derive(Debug, Error)]
pub enum FableError {
    /// A referenced entity is absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// No session token was presented on a protected operation
    #[error("authentication required")]
    Unauthenticated,

    /// A credential failed to verify: bad login, or a malformed,
    /// tampered or expired session token
    #[error("invalid credentials")]
    InvalidCredential,

    /// Authenticated, but not authorized for the target resource
    #[error("{0}")]
    Forbidden(&'static str),

    /// A required field is missing or empty
    #[error("{0}")]
    Validation(String),

    /// A uniqueness constraint was violated (duplicate username)
    #[error("{0}")]
    Conflict(String),

    /// Storage failure, including a cascade that failed mid-flight
    #[error("internal error: {0}")]
    Internal(String),
}

impl FableError {
    /// Stable machine-readable tag for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            FableError::NotFound(_) => "not_found",
            FableError::Unauthenticated => "unauthenticated",
            FableError::InvalidCredential => "invalid_credential",
            FableError::Forbidden(_) => "forbidden",
            FableError::Validation(_) => "validation",
            FableError::Conflict(_) => "conflict",
            FableError::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for FableError {
    fn from(e: std::io::Error) -> Self {
        FableError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for FableError {
    fn from(e: serde_json::Error) -> Self {
        FableError::Internal(e.to_string())
    }
}
