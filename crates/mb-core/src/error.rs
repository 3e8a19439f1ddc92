//! # AppError
//!
//! Centralized error handling for the message board.
//! Credential mismatches and already-deleted replies are not errors; they are
//! reported through [`crate::models::Outcome`].

use thiserror::Error;

/// The primary error type for all mb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// No thread (or reply) matched the given id on that board.
    #[error("{0}")]
    NotFound(String),

    /// Malformed input (e.g., bad board name, unparseable id)
    #[error("{0}")]
    ValidationError(String),

    /// A write that should have touched exactly one document did not,
    /// or the store failed to acknowledge it in time.
    #[error("{0}")]
    Internal(String),

    /// Infrastructure failure (e.g., DB down, constraint violation)
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// A specialized Result type for message board logic.
pub type Result<T> = std::result::Result<T, AppError>;
