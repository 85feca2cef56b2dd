//! Error types for blobkeep

use serde::Serialize;
use thiserror::Error;

/// Result type alias for blobkeep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in blobkeep operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Bad credential for account: {0}")]
    BadCredential(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// An administrative update targeted an account that does not exist
    #[error("No such account: {0}")]
    AccountMissing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Classification of an operation result, independent of transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    NotFound,
    BadCredential,
    DuplicateAccount,
    ValidationFailure,
    StorageFailure,
}

impl Outcome {
    /// Classify a result without consuming it
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => e.outcome(),
        }
    }
}

impl Error {
    /// The taxonomy tier this error belongs to
    pub fn outcome(&self) -> Outcome {
        match self {
            Error::DuplicateAccount(_) => Outcome::DuplicateAccount,
            Error::NotFound(_) => Outcome::NotFound,
            Error::BadCredential(_) => Outcome::BadCredential,
            Error::Validation(_) => Outcome::ValidationFailure,
            Error::AccountMissing(_)
            | Error::Storage(_)
            | Error::Hashing(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Config(_)
            | Error::Task(_) => Outcome::StorageFailure,
        }
    }

    /// Whether the error is a recoverable, caller-facing failure.
    ///
    /// Hard failures must not leak their details past the process boundary.
    pub fn is_soft(&self) -> bool {
        self.outcome() != Outcome::StorageFailure
    }
}
