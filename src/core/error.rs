use rusqlite;
use std::io;
use thiserror::Error;

/// Crate-wide error type. Domain failures are typed so the calling layer can
/// map them to its own surface (HTTP status, exit code, login prompt);
/// store-level failures surface as the SQLite/IO variants and are never
/// retried here.
#[derive(Error, Debug)]
pub enum BiopageError {
    /// No verified actor was supplied for an operation that requires one.
    #[error("Unauthenticated: this operation requires a signed-in actor")]
    Unauthenticated,
    /// The actor is verified but does not own the target resource.
    #[error("Unauthorized: actor does not own this {0}")]
    Unauthorized(&'static str),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid username: {0}")]
    UsernameInvalid(String),
    #[error("Username is already taken: {0}")]
    UsernameTaken(String),
    #[error("Profile already exists for owner {0}")]
    ProfileAlreadyExists(String),
    /// Section content failed schema validation. `field` is the path of the
    /// offending field (e.g. `links[1].url`).
    #[error("Invalid content at `{field}`: {reason}")]
    InvalidContent { field: String, reason: String },
    #[error("Reorder mismatch: {0}")]
    ReorderMismatch(String),
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl BiopageError {
    pub fn invalid_content(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BiopageError::InvalidContent {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
