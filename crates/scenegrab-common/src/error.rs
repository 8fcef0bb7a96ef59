//! Common error types used throughout scenegrab.
//!
//! Library crates return this error; the binary wraps it in `anyhow`.

/// Common error type for scenegrab.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested item was not found.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// A ledger storage operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required credential is missing.
    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new MissingCredential error.
    pub fn missing_credential<S: Into<String>>(name: S) -> Self {
        Self::MissingCredential(name.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
