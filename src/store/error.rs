//! Error types for document store operations.

use thiserror::Error;

/// Error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document to update does not exist.
    #[error("Document not found: {0}")]
    MissingDocument(String),

    /// A stored document holds data this crate cannot read.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The backend could not be reached or its lock was poisoned.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
