//! Error types for the review desk.

use revdesk_core::ReviewError;

/// Errors produced by the workflow layer.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("feedback store error: {0}")]
    Store(#[from] tokio_rusqlite::Error),

    #[error("could not create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error in {path}: {message}")]
    Config { path: String, message: String },

    /// The persistence worker has shut down; nothing was retired.
    #[error("persistence worker is not running")]
    PersistenceClosed,

    #[error("review {0} has no failed persistence attempt to retry")]
    NothingToRetry(String),
}

/// Result type for desk operations.
pub type DeskResult<T> = std::result::Result<T, DeskError>;
