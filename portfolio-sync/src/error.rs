//! Error types for the sync engine and its clients

use portfolio_core::MutationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local cache could not be written
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server answered 2xx with a body that is not a portfolio document
    #[error("Undecodable remote document: {0}")]
    Decode(String),

    /// Server returned a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Upload relay rejected the image
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Image could not be decoded or re-encoded
    #[error("Image error: {0}")]
    Image(String),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Store was opened outside a Tokio runtime
    #[error("No Tokio runtime available for background sync")]
    NoRuntime,

    /// Startup reconciliation already ran for this store
    #[error("Store already loaded")]
    AlreadyLoaded,
}

impl From<image::ImageError> for SyncError {
    fn from(e: image::ImageError) -> Self {
        SyncError::Image(e.to_string())
    }
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
