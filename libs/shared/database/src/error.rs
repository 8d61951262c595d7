use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Subscription stream error: {0}")]
    Stream(String),
}
