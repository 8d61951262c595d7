use thiserror::Error;

use shared_database::StoreError;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification service not configured: {0}")]
    NotConfigured(String),

    #[error("Notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification gateway rejected the message ({status}): {body}")]
    Gateway { status: u16, body: String },

    #[error("No recipient for booking {0}")]
    MissingRecipient(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
