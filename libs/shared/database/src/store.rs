use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::{FirebaseClient, InMemoryStore, StoreError};

/// The value at a path, `None` when nothing is stored there.
pub type Snapshot = Option<Value>;

/// Path-addressed realtime document store.
///
/// Paths are slash separated (`bookings/{doctorId}/{bookingId}`). Writing
/// `null` or an empty object removes the node, exactly like the hosted
/// database does.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError>;

    /// Replace the whole value at `path`.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Shallow merge of `fields` into the node at `path`, applied as one write.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Create a child of `path` under a freshly generated, chronologically
    /// ordered key and return that key.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    /// Deliver the current value at `path` immediately, then again after every
    /// change under it, until the subscription is dropped.
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;
}

/// Hosted database when a URL is configured, otherwise a process-local tree.
pub fn store_from_config(config: &AppConfig) -> Arc<dyn RealtimeStore> {
    if config.is_firebase_configured() {
        info!("Using realtime database at {}", config.firebase_database_url);
        Arc::new(FirebaseClient::new(config))
    } else {
        warn!("FIREBASE_DATABASE_URL not set - using in-memory store, data is lost on exit");
        Arc::new(InMemoryStore::new())
    }
}

/// Live view of one path. Dropping it cancels the underlying listener.
pub struct Subscription {
    path: String,
    receiver: mpsc::UnboundedReceiver<Result<Snapshot, StoreError>>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn new(
        path: impl Into<String>,
        receiver: mpsc::UnboundedReceiver<Result<Snapshot, StoreError>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            path: path.into(),
            receiver,
            task,
        }
    }

    /// Next snapshot; `None` once the listener has stopped.
    pub async fn recv(&mut self) -> Option<Result<Snapshot, StoreError>> {
        self.receiver.recv().await
    }

    pub fn unsubscribe(self) {
        tracing::debug!("Unsubscribed from {}", self.path);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
