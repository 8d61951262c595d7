use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::push_id::PushIdGenerator;
use crate::store::{RealtimeStore, Snapshot, Subscription};
use crate::tree;
use crate::StoreError;

const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Process-local realtime store. Cloning yields another handle to the same
/// tree, so several services can share it the way several devices share the
/// hosted database.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    root: RwLock<Value>,
    changes: broadcast::Sender<Change>,
    push_ids: Mutex<PushIdGenerator>,
}

/// One mutation: where it happened and the whole tree right after it.
#[derive(Clone)]
struct Change {
    segments: Vec<String>,
    root: Arc<Value>,
}

impl StoreInner {
    async fn snapshot(&self, segments: &[String]) -> Snapshot {
        let root = self.root.read().await;
        tree::get(&root, segments).cloned()
    }

    /// Must be called with the write lock held so changes go out in the
    /// order they were applied.
    fn notify(&self, segments: Vec<String>, root: &Value) {
        debug!("Store changed at /{}", tree::join_path(&segments));
        // No receivers simply means nobody is subscribed.
        let _ = self.changes.send(Change {
            segments,
            root: Arc::new(root.clone()),
        });
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_data(Value::Null)
    }

    pub fn with_data(data: Value) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                root: RwLock::new(tree::prune(data)),
                changes,
                push_ids: Mutex::new(PushIdGenerator::new()),
            }),
        }
    }

    /// Copy of the whole tree.
    pub async fn dump(&self) -> Value {
        self.inner.root.read().await.clone()
    }

    fn next_push_id(&self) -> String {
        match self.inner.push_ids.lock() {
            Ok(mut generator) => generator.generate(),
            Err(poisoned) => poisoned.into_inner().generate(),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeStore for InMemoryStore {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        let segments = tree::split_path(path)?;
        Ok(self.inner.snapshot(&segments).await)
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = tree::split_path(path)?;
        let mut root = self.inner.root.write().await;
        tree::set(&mut root, &segments, value);
        self.inner.notify(segments, &root);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segments = tree::split_path(path)?;
        let mut root = self.inner.root.write().await;
        // Validate every key before touching the tree so a bad key leaves
        // the node unchanged.
        let mut staged = root.clone();
        tree::merge(&mut staged, &segments, fields)?;
        *root = staged;
        self.inner.notify(segments, &root);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.write(path, Value::Null).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let id = self.next_push_id();
        let child = if path.trim_matches('/').is_empty() {
            id.clone()
        } else {
            format!("{}/{}", path.trim_end_matches('/'), id)
        };
        self.write(&child, value).await?;
        Ok(id)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        let segments = tree::split_path(path)?;

        // Writers notify under the write lock, so listening while holding the
        // read lock means every change received comes after `initial`.
        let (mut changes, initial) = {
            let root = self.inner.root.read().await;
            (self.inner.changes.subscribe(), tree::get(&root, &segments).cloned())
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        // The receiver is still alive here, a send cannot fail.
        let _ = sender.send(Ok(initial.clone()));

        let inner = Arc::clone(&self.inner);
        let watched = segments.clone();
        let task = tokio::spawn(async move {
            let mut last = initial;
            loop {
                // Each change carries the tree as it was right after that
                // write, so back-to-back writes yield one snapshot each.
                let current = match changes.recv().await {
                    Ok(change) if !tree::overlaps(&change.segments, &watched) => continue,
                    Ok(change) => tree::get(&change.root, &watched).cloned(),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Subscriber for /{} lagged by {} changes, resyncing", tree::join_path(&watched), skipped);
                        inner.snapshot(&watched).await
                    }
                    Err(RecvError::Closed) => break,
                };

                if current == last {
                    continue;
                }
                if sender.send(Ok(current.clone())).is_err() {
                    break;
                }
                last = current;
            }
        });

        Ok(Subscription::new(tree::join_path(&segments), receiver, task))
    }
}
