use super::interface::{StoreError, ThemeStore, ValueStream};
use super::tree;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Process-local store used in offline mode and by tests.
///
/// Every write publishes the written path on a broadcast channel; subscribers
/// re-read their node when a change overlaps it.
#[derive(Clone)]
pub struct InMemoryStore {
    root: Arc<RwLock<Value>>,
    changes: broadcast::Sender<String>,
    push_seq: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_root(Value::Null)
    }

    pub fn with_root(root: Value) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            root: Arc::new(RwLock::new(root)),
            changes,
            push_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Full copy of the document tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThemeStore for InMemoryStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segs = tree::segments(path)?;
        let root = self.root.read().await;
        Ok(tree::lookup(&root, &segs).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segs = tree::segments(path)?;
        {
            let mut root = self.root.write().await;
            tree::write(&mut root, &segs, value);
        }
        // No receivers is fine.
        let _ = self.changes.send(path.trim_matches('/').to_string());
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let seq = self.push_seq.fetch_add(1, Ordering::SeqCst);
        let key = format!("-m{:013}{:06}", chrono::Utc::now().timestamp_millis(), seq);
        let child = format!("{}/{}", path.trim_matches('/'), key);
        self.set(&child, value).await?;
        Ok(key)
    }

    async fn subscribe(&self, path: &str) -> Result<ValueStream, StoreError> {
        let watched: Vec<String> = tree::segments(path)?
            .into_iter()
            .map(str::to_string)
            .collect();
        let watched_path = watched.join("/");
        // Subscribe before reading so no change slips between the two.
        let rx = self.changes.subscribe();
        let initial = self.get(&watched_path).await?.unwrap_or(Value::Null);

        let root = self.root.clone();
        let updates = BroadcastStream::new(rx).filter_map(move |changed| {
            let root = root.clone();
            let watched = watched.clone();
            let watched_path = watched_path.clone();
            async move {
                let changed = changed.ok()?;
                if !tree::overlaps(&watched_path, &changed) {
                    return None;
                }
                let segs: Vec<&str> = watched.iter().map(String::as_str).collect();
                let guard = root.read().await;
                Some(tree::lookup(&guard, &segs).cloned().unwrap_or(Value::Null))
            }
        });

        Ok(Box::pin(futures::stream::once(async move { initial }).chain(updates)))
    }
}
