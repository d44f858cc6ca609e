use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable or the request never completed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid store payload: {0}")]
    Payload(String),
    #[error("invalid store path: {0}")]
    InvalidPath(String),
}

/// Stream of values observed at a subscribed path. `Value::Null` means the
/// node is currently absent.
pub type ValueStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

// ── Store Trait ────────────────────────────────────────

/// Key-value realtime document store holding the theme document, analytics
/// counters, admin logs and the device registry.
#[async_trait]
pub trait ThemeStore: Send + Sync {
    /// Backend identifier (e.g. "firebase", "memory").
    fn id(&self) -> &str;

    /// Read the value at `path`; `None` when absent.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite the value at `path`. Writing `null` deletes the node.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Append `value` under a generated, time-ordered child key and return it.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    /// Watch `path`. The current value is delivered first, then one item per change.
    async fn subscribe(&self, path: &str) -> Result<ValueStream, StoreError>;

    /// Value the backend resolves to its own clock when written.
    fn server_timestamp(&self) -> Value {
        Value::from(chrono::Utc::now().timestamp_millis())
    }

    /// Add `delta` to an integer counter. Default is read-modify-write.
    async fn increment(&self, path: &str, delta: i64) -> Result<i64, StoreError> {
        let current = self
            .get(path)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let next = current + delta;
        self.set(path, Value::from(next)).await?;
        Ok(next)
    }
}
