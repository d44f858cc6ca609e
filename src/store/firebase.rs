//! Realtime Database REST backend.
//!
//! Reads and writes go to `{database_url}/{path}.json`. Subscriptions use the
//! server-sent-events endpoint of the same URL, which streams `put` and
//! `patch` events carrying `{"path": "/sub/path", "data": ...}` relative to
//! the watched node.

use super::interface::{StoreError, ThemeStore, ValueStream};
use super::tree;
use crate::utils::{request_with_retry, RetryPolicy};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct FirebaseStore {
    client: Client,
    stream_client: Client,
    database_url: String,
    auth_token: Option<String>,
    retry: RetryPolicy,
}

/// Payload of a `put`/`patch` event.
#[derive(Debug, Deserialize)]
struct StreamEvent {
    path: String,
    data: Value,
}

impl FirebaseStore {
    pub fn new(database_url: String, auth_token: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        // A whole-request timeout would cut long-lived event streams.
        let stream_client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            stream_client,
            database_url: database_url.trim_end_matches('/').to_string(),
            auth_token,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> Result<String, StoreError> {
        let segs = tree::segments(path)?;
        Ok(format!("{}/{}.json", self.database_url, segs.join("/")))
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        self.auth_token
            .iter()
            .map(|token| ("auth", token.clone()))
            .collect()
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, StoreError> {
        let url = self.url(path)?;
        let query = self.query();
        let response = request_with_retry(
            || {
                let mut req = self.client.request(method.clone(), &url).query(&query);
                if let Some(body) = body {
                    req = req.json(body);
                }
                req.send()
            },
            self.retry,
        )
        .await
        .map_err(StoreError::Unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Payload(e.to_string()))
    }
}

#[async_trait]
impl ThemeStore for FirebaseStore {
    fn id(&self) -> &str {
        "firebase"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let value = self.send_json(reqwest::Method::GET, path, None).await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.send_json(reqwest::Method::PUT, path, Some(&value))
            .await
            .map(|_| ())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let reply = self
            .send_json(reqwest::Method::POST, path, Some(&value))
            .await?;
        reply
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Payload(format!("push reply without name: {}", reply)))
    }

    async fn subscribe(&self, path: &str) -> Result<ValueStream, StoreError> {
        let url = self.url(path)?;
        let response = self
            .stream_client
            .get(&url)
            .query(&self.query())
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, body });
        }

        let watched = path.to_string();
        let stream = response
            .bytes_stream()
            .eventsource()
            .scan(Value::Null, move |snapshot, event| {
                let step = match event {
                    Ok(event) => match apply_stream_event(snapshot, &event.event, &event.data) {
                        Ok(changed) => Some(changed.then(|| snapshot.clone())),
                        Err(reason) => {
                            tracing::warn!("[Store] Subscription to {} ended: {}", watched, reason);
                            None
                        }
                    },
                    Err(e) => {
                        tracing::warn!("[Store] Event stream error on {}: {}", watched, e);
                        None
                    }
                };
                futures::future::ready(step)
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(stream))
    }

    fn server_timestamp(&self) -> Value {
        json!({ ".sv": "timestamp" })
    }

    async fn increment(&self, path: &str, delta: i64) -> Result<i64, StoreError> {
        let reply = self
            .send_json(
                reqwest::Method::PUT,
                path,
                Some(&json!({ ".sv": { "increment": delta } })),
            )
            .await?;
        Ok(reply.as_i64().unwrap_or(delta))
    }
}

/// Fold one stream event into the local snapshot.
/// `Ok(true)` when the snapshot changed, `Ok(false)` for keep-alives, `Err`
/// when the server closed the subscription.
fn apply_stream_event(snapshot: &mut Value, kind: &str, data: &str) -> Result<bool, String> {
    match kind {
        "put" | "patch" => {
            let event: StreamEvent =
                serde_json::from_str(data).map_err(|e| format!("bad {} payload: {}", kind, e))?;
            let segs = tree::segments(&event.path).map_err(|e| e.to_string())?;
            if kind == "put" {
                tree::write(snapshot, &segs, event.data);
            } else {
                match event.data {
                    Value::Object(patch) => tree::merge(snapshot, &segs, patch),
                    other => tree::write(snapshot, &segs, other),
                }
            }
            Ok(true)
        }
        "keep-alive" => Ok(false),
        "cancel" => Err("cancelled by security rules".to_string()),
        "auth_revoked" => Err("auth token revoked".to_string()),
        other => {
            tracing::debug!("[Store] Ignoring stream event '{}'", other);
            Ok(false)
        }
    }
}
