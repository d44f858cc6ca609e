use crate::store::{StoreError, ThemeStore, ValueStream};
use crate::widget::positioning::{ContainerMetrics, Rect};
use crate::widget::render::{WidgetEvent, WidgetRenderer};
use crate::widget::session::WidgetSession;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

// ── Renderer double ─────────────────────────────────────────

/// Keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<WidgetEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<WidgetEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&WidgetEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    pub fn highlights(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                WidgetEvent::Highlight { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }
}

impl WidgetRenderer for RecordingRenderer {
    fn render(&self, event: &WidgetEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Store double ────────────────────────────────────────────

/// Store whose every call fails as if the network were down.
pub struct UnreachableStore;

#[async_trait]
impl ThemeStore for UnreachableStore {
    fn id(&self) -> &str {
        "unreachable"
    }

    async fn get(&self, _path: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _path: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn push(&self, _path: &str, _value: Value) -> Result<String, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn subscribe(&self, _path: &str) -> Result<ValueStream, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

// ── Session setup ───────────────────────────────────────────

pub const CONTAINER: ContainerMetrics = ContainerMetrics {
    width: 1000.0,
    height: 600.0,
    padding: 20.0,
};

/// Two rows of five 180px boxes.
pub fn grid_rects(count: usize) -> Vec<Rect> {
    (0..count)
        .map(|i| Rect {
            left: 20.0 + (i % 5) as f64 * 190.0,
            top: 20.0 + (i / 5) as f64 * 190.0,
            width: 180.0,
            height: 180.0,
        })
        .collect()
}

pub fn image_url(i: usize) -> String {
    format!("https://cdn.example/prize{}.png", i)
}

/// Ten-box session with no images, seeded for a reproducible winner.
pub fn empty_session() -> (WidgetSession, Arc<RecordingRenderer>) {
    let renderer = Arc::new(RecordingRenderer::default());
    let session = WidgetSession::with_seed(10, renderer.clone(), 42);
    (session, renderer)
}

/// Ten-box session where every box has an image.
pub async fn stocked_session() -> (WidgetSession, Arc<RecordingRenderer>) {
    let (session, renderer) = empty_session();
    for i in 0..10 {
        session.set_image(i, &image_url(i)).await.unwrap();
    }
    (session, renderer)
}
