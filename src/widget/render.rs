use super::model::{BoxPosition, DragMode, SpinResult};
use crate::player::PlayerCard;
use serde::Serialize;

/// Where the applied layout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSource {
    Remote,
    LocalMirror,
    Defaults,
}

/// Everything the widget shows, as a stream of state changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WidgetEvent {
    SpinStarted,
    /// One animation step highlighted `index`.
    Highlight { index: usize, tick: u32 },
    SpinSettled { result: SpinResult },
    SpinFailed { message: String },
    SelectionChanged { index: usize, selected: bool },
    BoxesSwapped { from: usize, to: usize },
    ImageChanged { index: usize },
    PositionChanged { index: usize, position: Option<BoxPosition> },
    DragModeChanged { mode: DragMode },
    LayoutApplied { source: LayoutSource },
    PlayerResolved { card: PlayerCard },
}

/// Presentation seam. The session calls it synchronously for every event.
pub trait WidgetRenderer: Send + Sync {
    fn render(&self, event: &WidgetEvent);
}

/// Renders by logging. Used by the CLI demo.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl WidgetRenderer for LogRenderer {
    fn render(&self, event: &WidgetEvent) {
        match event {
            WidgetEvent::Highlight { .. } => tracing::trace!("[Widget] {:?}", event),
            WidgetEvent::SpinFailed { message } => tracing::warn!("[Widget] Spin failed: {}", message),
            WidgetEvent::SpinSettled { result } => {
                tracing::info!("[Widget] Revealed boxes {:?}", result.indices())
            }
            other => tracing::debug!("[Widget] {:?}", other),
        }
    }
}

#[derive(Debug, Default)]
pub struct NullRenderer;

impl WidgetRenderer for NullRenderer {
    fn render(&self, _event: &WidgetEvent) {}
}
