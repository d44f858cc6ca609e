pub mod media;
pub mod model;
pub mod positioning;
pub mod render;
pub mod session;
pub mod spin;
pub mod swap;

#[cfg(test)]
mod tests;

pub use media::{DroppedFile, MediaError};
pub use model::{BoxPosition, DragMode, ImageBox, RevealedBox, SpinConfig, SpinResult};
pub use positioning::{
    ContainerMetrics, Point, PositionCommit, PositioningController, PressOutcome, PressRejection,
    Rect,
};
pub use render::{LayoutSource, LogRenderer, NullRenderer, WidgetEvent, WidgetRenderer};
pub use session::{SpinOutcome, WidgetSession};
pub use spin::{SpinController, SpinError, SpinPhase};
pub use swap::SwapController;
