//! Free positioning: drag any box to an absolute pixel offset inside the
//! container.
//!
//! Coordinates are container-relative. A box may never leave the padded
//! container: `padding <= left <= width - box_width - padding`, same for `top`.

use super::model::{BoxPosition, ImageBox};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rendered box rectangle, relative to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerMetrics {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

/// Final position of a finished drag, ready to persist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionCommit {
    pub index: usize,
    pub position: BoxPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressRejection {
    Disabled,
    Spinning,
    DragInProgress,
    UnknownBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    Started,
    Rejected(PressRejection),
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    index: usize,
    pointer_start: Point,
    origin: BoxPosition,
    size: (f64, f64),
}

#[derive(Debug, Default)]
pub struct PositioningController {
    enabled: bool,
    container: ContainerMetrics,
    sizes: Vec<(f64, f64)>,
    drag: Option<ActiveDrag>,
}

/// Clamp `pos` so a box of `size` stays inside the padded container:
/// `padding <= left <= width - box_width - padding`, and the same for `top`.
/// The lower bound is the padding edge, not zero, so a box can never sit in
/// the container's padding. When the box is larger than the free area it
/// pins to the padding edge.
pub fn clamp_position(pos: BoxPosition, size: (f64, f64), container: &ContainerMetrics) -> BoxPosition {
    let max_left = container.width - size.0 - container.padding;
    let max_top = container.height - size.1 - container.padding;
    BoxPosition {
        left: container.padding.max(pos.left.min(max_left)),
        top: container.padding.max(pos.top.min(max_top)),
    }
}

fn measured_sizes(count: usize, rects: &[Rect]) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| rects.get(i).map(|r| (r.width, r.height)).unwrap_or_default())
        .collect()
}

impl PositioningController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dragging(&self) -> Option<usize> {
        self.drag.map(|d| d.index)
    }

    /// Switch every box to absolute coordinates. Boxes that already carry a
    /// custom position keep it; the rest start from their rendered rectangle.
    pub fn enable(&mut self, boxes: &mut [ImageBox], container: ContainerMetrics, rects: &[Rect]) {
        self.container = container;
        self.sizes = measured_sizes(boxes.len(), rects);

        for (i, b) in boxes.iter_mut().enumerate() {
            if b.position.is_none() {
                let rect = rects.get(i).copied().unwrap_or_default();
                b.position = Some(BoxPosition::new(rect.left, rect.top));
            }
        }
        self.enabled = true;
    }

    /// Return boxes to flow layout. An in-flight drag is dropped without
    /// producing a commit; its index is returned.
    pub fn disable(&mut self, boxes: &mut [ImageBox]) -> Option<usize> {
        let cancelled = self.drag.take().map(|d| d.index);
        for b in boxes.iter_mut() {
            b.position = None;
        }
        self.enabled = false;
        cancelled
    }

    /// Flip the mode; returns the new state.
    pub fn toggle(&mut self, boxes: &mut [ImageBox], container: ContainerMetrics, rects: &[Rect]) -> bool {
        if self.enabled {
            self.disable(boxes);
        } else {
            self.enable(boxes, container, rects);
        }
        self.enabled
    }

    /// Adopt freshly measured geometry. While enabled, box sizes are
    /// re-read and every box that is neither `pinned` nor being dragged moves
    /// to its new rendered rectangle.
    pub fn relayout(
        &mut self,
        boxes: &mut [ImageBox],
        container: ContainerMetrics,
        rects: &[Rect],
        pinned: impl Fn(usize) -> bool,
    ) {
        self.container = container;
        if !self.enabled {
            return;
        }
        self.sizes = measured_sizes(boxes.len(), rects);
        let dragging = self.dragging();
        for (i, b) in boxes.iter_mut().enumerate() {
            if pinned(i) || dragging == Some(i) {
                continue;
            }
            if let Some(rect) = rects.get(i) {
                b.position = Some(BoxPosition::new(rect.left, rect.top));
            }
        }
    }

    pub fn press(
        &mut self,
        boxes: &[ImageBox],
        index: usize,
        pointer: Point,
        spinning: bool,
    ) -> PressOutcome {
        if !self.enabled {
            return PressOutcome::Rejected(PressRejection::Disabled);
        }
        if spinning {
            return PressOutcome::Rejected(PressRejection::Spinning);
        }
        if self.drag.is_some() {
            return PressOutcome::Rejected(PressRejection::DragInProgress);
        }
        let Some(b) = boxes.get(index) else {
            return PressOutcome::Rejected(PressRejection::UnknownBox);
        };

        self.drag = Some(ActiveDrag {
            index,
            pointer_start: pointer,
            origin: b.position.unwrap_or_default(),
            size: self.sizes.get(index).copied().unwrap_or_default(),
        });
        PressOutcome::Started
    }

    /// Move the dragged box with the pointer; returns its clamped position.
    pub fn drag_to(&mut self, boxes: &mut [ImageBox], pointer: Point) -> Option<BoxPosition> {
        let drag = self.drag?;
        let proposed = BoxPosition::new(
            drag.origin.left + (pointer.x - drag.pointer_start.x),
            drag.origin.top + (pointer.y - drag.pointer_start.y),
        );
        let clamped = clamp_position(proposed, drag.size, &self.container);
        boxes.get_mut(drag.index)?.position = Some(clamped);
        Some(clamped)
    }

    pub fn release(&mut self, boxes: &[ImageBox]) -> Option<PositionCommit> {
        let drag = self.drag.take()?;
        if !self.enabled {
            return None;
        }
        let position = boxes.get(drag.index)?.position?;
        Some(PositionCommit {
            index: drag.index,
            position,
        })
    }

    /// Abort the current drag and put the box back where it started.
    pub fn cancel(&mut self, boxes: &mut [ImageBox]) -> Option<usize> {
        let drag = self.drag.take()?;
        if let Some(b) = boxes.get_mut(drag.index) {
            b.position = Some(drag.origin);
        }
        Some(drag.index)
    }
}
