//! Swap mode: drag one box onto another to exchange their images, and plain
//! clicks that toggle pre-spin selection.

use super::model::ImageBox;
use super::positioning::Point;

/// Pointer travel (px) beyond which a press counts as a drag, not a click.
pub const CLICK_MOVE_TOLERANCE_PX: f64 = 5.0;
/// Longest press (ms) still treated as a click.
pub const CLICK_MAX_DURATION_MS: u64 = 300;

#[derive(Debug, Clone, Copy)]
struct PendingClick {
    index: usize,
    at_ms: u64,
    origin: Point,
    moved: bool,
}

#[derive(Debug)]
pub struct SwapController {
    drag_drop_enabled: bool,
    suspended: bool,
    dragging: Option<usize>,
    pending_click: Option<PendingClick>,
}

impl Default for SwapController {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapController {
    pub fn new() -> Self {
        Self {
            drag_drop_enabled: true,
            suspended: false,
            dragging: None,
            pending_click: None,
        }
    }

    /// Layout switch for swap drag-and-drop (`roulette.enableDragDrop`).
    pub fn set_drag_drop_enabled(&mut self, enabled: bool) {
        self.drag_drop_enabled = enabled;
        if !enabled {
            self.dragging = None;
        }
    }

    pub fn drag_drop_enabled(&self) -> bool {
        self.drag_drop_enabled && !self.suspended
    }

    /// Stop answering any pointer gesture (free positioning took over).
    pub fn suspend(&mut self) {
        self.suspended = true;
        self.dragging = None;
        self.pending_click = None;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    pub fn begin_drag(&mut self, index: usize, box_count: usize, spinning: bool) -> bool {
        if !self.drag_drop_enabled() || spinning || index >= box_count || self.dragging.is_some() {
            return false;
        }
        self.dragging = Some(index);
        true
    }

    /// Drop the dragged box onto `target`. Returns the swapped pair.
    pub fn drop_on(&mut self, boxes: &mut [ImageBox], target: usize) -> Option<(usize, usize)> {
        let source = self.dragging.take()?;
        if self.suspended || source == target || target >= boxes.len() {
            return None;
        }
        swap_images(boxes, source, target).then_some((source, target))
    }

    pub fn end_drag(&mut self) {
        self.dragging = None;
    }

    pub fn pointer_down(&mut self, index: usize, at: Point, at_ms: u64, spinning: bool) {
        if self.suspended || spinning {
            return;
        }
        self.pending_click = Some(PendingClick {
            index,
            at_ms,
            origin: at,
            moved: false,
        });
    }

    pub fn pointer_move(&mut self, at: Point) {
        if let Some(click) = self.pending_click.as_mut() {
            let dx = (at.x - click.origin.x).abs();
            let dy = (at.y - click.origin.y).abs();
            if dx > CLICK_MOVE_TOLERANCE_PX || dy > CLICK_MOVE_TOLERANCE_PX {
                click.moved = true;
            }
        }
    }

    /// Finish a press. A short, still press toggles the box's selection;
    /// returns the box and its new selection state.
    pub fn pointer_up(
        &mut self,
        boxes: &mut [ImageBox],
        at_ms: u64,
        spinning: bool,
    ) -> Option<(usize, bool)> {
        let click = self.pending_click.take()?;
        let held_ms = at_ms.saturating_sub(click.at_ms);
        if self.suspended || spinning || click.moved || held_ms >= CLICK_MAX_DURATION_MS {
            return None;
        }
        let b = boxes.get_mut(click.index)?;
        b.selected = !b.selected;
        Some((click.index, b.selected))
    }

    /// Pointer left the box; forget the press.
    pub fn pointer_leave(&mut self) {
        self.pending_click = None;
    }
}

/// Exchange the images of two boxes. Indices, positions and flags stay put.
pub fn swap_images(boxes: &mut [ImageBox], a: usize, b: usize) -> bool {
    if a == b || a >= boxes.len() || b >= boxes.len() {
        return false;
    }
    let (lo, hi) = (a.min(b), a.max(b));
    let (head, tail) = boxes.split_at_mut(hi);
    std::mem::swap(&mut head[lo].image, &mut tail[0].image);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<ImageBox> {
        (0..4)
            .map(|i| ImageBox::with_image(i, format!("img{}", i)))
            .collect()
    }

    #[test]
    fn drop_swaps_images_only() {
        let mut boxes = grid();
        let mut swap = SwapController::new();
        assert!(swap.begin_drag(3, boxes.len(), false));
        assert_eq!(swap.drop_on(&mut boxes, 1), Some((3, 1)));
        assert_eq!(boxes[1].image.as_deref(), Some("img3"));
        assert_eq!(boxes[3].image.as_deref(), Some("img1"));
        assert_eq!(boxes[1].index, 1);
    }

    #[test]
    fn drop_on_self_is_noop() {
        let mut boxes = grid();
        let mut swap = SwapController::new();
        swap.begin_drag(2, boxes.len(), false);
        assert_eq!(swap.drop_on(&mut boxes, 2), None);
        assert_eq!(boxes[2].image.as_deref(), Some("img2"));
    }

    #[test]
    fn suspended_controller_ignores_gestures() {
        let mut boxes = grid();
        let mut swap = SwapController::new();
        swap.suspend();
        assert!(!swap.begin_drag(0, boxes.len(), false));
        swap.pointer_down(0, Point::default(), 0, false);
        assert_eq!(swap.pointer_up(&mut boxes, 50, false), None);
        assert!(!boxes[0].selected);
    }

    #[test]
    fn disabled_drag_drop_still_allows_clicks() {
        let mut boxes = grid();
        let mut swap = SwapController::new();
        swap.set_drag_drop_enabled(false);
        assert!(!swap.begin_drag(0, boxes.len(), false));

        swap.pointer_down(0, Point::new(10.0, 10.0), 1_000, false);
        assert_eq!(swap.pointer_up(&mut boxes, 1_100, false), Some((0, true)));
    }

    #[test]
    fn click_toggles_selection() {
        let mut boxes = grid();
        let mut swap = SwapController::new();
        swap.pointer_down(2, Point::new(10.0, 10.0), 1_000, false);
        swap.pointer_move(Point::new(12.0, 13.0));
        assert_eq!(swap.pointer_up(&mut boxes, 1_120, false), Some((2, true)));

        swap.pointer_down(2, Point::new(10.0, 10.0), 2_000, false);
        assert_eq!(swap.pointer_up(&mut boxes, 2_050, false), Some((2, false)));
    }

    #[test]
    fn long_or_moving_press_is_not_a_click() {
        let mut boxes = grid();
        let mut swap = SwapController::new();

        swap.pointer_down(1, Point::new(0.0, 0.0), 0, false);
        assert_eq!(swap.pointer_up(&mut boxes, CLICK_MAX_DURATION_MS, false), None);

        swap.pointer_down(1, Point::new(0.0, 0.0), 0, false);
        swap.pointer_move(Point::new(6.0, 0.0));
        assert_eq!(swap.pointer_up(&mut boxes, 10, false), None);
        assert!(!boxes[1].selected);
    }

    #[test]
    fn clicks_ignored_while_spinning() {
        let mut boxes = grid();
        let mut swap = SwapController::new();
        swap.pointer_down(0, Point::default(), 0, false);
        assert_eq!(swap.pointer_up(&mut boxes, 10, true), None);
    }
}
