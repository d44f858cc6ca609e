//! One widget instance: the box grid, its controllers, and the collaborators
//! it reads configuration from and reports results to.

use super::media::{data_url_from_file, validate_image_ref, DroppedFile, MediaError};
use super::model::{empty_grid, BoxPosition, DragMode, ImageBox, SpinConfig, SpinResult};
use super::positioning::{
    ContainerMetrics, Point, PositionCommit, PositioningController, PressOutcome, Rect,
};
use super::render::{LayoutSource, WidgetEvent, WidgetRenderer};
use super::spin::{SpinController, SpinError, SpinPhase, SpinStart, TickOutcome};
use super::swap::SwapController;
use crate::player::{PlayerCard, PlayerLookup};
use crate::store::{selected_item_path, StoreError, ThemeStore, LAYOUT_PATH};
use crate::theme::{fetch_layout, persist_position, LayoutDocument, LocalMirror};
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Minimum player id length that triggers a profile lookup after a reveal.
const PLAYER_LOOKUP_MIN_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum SpinOutcome {
    Completed(SpinResult),
    /// Another spin was already running.
    Ignored,
}

struct WidgetState {
    boxes: Vec<ImageBox>,
    spin: SpinController,
    spin_config: SpinConfig,
    positioning: PositioningController,
    swap: SwapController,
    layout: LayoutDocument,
    container: ContainerMetrics,
    rects: Vec<Rect>,
    rng: StdRng,
}

impl WidgetState {
    fn drag_mode(&self) -> DragMode {
        if self.positioning.is_enabled() {
            DragMode::FreePositioning
        } else {
            DragMode::Swap
        }
    }

    fn images(&self) -> Vec<Option<String>> {
        self.boxes.iter().map(|b| b.image.clone()).collect()
    }

    /// Switch drag semantics. Swap handling is suspended while positioning is on.
    fn set_drag_mode(&mut self, mode: DragMode) -> bool {
        if self.drag_mode() == mode {
            return false;
        }
        match mode {
            DragMode::FreePositioning => {
                self.positioning
                    .enable(&mut self.boxes, self.container, &self.rects);
                self.swap.suspend();
            }
            DragMode::Swap => {
                self.positioning.disable(&mut self.boxes);
                self.swap.resume();
            }
        }
        true
    }

    fn apply_layout(&mut self, layout: LayoutDocument) -> bool {
        for (i, image) in layout.images.iter().enumerate() {
            if let (Some(image), Some(b)) = (image, self.boxes.get_mut(i)) {
                if !image.trim().is_empty() {
                    b.image = Some(image.clone());
                }
            }
        }
        self.spin_config = layout.spin_config();

        let roulette = layout.roulette.clone().unwrap_or_default();
        self.swap.set_drag_drop_enabled(roulette.drag_drop_active());

        let mode_changed = if roulette.positioning_active() {
            for (i, b) in self.boxes.iter_mut().enumerate() {
                if let Some(pos) = layout.custom_position(i) {
                    b.position = Some(pos);
                }
            }
            self.set_drag_mode(DragMode::FreePositioning)
        } else {
            self.set_drag_mode(DragMode::Swap)
        };

        self.layout = layout;
        mode_changed
    }
}

/// A running widget. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WidgetSession {
    state: Arc<Mutex<WidgetState>>,
    renderer: Arc<dyn WidgetRenderer>,
    store: Option<Arc<dyn ThemeStore>>,
    mirror: Option<LocalMirror>,
    player: Option<Arc<PlayerLookup>>,
}

impl WidgetSession {
    pub fn new(box_count: usize, renderer: Arc<dyn WidgetRenderer>) -> Self {
        Self::with_rng(box_count, renderer, StdRng::from_entropy())
    }

    /// Deterministic winner selection.
    pub fn with_seed(box_count: usize, renderer: Arc<dyn WidgetRenderer>, seed: u64) -> Self {
        Self::with_rng(box_count, renderer, StdRng::seed_from_u64(seed))
    }

    fn with_rng(box_count: usize, renderer: Arc<dyn WidgetRenderer>, rng: StdRng) -> Self {
        let state = WidgetState {
            boxes: empty_grid(box_count),
            spin: SpinController::new(),
            spin_config: SpinConfig::default(),
            positioning: PositioningController::new(),
            swap: SwapController::new(),
            layout: LayoutDocument::default(),
            container: ContainerMetrics::default(),
            rects: Vec::new(),
            rng,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            renderer,
            store: None,
            mirror: None,
            player: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ThemeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_mirror(mut self, mirror: LocalMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_player_lookup(mut self, lookup: Arc<PlayerLookup>) -> Self {
        self.player = Some(lookup);
        self
    }

    fn emit(&self, event: WidgetEvent) {
        self.renderer.render(&event);
    }

    fn mirror_images(&self, images: &[Option<String>]) {
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.save_images(images) {
                tracing::warn!("[WidgetSession] Failed to mirror images: {}", e);
            }
        }
    }

    fn mirror_layout(&self, layout: &LayoutDocument) {
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.save_layout(layout) {
                tracing::warn!("[WidgetSession] Failed to mirror layout: {}", e);
            }
        }
    }

    // ── Read access ────────────────────────────────────

    pub async fn boxes(&self) -> Vec<ImageBox> {
        self.state.lock().await.boxes.clone()
    }

    pub async fn spin_phase(&self) -> SpinPhase {
        self.state.lock().await.spin.phase()
    }

    pub async fn spin_config(&self) -> SpinConfig {
        self.state.lock().await.spin_config
    }

    pub async fn layout(&self) -> LayoutDocument {
        self.state.lock().await.layout.clone()
    }

    pub async fn drag_mode(&self) -> DragMode {
        self.state.lock().await.drag_mode()
    }

    // ── Spin ───────────────────────────────────────────

    /// Run one spin with the current config. Ticks are `step_interval` apart;
    /// the state lock is never held across a timer wait.
    pub async fn spin(&self) -> Result<SpinOutcome, SpinError> {
        let config = {
            let mut guard = self.state.lock().await;
            let st = &mut *guard;
            let config = st.spin_config;
            match st.spin.begin(&mut st.boxes, &config) {
                Ok(SpinStart::Started) => config,
                Ok(SpinStart::Ignored) => {
                    tracing::debug!("[WidgetSession] Spin already running, request ignored");
                    return Ok(SpinOutcome::Ignored);
                }
                Ok(SpinStart::Revealed(result)) => {
                    drop(guard);
                    self.emit(WidgetEvent::SpinSettled {
                        result: result.clone(),
                    });
                    return Ok(SpinOutcome::Completed(result));
                }
                Err(e) => {
                    drop(guard);
                    if e == SpinError::NoContent {
                        self.emit(WidgetEvent::SpinFailed {
                            message: e.to_string(),
                        });
                    }
                    return Err(e);
                }
            }
        };

        self.emit(WidgetEvent::SpinStarted);

        // The run lives in its own task: dropping this future leaves it to
        // settle on schedule instead of stranding the controller mid-run.
        let runner = self.clone();
        match tokio::spawn(async move { runner.drive_spin(config).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[WidgetSession] Spin task failed: {}", e);
                let mut guard = self.state.lock().await;
                let st = &mut *guard;
                st.spin.abort(&mut st.boxes);
                drop(guard);
                self.emit(WidgetEvent::SpinFailed {
                    message: SpinError::Interrupted.to_string(),
                });
                Err(SpinError::Interrupted)
            }
        }
    }

    /// Tick a started run until it settles.
    async fn drive_spin(&self, config: SpinConfig) -> Result<SpinOutcome, SpinError> {
        let step = Duration::from_millis(config.step_interval_ms);
        let mut ticker = interval_at(Instant::now() + step, step);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let (outcome, tick) = {
                let mut guard = self.state.lock().await;
                let st = &mut *guard;
                let outcome = st.spin.tick(&mut st.boxes, &mut st.rng);
                (outcome, st.spin.ticks())
            };

            match outcome {
                Ok(TickOutcome::Continue { highlighted }) => {
                    self.emit(WidgetEvent::Highlight {
                        index: highlighted,
                        tick,
                    });
                }
                Ok(TickOutcome::Finished {
                    highlighted,
                    result,
                }) => {
                    self.emit(WidgetEvent::Highlight {
                        index: highlighted,
                        tick,
                    });
                    self.emit(WidgetEvent::SpinSettled {
                        result: result.clone(),
                    });
                    self.record_selection(&result).await;
                    return Ok(SpinOutcome::Completed(result));
                }
                Err(e) => {
                    if e == SpinError::NoContent {
                        self.emit(WidgetEvent::SpinFailed {
                            message: e.to_string(),
                        });
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Spin, then look up the player's profile when an id was entered.
    pub async fn spin_with_player(&self, player_id: &str) -> Result<SpinOutcome, SpinError> {
        let outcome = self.spin().await?;
        if matches!(outcome, SpinOutcome::Completed(_))
            && player_id.trim().len() >= PLAYER_LOOKUP_MIN_LEN
        {
            self.reveal_player(player_id).await;
        }
        Ok(outcome)
    }

    pub async fn reveal_player(&self, player_id: &str) -> Option<PlayerCard> {
        let lookup = self.player.as_ref()?;
        let card = lookup.lookup_or_placeholder(player_id).await;
        self.emit(WidgetEvent::PlayerResolved { card: card.clone() });
        Some(card)
    }

    async fn record_selection(&self, result: &SpinResult) {
        let (Some(store), SpinResult::Chosen(winner)) = (&self.store, result) else {
            return;
        };
        if let Err(e) = store.increment(&selected_item_path(winner.index), 1).await {
            tracing::warn!(
                "[WidgetSession] Failed to count selection of box {}: {}",
                winner.index,
                e
            );
        }
    }

    // ── Layout ─────────────────────────────────────────

    /// Load the theme: store first, then the local mirror, then defaults.
    /// Box images set on this device are re-applied on top.
    pub async fn load_layout(&self) -> LayoutSource {
        let mut loaded: Option<(LayoutDocument, LayoutSource)> = None;

        if let Some(store) = &self.store {
            match fetch_layout(store.as_ref()).await {
                Ok(Some(layout)) => {
                    self.mirror_layout(&layout);
                    loaded = Some((layout, LayoutSource::Remote));
                }
                Ok(None) => tracing::info!("[WidgetSession] No layout stored at {}", LAYOUT_PATH),
                Err(e) => tracing::warn!("[WidgetSession] Layout unavailable: {}", e),
            }
        }
        if loaded.is_none() {
            loaded = self
                .mirror
                .as_ref()
                .and_then(LocalMirror::load_layout)
                .map(|layout| (layout, LayoutSource::LocalMirror));
        }
        let (layout, source) =
            loaded.unwrap_or_else(|| (LayoutDocument::default(), LayoutSource::Defaults));

        self.apply_layout(layout, source).await;
        self.restore_local_images().await;
        source
    }

    pub async fn apply_layout(&self, layout: LayoutDocument, source: LayoutSource) {
        let (mode_changed, mode) = {
            let mut st = self.state.lock().await;
            let changed = st.apply_layout(layout);
            (changed, st.drag_mode())
        };
        if mode_changed {
            self.emit(WidgetEvent::DragModeChanged { mode });
        }
        self.emit(WidgetEvent::LayoutApplied { source });
    }

    async fn restore_local_images(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let images = mirror.load_images();
        let mut changed = Vec::new();
        {
            let mut st = self.state.lock().await;
            for (i, image) in images.into_iter().enumerate() {
                let Some(image) = image.filter(|s| !s.trim().is_empty()) else {
                    continue;
                };
                if let Some(b) = st.boxes.get_mut(i) {
                    b.image = Some(image);
                    changed.push(i);
                }
            }
        }
        for index in changed {
            self.emit(WidgetEvent::ImageChanged { index });
        }
    }

    /// Re-apply the layout on every store change until the stream ends.
    pub async fn follow_layout(&self) -> Result<JoinHandle<()>, StoreError> {
        let Some(store) = self.store.clone() else {
            return Err(StoreError::Unavailable("no store configured".to_string()));
        };
        let mut updates = store.subscribe(LAYOUT_PATH).await?;
        let session = self.clone();
        Ok(tokio::spawn(async move {
            while let Some(raw) = updates.next().await {
                if raw.is_null() {
                    continue;
                }
                match serde_json::from_value::<LayoutDocument>(raw) {
                    Ok(layout) => {
                        session.mirror_layout(&layout);
                        session.apply_layout(layout, LayoutSource::Remote).await;
                    }
                    Err(e) => tracing::warn!("[WidgetSession] Ignoring malformed layout update: {}", e),
                }
            }
            tracing::debug!("[WidgetSession] Layout subscription ended");
        }))
    }

    // ── Images ─────────────────────────────────────────

    /// Assign an image URL or data URL to a box. Returns false for an unknown box.
    pub async fn set_image(&self, index: usize, reference: &str) -> Result<bool, MediaError> {
        let image = validate_image_ref(reference)?;
        let images = {
            let mut st = self.state.lock().await;
            let Some(b) = st.boxes.get_mut(index) else {
                return Ok(false);
            };
            b.image = Some(image);
            st.images()
        };
        self.emit(WidgetEvent::ImageChanged { index });
        self.mirror_images(&images);
        Ok(true)
    }

    pub async fn drop_image(&self, index: usize, file: &DroppedFile) -> Result<bool, MediaError> {
        let url = data_url_from_file(file)?;
        self.set_image(index, &url).await
    }

    // ── Positioning ────────────────────────────────────

    /// Record the rendered geometry used when positioning is switched on.
    /// Record measured geometry. With free positioning on, boxes without a
    /// stored custom position move to their new rendered rectangles.
    pub async fn set_container(&self, container: ContainerMetrics, rects: Vec<Rect>) {
        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        st.container = container;
        st.rects = rects;
        let layout = &st.layout;
        st.positioning.relayout(&mut st.boxes, container, &st.rects, |i| {
            layout.custom_position(i).is_some()
        });
    }

    pub async fn set_drag_mode(&self, mode: DragMode) {
        let changed = self.state.lock().await.set_drag_mode(mode);
        if changed {
            self.emit(WidgetEvent::DragModeChanged { mode });
        }
    }

    pub async fn toggle_positioning(&self) -> DragMode {
        let mode = {
            let mut st = self.state.lock().await;
            let next = match st.drag_mode() {
                DragMode::Swap => DragMode::FreePositioning,
                DragMode::FreePositioning => DragMode::Swap,
            };
            st.set_drag_mode(next);
            next
        };
        self.emit(WidgetEvent::DragModeChanged { mode });
        mode
    }

    pub async fn press_box(&self, index: usize, pointer: Point) -> PressOutcome {
        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        let spinning = st.spin.is_spinning();
        let outcome = st.positioning.press(&st.boxes, index, pointer, spinning);
        if let PressOutcome::Rejected(reason) = outcome {
            tracing::debug!("[WidgetSession] Press on box {} rejected: {:?}", index, reason);
        }
        outcome
    }

    pub async fn drag_box(&self, pointer: Point) -> Option<BoxPosition> {
        let (index, position) = {
            let mut guard = self.state.lock().await;
            let st = &mut *guard;
            let index = st.positioning.dragging()?;
            (index, st.positioning.drag_to(&mut st.boxes, pointer)?)
        };
        self.emit(WidgetEvent::PositionChanged {
            index,
            position: Some(position),
        });
        Some(position)
    }

    /// Finish the drag and persist the box's position. A failed store write
    /// is logged; the local layout copy still records the position.
    pub async fn release_box(&self) -> Option<PositionCommit> {
        let (commit, layout) = {
            let mut guard = self.state.lock().await;
            let st = &mut *guard;
            let commit = st.positioning.release(&st.boxes)?;
            st.layout.set_custom_position(commit.index, commit.position);
            (commit, st.layout.clone())
        };
        self.mirror_layout(&layout);

        if let Some(store) = &self.store {
            if let Err(e) = persist_position(store.as_ref(), commit).await {
                tracing::warn!(
                    "[WidgetSession] Failed to persist position of box {}: {}",
                    commit.index,
                    e
                );
            }
        }
        Some(commit)
    }

    pub async fn cancel_drag(&self) -> Option<usize> {
        let (index, position) = {
            let mut guard = self.state.lock().await;
            let st = &mut *guard;
            let index = st.positioning.cancel(&mut st.boxes)?;
            (index, st.boxes.get(index).and_then(|b| b.position))
        };
        self.emit(WidgetEvent::PositionChanged { index, position });
        Some(index)
    }

    // ── Swap & select ──────────────────────────────────

    pub async fn begin_swap_drag(&self, index: usize) -> bool {
        let mut st = self.state.lock().await;
        let spinning = st.spin.is_spinning();
        let count = st.boxes.len();
        st.swap.begin_drag(index, count, spinning)
    }

    pub async fn drop_swap(&self, target: usize) -> Option<(usize, usize)> {
        let (pair, images) = {
            let mut guard = self.state.lock().await;
            let st = &mut *guard;
            let pair = st.swap.drop_on(&mut st.boxes, target)?;
            (pair, st.images())
        };
        self.emit(WidgetEvent::BoxesSwapped {
            from: pair.0,
            to: pair.1,
        });
        self.mirror_images(&images);
        Some(pair)
    }

    pub async fn end_swap_drag(&self) {
        self.state.lock().await.swap.end_drag();
    }

    pub async fn pointer_down(&self, index: usize, at: Point, at_ms: u64) {
        let mut st = self.state.lock().await;
        let spinning = st.spin.is_spinning();
        st.swap.pointer_down(index, at, at_ms, spinning);
    }

    pub async fn pointer_move(&self, at: Point) {
        self.state.lock().await.swap.pointer_move(at);
    }

    /// A short, still press toggles selection.
    pub async fn pointer_up(&self, at_ms: u64) -> Option<(usize, bool)> {
        let toggled = {
            let mut guard = self.state.lock().await;
            let st = &mut *guard;
            let spinning = st.spin.is_spinning();
            st.swap.pointer_up(&mut st.boxes, at_ms, spinning)?
        };
        self.emit(WidgetEvent::SelectionChanged {
            index: toggled.0,
            selected: toggled.1,
        });
        Some(toggled)
    }

    pub async fn pointer_leave(&self) {
        self.state.lock().await.swap.pointer_leave();
    }
}
