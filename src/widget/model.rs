//! Box grid model shared by the spin, swap and positioning controllers.

use crate::utils::lenient;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Number of boxes in the stock grid markup.
pub const DEFAULT_BOX_COUNT: usize = 10;

/// Absolute offset of a box inside its container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxPosition {
    #[serde(deserialize_with = "pixels")]
    pub left: f64,
    #[serde(deserialize_with = "pixels")]
    pub top: f64,
}

impl BoxPosition {
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Accepts `12`, `12.5` or CSS-style `"12px"` strings.
fn pixels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    lenient::number(&raw).ok_or_else(|| serde::de::Error::custom(format!("expected pixels, got {}", raw)))
}

/// One selectable image slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageBox {
    pub index: usize,
    /// Image URL or data URL; `None` when the slot is empty.
    pub image: Option<String>,
    pub selected: bool,
    pub highlighted: bool,
    /// Set only while free positioning is active.
    pub position: Option<BoxPosition>,
}

impl ImageBox {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            image: None,
            selected: false,
            highlighted: false,
            position: None,
        }
    }

    pub fn with_image(index: usize, image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            ..Self::new(index)
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "none")
    }

    pub fn has_content(&self) -> bool {
        self.content().is_some()
    }
}

/// Build an empty grid of `count` boxes.
pub fn empty_grid(count: usize) -> Vec<ImageBox> {
    (0..count).map(ImageBox::new).collect()
}

pub fn clear_highlights(boxes: &mut [ImageBox]) {
    for b in boxes.iter_mut() {
        b.highlighted = false;
    }
}

pub fn clear_selections(boxes: &mut [ImageBox]) {
    for b in boxes.iter_mut() {
        b.selected = false;
    }
}

/// Timing knobs for one spin run. Stored under `spin` in the layout document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinConfig {
    /// Minimum accumulated run time before settling (ms).
    #[serde(rename = "duration", default = "default_duration", deserialize_with = "duration_or_default")]
    pub duration_ms: u64,
    /// Delay between highlight ticks (ms).
    #[serde(rename = "speed", default = "default_step_interval", deserialize_with = "step_or_default")]
    pub step_interval_ms: u64,
    #[serde(default = "default_true", deserialize_with = "deceleration_or_default")]
    pub deceleration: bool,
}

fn duration_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient::opt_u64(deserializer)?.unwrap_or_else(default_duration))
}

fn step_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient::opt_u64(deserializer)?.unwrap_or_else(default_step_interval))
}

fn deceleration_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient::opt_bool(deserializer)?.unwrap_or(true))
}

fn default_duration() -> u64 {
    5000
}

fn default_step_interval() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration(),
            step_interval_ms: default_step_interval(),
            deceleration: true,
        }
    }
}

impl SpinConfig {
    /// A zero duration or interval counts as unset and takes the default.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            duration_ms: if self.duration_ms == 0 { defaults.duration_ms } else { self.duration_ms },
            step_interval_ms: if self.step_interval_ms == 0 {
                defaults.step_interval_ms
            } else {
                self.step_interval_ms
            },
            deceleration: self.deceleration,
        }
    }
}

/// A box revealed to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealedBox {
    pub index: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "boxes", rename_all = "snake_case")]
pub enum SpinResult {
    /// Randomly chosen at the end of the animation.
    Chosen(RevealedBox),
    /// The boxes the user picked before spinning, in index order.
    Manual(Vec<RevealedBox>),
}

impl SpinResult {
    pub fn indices(&self) -> Vec<usize> {
        match self {
            SpinResult::Chosen(b) => vec![b.index],
            SpinResult::Manual(picks) => picks.iter().map(|b| b.index).collect(),
        }
    }

    pub fn contents(&self) -> Vec<&str> {
        match self {
            SpinResult::Chosen(b) => vec![b.content.as_str()],
            SpinResult::Manual(picks) => picks.iter().map(|b| b.content.as_str()).collect(),
        }
    }
}

/// Which pointer-drag semantics the grid currently answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    /// Drag one box onto another to swap their images.
    Swap,
    /// Drag a box anywhere inside the container.
    FreePositioning,
}
