use crate::utils::lenient;
use crate::widget::model::{BoxPosition, SpinConfig};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Theme document stored at `settings/layout`.
/// Maps directly to the widget's visual settings.
///
/// Keys this type does not model are kept in `extra` so a read-modify-write
/// never drops data written by a newer admin console. Loosely typed values
/// degrade per field or per section instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color_secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_hover_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,

    // ── Hero ───────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_u32")]
    pub hero_title_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_u32")]
    pub hero_subtitle_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_title_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_subtitle_color: Option<String>,

    /// Per-box image URLs set from the admin console.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "sparse_list")]
    pub images: Vec<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::section")]
    pub roulette: Option<RouletteSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::section")]
    pub spin: Option<SpinConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::section")]
    pub spacing: Option<SpacingSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::section")]
    pub container: Option<ContainerStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::section")]
    pub background_media: Option<BackgroundMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::section")]
    pub background_animation: Option<BackgroundAnimation>,

    /// Server timestamp of the last admin write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayoutDocument {
    pub fn spin_config(&self) -> SpinConfig {
        self.spin.map(SpinConfig::normalized).unwrap_or_default()
    }

    pub fn roulette_mut(&mut self) -> &mut RouletteSettings {
        self.roulette.get_or_insert_with(RouletteSettings::default)
    }

    /// Custom position for one box, if positioning has stored one.
    pub fn custom_position(&self, index: usize) -> Option<BoxPosition> {
        self.roulette
            .as_ref()
            .and_then(|r| r.custom_positions.get(index).copied().flatten())
    }

    /// Store one box's position, leaving every other index untouched.
    pub fn set_custom_position(&mut self, index: usize, position: BoxPosition) {
        let positions = &mut self.roulette_mut().custom_positions;
        if positions.len() <= index {
            positions.resize(index + 1, None);
        }
        positions[index] = Some(position);
    }

    pub fn clear_custom_positions(&mut self) {
        if let Some(roulette) = self.roulette.as_mut() {
            roulette.custom_positions.clear();
            roulette.extra.remove("positions");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouletteSettings {
    /// Grid design name, e.g. "grid", "circle".
    #[serde(default = "default_design")]
    pub design: String,
    /// Item animation preset; `None` means no animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_u32")]
    pub box_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_u32")]
    pub gap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_bool")]
    pub enable_drag_drop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_bool")]
    pub enable_positioning: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "sparse_list")]
    pub custom_positions: Vec<Option<BoxPosition>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_design() -> String {
    "grid".to_string()
}

impl Default for RouletteSettings {
    fn default() -> Self {
        Self {
            design: default_design(),
            animation: None,
            box_size: None,
            container_width: None,
            gap: None,
            enable_drag_drop: None,
            enable_positioning: None,
            custom_positions: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl RouletteSettings {
    /// Free positioning only applies to the grid design.
    pub fn positioning_active(&self) -> bool {
        self.enable_positioning == Some(true) && self.design == "grid"
    }

    /// Swap drag-and-drop is on unless explicitly disabled.
    pub fn drag_drop_active(&self) -> bool {
        self.enable_drag_drop != Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpacingSettings {
    #[serde(deserialize_with = "lenient::u32_value")]
    pub container_padding: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub hero_margin_top: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub hero_margin_bottom: u32,
}

impl Default for SpacingSettings {
    fn default() -> Self {
        Self {
            container_padding: 64,
            hero_margin_top: 0,
            hero_margin_bottom: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStyle {
    pub animation: String,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub animation_speed: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub border_width: u32,
    pub border_color: String,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub backdrop_blur: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub background_opacity: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub border_radius: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub padding: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub shadow_intensity: u32,
    pub shadow_color: String,
}

impl Default for ContainerStyle {
    fn default() -> Self {
        Self {
            animation: "none".to_string(),
            animation_speed: 5,
            border_width: 2,
            border_color: "#6366f1".to_string(),
            backdrop_blur: 50,
            background_opacity: 40,
            border_radius: 32,
            padding: 64,
            shadow_intensity: 60,
            shadow_color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundMedia {
    pub image_url: String,
    pub video_url: String,
    pub video_loop: bool,
    pub video_autoplay: bool,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub overlay_opacity: u32,
}

impl Default for BackgroundMedia {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            video_url: String::new(),
            video_loop: false,
            video_autoplay: false,
            overlay_opacity: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundAnimation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub speed: u32,
    #[serde(deserialize_with = "lenient::u32_value")]
    pub opacity: u32,
}

impl Default for BackgroundAnimation {
    fn default() -> Self {
        Self {
            kind: "none".to_string(),
            speed: 5,
            opacity: 30,
        }
    }
}

/// The realtime store turns sparse arrays into objects keyed by index, so a
/// list may come back as `[a, null, b]` or `{"0": a, "2": b}`. Entries that
/// cannot be read are left empty.
fn sparse_list<'de, D, T>(deserializer: D) -> Result<Vec<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    let entries: Vec<(usize, Value)> = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items.into_iter().enumerate().collect(),
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
            .collect(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected list or index map, got {}",
                other
            )))
        }
    };

    let len = entries.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
    let mut out: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for (i, v) in entries {
        if v.is_null() {
            continue;
        }
        match serde_json::from_value(v) {
            Ok(item) => out[i] = Some(item),
            Err(e) => tracing::debug!("[Layout] Skipping list entry {}: {}", i, e),
        }
    }
    Ok(out)
}
