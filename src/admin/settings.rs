//! Settings forms from the admin console and how they edit the theme document.

use crate::theme::{
    BackgroundAnimation, BackgroundMedia, ContainerStyle, LayoutDocument, RouletteSettings,
    SpacingSettings,
};
use crate::widget::model::SpinConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorSettings {
    pub background_color: String,
    pub background_color_secondary: String,
    pub button_color: String,
    pub button_hover_color: String,
    pub accent_color: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            background_color: "#0f172a".to_string(),
            background_color_secondary: "#1e293b".to_string(),
            button_color: "#6366f1".to_string(),
            button_hover_color: "#4f46e5".to_string(),
            accent_color: "#10b981".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroSettings {
    pub title: String,
    pub subtitle: String,
    pub title_size: u32,
    pub subtitle_size: u32,
    pub title_color: String,
    pub subtitle_color: String,
}

impl Default for HeroSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            title_size: 48,
            subtitle_size: 20,
            title_color: "#ffffff".to_string(),
            subtitle_color: "#cbd5e1".to_string(),
        }
    }
}

/// Grid options edited from the roulette panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouletteForm {
    pub design: String,
    /// `"none"` clears the animation.
    pub animation: String,
    pub box_size: u32,
    pub container_width: String,
    pub gap: u32,
    pub enable_drag_drop: bool,
    pub enable_positioning: bool,
}

impl Default for RouletteForm {
    fn default() -> Self {
        Self {
            design: "grid".to_string(),
            animation: "none".to_string(),
            box_size: 180,
            container_width: "auto".to_string(),
            gap: 32,
            enable_drag_drop: false,
            enable_positioning: false,
        }
    }
}

impl RouletteForm {
    /// Write the form into `roulette`. Stored box positions and unknown keys
    /// are kept.
    pub fn apply(&self, roulette: &mut RouletteSettings) {
        roulette.design = self.design.clone();
        roulette.animation = match self.animation.trim() {
            "" | "none" => None,
            other => Some(other.to_string()),
        };
        roulette.box_size = Some(self.box_size);
        roulette.container_width = Some(self.container_width.clone());
        roulette.gap = Some(self.gap);
        roulette.enable_drag_drop = Some(self.enable_drag_drop);
        roulette.enable_positioning = Some(self.enable_positioning);
    }
}

/// Every panel of the admin console at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsForm {
    pub colors: ColorSettings,
    pub hero: HeroSettings,
    pub roulette: RouletteForm,
    pub background_animation: BackgroundAnimation,
    pub background_media: BackgroundMedia,
    pub spin: SpinConfig,
    pub spacing: SpacingSettings,
    pub container: ContainerStyle,
}

impl SettingsForm {
    pub fn apply(&self, layout: &mut LayoutDocument) {
        let c = &self.colors;
        layout.background_color = Some(c.background_color.clone());
        layout.background_color_secondary = Some(c.background_color_secondary.clone());
        layout.button_color = Some(c.button_color.clone());
        layout.button_hover_color = Some(c.button_hover_color.clone());
        layout.accent_color = Some(c.accent_color.clone());

        let h = &self.hero;
        layout.hero_title = Some(h.title.clone());
        layout.hero_subtitle = Some(h.subtitle.clone());
        layout.hero_title_size = Some(h.title_size);
        layout.hero_subtitle_size = Some(h.subtitle_size);
        layout.hero_title_color = Some(h.title_color.clone());
        layout.hero_subtitle_color = Some(h.subtitle_color.clone());

        self.roulette.apply(layout.roulette_mut());
        layout.background_animation = Some(self.background_animation.clone());
        layout.background_media = Some(self.background_media.clone());
        layout.spin = Some(self.spin);
        layout.spacing = Some(self.spacing.clone());
        layout.container = Some(self.container.clone());
    }

    /// Pre-fill the form from a stored document.
    pub fn from_layout(layout: &LayoutDocument) -> Self {
        let defaults = Self::default();
        let colors = ColorSettings {
            background_color: layout
                .background_color
                .clone()
                .unwrap_or(defaults.colors.background_color),
            background_color_secondary: layout
                .background_color_secondary
                .clone()
                .unwrap_or(defaults.colors.background_color_secondary),
            button_color: layout.button_color.clone().unwrap_or(defaults.colors.button_color),
            button_hover_color: layout
                .button_hover_color
                .clone()
                .unwrap_or(defaults.colors.button_hover_color),
            accent_color: layout.accent_color.clone().unwrap_or(defaults.colors.accent_color),
        };
        let hero = HeroSettings {
            title: layout.hero_title.clone().unwrap_or(defaults.hero.title),
            subtitle: layout.hero_subtitle.clone().unwrap_or(defaults.hero.subtitle),
            title_size: layout.hero_title_size.unwrap_or(defaults.hero.title_size),
            subtitle_size: layout.hero_subtitle_size.unwrap_or(defaults.hero.subtitle_size),
            title_color: layout.hero_title_color.clone().unwrap_or(defaults.hero.title_color),
            subtitle_color: layout
                .hero_subtitle_color
                .clone()
                .unwrap_or(defaults.hero.subtitle_color),
        };
        let roulette = match &layout.roulette {
            Some(r) => RouletteForm {
                design: r.design.clone(),
                animation: r.animation.clone().unwrap_or_else(|| "none".to_string()),
                box_size: r.box_size.unwrap_or(defaults.roulette.box_size),
                container_width: r
                    .container_width
                    .clone()
                    .unwrap_or(defaults.roulette.container_width),
                gap: r.gap.unwrap_or(defaults.roulette.gap),
                enable_drag_drop: r.enable_drag_drop.unwrap_or(false),
                enable_positioning: r.enable_positioning.unwrap_or(false),
            },
            None => defaults.roulette,
        };

        Self {
            colors,
            hero,
            roulette,
            background_animation: layout.background_animation.clone().unwrap_or_default(),
            background_media: layout.background_media.clone().unwrap_or_default(),
            spin: layout.spin_config(),
            spacing: layout.spacing.clone().unwrap_or_default(),
            container: layout.container.clone().unwrap_or_default(),
        }
    }
}
