//! Local copy of the theme document and box images, used when the store is
//! unreachable.

use super::layout::LayoutDocument;
use crate::config::{read_json_file, save_json_config};
use std::path::{Path, PathBuf};

const LAYOUT_FILE: &str = "layout.json";
const IMAGES_FILE: &str = "images.json";

#[derive(Debug, Clone)]
pub struct LocalMirror {
    dir: PathBuf,
}

impl LocalMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_layout(&self) -> Option<LayoutDocument> {
        read_json_file(&self.dir.join(LAYOUT_FILE), "LocalMirror")
    }

    pub fn save_layout(&self, layout: &LayoutDocument) -> Result<(), String> {
        save_json_config(&self.dir.join(LAYOUT_FILE), layout, "LocalMirror")
    }

    /// Per-box images set on this device, indexed by box.
    pub fn load_images(&self) -> Vec<Option<String>> {
        read_json_file(&self.dir.join(IMAGES_FILE), "LocalMirror").unwrap_or_default()
    }

    pub fn save_images(&self, images: &[Option<String>]) -> Result<(), String> {
        save_json_config(&self.dir.join(IMAGES_FILE), &images, "LocalMirror")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dir_has_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = LocalMirror::new(dir.path());
        assert!(mirror.load_layout().is_none());
        assert!(mirror.load_images().is_empty());
    }

    #[test]
    fn layout_and_images_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = LocalMirror::new(dir.path().join("cache"));
        let layout = LayoutDocument {
            hero_title: Some("Abra a caixa".into()),
            ..Default::default()
        };
        mirror.save_layout(&layout).unwrap();
        mirror
            .save_images(&[None, Some("https://cdn.example/b.png".into())])
            .unwrap();

        assert_eq!(mirror.load_layout(), Some(layout));
        assert_eq!(mirror.load_images()[1].as_deref(), Some("https://cdn.example/b.png"));
    }
}
