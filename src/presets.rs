//! Preset System - Reusable Artwork Settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::addressing::AddressingMode;
use crate::layout::LayoutSpec;

pub type PresetId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub engine_min_version: String,
    /// Number of addressable points on the board
    pub nodes: u64,
    #[serde(default = "default_group_orders")]
    pub group_orders: String,
    pub palette: Vec<PaletteColor>,
    /// Target line count per palette color, same order as `palette`
    #[serde(default)]
    pub lines: Vec<u32>,
    #[serde(default)]
    pub layout: Option<PresetLayout>,
}

fn default_group_orders() -> String { "1".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: String,
    pub rgb: [u8; 3],
}

impl PaletteColor {
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetLayout {
    pub rows_per_column: u32,
    pub columns_per_page: u32,
    #[serde(default)]
    pub mode: AddressingMode,
}

impl Preset {
    pub fn color_names(&self) -> Vec<String> {
        self.palette.iter().map(|c| c.name.clone()).collect()
    }

    pub fn palette_hex(&self) -> Vec<String> {
        self.palette.iter().map(PaletteColor::hex).collect()
    }

    /// Preset layout if it has one, system default otherwise.
    pub fn layout_spec(&self) -> LayoutSpec {
        match self.layout {
            Some(l) => LayoutSpec::from_preset(l.rows_per_column, l.columns_per_page, l.mode),
            None => LayoutSpec::default(),
        }
    }

    pub fn total_target_lines(&self) -> u64 {
        self.lines.iter().map(|&n| n as u64).sum()
    }
}

/// Preset registry - loads and caches presets
pub struct PresetRegistry {
    presets: BTreeMap<PresetId, Preset>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self { presets: BTreeMap::new() }
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().map_or(false, |e| e == "json") {
                    let parsed = fs::read_to_string(&path)
                        .map_err(|e| e.to_string())
                        .and_then(|content| {
                            serde_json::from_str::<Preset>(&content).map_err(|e| e.to_string())
                        });
                    match parsed {
                        Ok(preset) => registry.register(preset),
                        Err(error) => {
                            tracing::warn!(path = %path.display(), %error, "skipping unreadable preset");
                        }
                    }
                }
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.get(id)
    }

    pub fn list(&self) -> Vec<&Preset> {
        self.presets.values().collect()
    }

    pub fn register(&mut self, preset: Preset) {
        self.presets.insert(preset.id.clone(), preset);
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIGER: &str = r#"{
        "id": "tiger-fast",
        "name": "Tiger (fast)",
        "engineMinVersion": "1.0.0",
        "nodes": 320,
        "groupOrders": "5",
        "palette": [
            {"name": "white", "rgb": [255, 255, 255]},
            {"name": "orange", "rgb": [255, 130, 0]},
            {"name": "red", "rgb": [255, 0, 0]},
            {"name": "black", "rgb": [0, 0, 0]}
        ],
        "lines": [2700, 2000, 650, 5200]
    }"#;

    #[test]
    fn parses_preset_with_defaults() {
        let preset: Preset = serde_json::from_str(TIGER).unwrap();
        assert_eq!(preset.color_names(), vec!["white", "orange", "red", "black"]);
        assert_eq!(preset.palette_hex()[1], "#FF8200");
        assert_eq!(preset.total_target_lines(), 10550);
        assert_eq!(preset.layout_spec(), LayoutSpec::default());
    }

    #[test]
    fn load_from_dir_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tiger.json"), TIGER).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = PresetRegistry::load_from_dir(dir.path()).unwrap();
        assert_eq!(registry.list().len(), 1);
        assert!(registry.get("tiger-fast").is_some());
    }

    #[test]
    fn missing_dir_gives_empty_registry() {
        let registry = PresetRegistry::load_from_dir(Path::new("/nonexistent/presets")).unwrap();
        assert!(registry.list().is_empty());
    }
}
