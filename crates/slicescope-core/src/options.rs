//! Configuration options for slicescope.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::AllViewLayout;

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Gap between montage cells, in pixels.
    pub montage_margin_px: i32,

    /// Largest texture edge that may be allocated.
    pub texture_size_ceiling: u32,

    /// Whether the backend accepts non-power-of-two textures, which lifts
    /// `texture_size_ceiling`.
    pub npot_textures_supported: bool,

    /// Color of underlay pixels outside the volume.
    pub base_layer_background: [u8; 4],

    /// Snap oblique slice corners to the voxel grid.
    pub oblique_voxel_alignment: bool,

    /// Color used by the outline label drawing types.
    pub label_outline_color: [u8; 4],

    /// Panel arrangement of the three-plane view.
    pub all_view_layout: AllViewLayout,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            montage_margin_px: 3,
            texture_size_ceiling: 512,
            npot_textures_supported: false,
            base_layer_background: [0, 0, 0, 255],
            oblique_voxel_alignment: true,
            label_outline_color: [0, 0, 0, 255],
            all_view_layout: AllViewLayout::Grid,
        }
    }
}

impl EngineOptions {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the options as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let options = Self::from_json_str(&json)?;
        log::debug!("loaded engine options from {}", path.display());
        Ok(options)
    }

    /// Saves options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SliceError;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.montage_margin_px, 3);
        assert_eq!(options.texture_size_ceiling, 512);
        assert!(!options.npot_textures_supported);
        assert_eq!(options.base_layer_background, [0, 0, 0, 255]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options =
            EngineOptions::from_json_str(r#"{ "montage_margin_px": 8, "all_view_layout": "Row" }"#)
                .unwrap();
        assert_eq!(options.montage_margin_px, 8);
        assert_eq!(options.all_view_layout, AllViewLayout::Row);
        assert_eq!(options.texture_size_ceiling, 512);
    }

    #[test]
    fn test_json_round_trip() {
        let options = EngineOptions {
            npot_textures_supported: true,
            label_outline_color: [255, 255, 0, 255],
            ..EngineOptions::default()
        };
        let json = options.to_json_string().unwrap();
        assert_eq!(EngineOptions::from_json_str(&json).unwrap(), options);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "slicescope_options_{}.json",
            std::process::id()
        ));
        let options = EngineOptions {
            montage_margin_px: 1,
            ..EngineOptions::default()
        };
        options.save(&path).unwrap();
        assert_eq!(EngineOptions::load(&path).unwrap(), options);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(
            EngineOptions::from_json_str("not json"),
            Err(SliceError::JsonError(_))
        ));
        assert!(matches!(
            EngineOptions::load("/nonexistent/slicescope/options.json"),
            Err(SliceError::IoError(_))
        ));
    }
}
