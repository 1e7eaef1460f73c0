//! Cache configuration.

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Camera placement for model and prefab previews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Direction from the subject towards the camera. Normalized on use.
    pub view_direction: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Fraction of the vertical field of view the subject should fill.
    /// Clamped to [0.4, 0.95].
    pub target_fill: f32,
    /// Closest the camera may get to the subject's center.
    pub min_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            view_direction: [1.0, 0.8, 1.0],
            fov_y_degrees: 30.0,
            target_fill: 0.8,
            min_distance: 0.25,
        }
    }
}

/// Key and fill lights added to every 3-D preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// Direction the key light travels.
    pub key_direction: [f32; 3],
    pub key_intensity: f32,
    /// Direction the fill light travels.
    pub fill_direction: [f32; 3],
    pub fill_intensity: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            key_direction: [-0.5, -1.0, -0.3],
            key_intensity: 1.0,
            fill_direction: [0.7, -0.2, 0.6],
            fill_intensity: 0.35,
        }
    }
}

/// Settings for an [`crate::AssetPreviewCache`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Edge length of the square thumbnails in pixels.
    pub thumbnail_size: u32,
    /// Margin kept free around texture previews, in pixels.
    pub padding: u32,
    /// Background behind texture previews and the clear color hint for renderers.
    pub background: [u8; 4],
    /// Minimum time between two generation jobs.
    pub min_tick_interval_ms: u64,
    /// Manifest mutations batched before a flush.
    pub flush_threshold: u32,
    /// Longest a manifest mutation may wait for a flush.
    pub flush_max_age_ms: u64,
    pub camera: CameraSettings,
    pub lights: LightSettings,
    /// Directory of engine-bundled assets, indexed under `engine://`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_assets: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 128,
            padding: 8,
            background: [48, 48, 52, 255],
            min_tick_interval_ms: 200,
            flush_threshold: 16,
            flush_max_age_ms: 2000,
            camera: CameraSettings::default(),
            lights: LightSettings::default(),
            engine_assets: None,
        }
    }
}

impl CacheConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let text = std::fs::read_to_string(path).map_err(|e| CacheError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| CacheError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn min_tick_interval(&self) -> Duration {
        Duration::from_millis(self.min_tick_interval_ms)
    }

    pub fn flush_max_age(&self) -> Duration {
        Duration::from_millis(self.flush_max_age_ms)
    }
}
