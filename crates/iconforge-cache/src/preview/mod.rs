//! Per-type thumbnail generation.
//!
//! Each eligible [`AssetType`] maps to a strategy function that turns a
//! source file into a bottom-up [`RenderTarget`]; [`export`] then writes it
//! as PNG. Strategies are looked up in a small table keyed by type, so tests
//! and hosts can replace one without touching the others.

pub mod camera;
pub mod export;
mod model;
mod texture;

pub use camera::{compute_preview_camera_distance, fit_camera};
pub use export::export_render_target;
pub use model::render_scene;
pub use texture::fit_within;

use crate::config::{CacheConfig, CameraSettings, LightSettings};
use crate::error::PreviewError;
use crate::key::{AssetKey, AssetType};
use iconforge_scene::{RenderTarget, Renderer, SceneComposer};
use std::collections::HashMap;
use std::path::Path;

/// Rendering parameters shared by every strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    pub size: u32,
    pub padding: u32,
    pub background: [u8; 4],
    pub camera: CameraSettings,
    pub lights: LightSettings,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for PreviewSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            size: config.thumbnail_size,
            padding: config.padding,
            background: config.background,
            camera: config.camera.clone(),
            lights: config.lights.clone(),
        }
    }
}

/// Everything a strategy needs to render one asset.
pub struct PreviewRequest<'a> {
    pub key: &'a AssetKey,
    pub asset_type: AssetType,
    pub source: &'a Path,
    pub settings: &'a PreviewSettings,
    pub composer: &'a dyn SceneComposer,
}

/// Renders one asset type.
pub type PreviewStrategy =
    fn(&PreviewRequest<'_>, &mut dyn Renderer) -> Result<RenderTarget, PreviewError>;

/// Dispatches generation jobs to the strategy registered for their type.
pub struct PreviewGenerator {
    settings: PreviewSettings,
    strategies: HashMap<AssetType, PreviewStrategy>,
}

impl PreviewGenerator {
    /// Generator with the built-in texture, model and prefab strategies.
    pub fn new(settings: PreviewSettings) -> Self {
        let mut strategies: HashMap<AssetType, PreviewStrategy> = HashMap::new();
        strategies.insert(AssetType::Texture, texture::render_texture);
        strategies.insert(AssetType::Model, model::render_model);
        strategies.insert(AssetType::Prefab, model::render_prefab);
        Self {
            settings,
            strategies,
        }
    }

    /// Replaces the strategy for `asset_type`.
    pub fn with_strategy(mut self, asset_type: AssetType, strategy: PreviewStrategy) -> Self {
        self.strategies.insert(asset_type, strategy);
        self
    }

    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    /// Renders `source` without writing anything.
    pub fn render(
        &self,
        renderer: &mut dyn Renderer,
        composer: &dyn SceneComposer,
        asset_type: AssetType,
        key: &AssetKey,
        source: &Path,
    ) -> Result<RenderTarget, PreviewError> {
        let strategy = self
            .strategies
            .get(&asset_type)
            .ok_or(PreviewError::UnsupportedType(asset_type))?;
        let request = PreviewRequest {
            key,
            asset_type,
            source,
            settings: &self.settings,
            composer,
        };
        strategy(&request, renderer)
    }

    /// Renders `source` and writes the thumbnail to `output`.
    ///
    /// Never fails outward: any error is logged and reported as `false`, and
    /// nothing is written to `output` in that case.
    pub fn generate(
        &self,
        renderer: &mut dyn Renderer,
        composer: &dyn SceneComposer,
        asset_type: AssetType,
        key: &AssetKey,
        source: &Path,
        output: &Path,
    ) -> bool {
        let result = self
            .render(renderer, composer, asset_type, key, source)
            .and_then(|target| export_render_target(&target, output));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, asset_type = %asset_type, error = %e, "thumbnail generation failed");
                false
            }
        }
    }
}
