//! Project directory and configuration resolution.

use anyhow::{bail, Context, Result};
use iconforge_cache::{AssetPreviewCache, CacheConfig, ProjectAssetIndex, CACHE_SUBDIR};
use iconforge_scene::{GltfSceneComposer, SoftwareRenderer};
use std::path::{Path, PathBuf};

/// Per-project configuration file looked up when `--config` is not given.
pub const PROJECT_CONFIG_FILE: &str = "iconforge.json";

/// Resolves the configuration: `--config`, then `<project>/iconforge.json`,
/// then defaults. A relative `engine_assets` path is taken relative to the
/// project directory.
pub fn load_config(project: &Path, explicit: Option<&Path>) -> Result<CacheConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = project.join(PROJECT_CONFIG_FILE);
            candidate.is_file().then_some(candidate)
        }
    };

    let mut config = match path {
        Some(path) => CacheConfig::load(&path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CacheConfig::default(),
    };

    if let Some(engine) = config.engine_assets.take() {
        config.engine_assets = Some(if engine.is_relative() {
            project.join(engine)
        } else {
            engine
        });
    }
    Ok(config)
}

/// Checks that `project` is an existing directory.
pub fn project_dir(project: &str) -> Result<PathBuf> {
    let path = PathBuf::from(project);
    if !path.is_dir() {
        bail!("Project directory not found: {}", path.display());
    }
    Ok(path)
}

pub fn cache_dir(project: &Path) -> PathBuf {
    project.join(CACHE_SUBDIR)
}

/// Builds an uninitialized cache over the project's filesystem index.
pub fn build_cache(project: &Path, config: CacheConfig) -> AssetPreviewCache {
    let mut index = ProjectAssetIndex::new(project);
    if let Some(engine) = &config.engine_assets {
        index = index.with_engine_assets(engine.clone());
    }
    AssetPreviewCache::new(Box::new(index), Box::new(GltfSceneComposer::new()), config)
}

/// CPU renderer matching the configured background.
pub fn renderer(config: &CacheConfig) -> SoftwareRenderer {
    SoftwareRenderer::new().with_background(config.background)
}
