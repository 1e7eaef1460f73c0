//! Error types for scene composition and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while composing a preview scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("glTF error in {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported model format: {0}")]
    UnsupportedModel(PathBuf),

    #[error("Invalid prefab: {0}")]
    Prefab(String),
}

/// Errors raised by a [`crate::Renderer`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid render target: {0}")]
    InvalidTarget(String),

    #[error("Scene has nothing to render")]
    EmptyScene,

    #[error("Renderer backend error: {0}")]
    Backend(String),
}
