//! Error types for the preview cache.

use iconforge_scene::{RenderError, SceneError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from cache bookkeeping (hashing, manifest persistence, configuration).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures inside a single preview generation.
///
/// These never leave the preview generator; they are logged and turned into
/// a failed job.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode thumbnail {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    #[error("Asset has no renderable geometry")]
    BoundsUnavailable,

    #[error("Render failed: {0}")]
    RenderFailure(String),

    #[error("Scene composition failed: {0}")]
    Scene(#[from] SceneError),

    #[error("No preview strategy registered for {0}")]
    UnsupportedType(crate::key::AssetType),
}

impl From<RenderError> for PreviewError {
    fn from(err: RenderError) -> Self {
        PreviewError::RenderFailure(err.to_string())
    }
}
