//! iconforge asset preview cache
//!
//! Keeps a small rendered thumbnail for every texture, model and prefab in a
//! project and regenerates a thumbnail only when the asset's bytes change.
//!
//! # Components
//!
//! - **Content hasher** ([`hasher`]): versioned BLAKE3 fingerprints of source files
//! - **Manifest store** ([`manifest`]): durable key -> fingerprint/icon table, flushed in batches
//! - **Icon cache** ([`icons`]): decoded thumbnails currently held in memory
//! - **Generation scheduler** ([`scheduler`]): throttled FIFO, one job per tick
//! - **Preview generator** ([`preview`]): per-type render strategies and PNG export
//! - **Service** ([`AssetPreviewCache`]): the host-facing operations, including
//!   invalidation and pruning against the live [`AssetIndex`]
//!
//! # Threading
//!
//! Everything here runs on the thread that drives the host's frame loop. The
//! cache holds no locks; callers must not share an [`AssetPreviewCache`]
//! across threads.
//!
//! # Example
//!
//! ```no_run
//! use iconforge_cache::{AssetPreviewCache, CacheConfig, ProjectAssetIndex};
//! use iconforge_scene::{GltfSceneComposer, SoftwareRenderer};
//! use std::path::Path;
//!
//! let project = Path::new("my_game");
//! let index = ProjectAssetIndex::new(project);
//! let mut cache = AssetPreviewCache::new(
//!     Box::new(index),
//!     Box::new(GltfSceneComposer::new()),
//!     CacheConfig::default(),
//! );
//! cache.initialize(project);
//!
//! let mut renderer = SoftwareRenderer::new();
//! // once per frame:
//! cache.tick(&mut renderer);
//! if let Some(icon) = cache.try_get_icon("textures/grass.png") {
//!     println!("{}x{}", icon.width(), icon.height());
//! }
//! cache.shutdown();
//! ```

pub mod config;
mod error;
pub mod hasher;
pub mod icons;
pub mod index;
pub mod key;
pub mod manifest;
pub mod preview;
pub mod scheduler;
pub mod service;

pub use config::{CacheConfig, CameraSettings, LightSettings};
pub use error::{CacheError, PreviewError};
pub use hasher::{fingerprint, CACHE_FORMAT_VERSION};
pub use icons::{IconCache, IconHandle};
pub use index::{AssetIndex, IndexedAsset, ProjectAssetIndex, ENGINE_KEY_PREFIX};
pub use key::{icon_file_name, AssetKey, AssetType};
pub use manifest::{Manifest, ManifestEntry, ManifestStore};
pub use preview::{PreviewGenerator, PreviewSettings};
pub use scheduler::{GenerationScheduler, Status};
pub use service::{AssetPreviewCache, CacheStats, TickOutcome, CACHE_SUBDIR, MANIFEST_FILE};
