//! iconforge scene layer
//!
//! Builds the small throwaway scenes that asset thumbnails are rendered from:
//!
//! - **Bounds**: axis-aligned boxes and their world-space unions
//! - **Models**: glTF/GLB node trees loaded into shared triangle meshes
//! - **Prefabs**: JSON node trees instantiated through a tagged component registry
//! - **Rendering**: the [`Renderer`] contract, bottom-up [`RenderTarget`]s and a CPU
//!   [`SoftwareRenderer`] for hosts without a graphics context
//!
//! # Example
//!
//! ```no_run
//! use iconforge_scene::{GltfSceneComposer, SceneComposer};
//! use std::path::Path;
//!
//! let composer = GltfSceneComposer::new();
//! let scene = composer.compose_model(Path::new("models/crate.glb")).unwrap();
//! let bounds = scene.compute_world_bounds();
//! ```

pub mod bounds;
pub mod component;
pub mod composer;
mod error;
pub mod model;
pub mod prefab;
pub mod render;
pub mod scene;

pub use bounds::Aabb;
pub use component::{Component, ComponentRegistry};
pub use composer::{GltfSceneComposer, SceneComposer};
pub use error::{RenderError, SceneError};
pub use model::{Mesh, ModelAsset, ModelNode};
pub use prefab::{PrefabDefinition, PrefabNode, TransformData};
pub use render::software::SoftwareRenderer;
pub use render::{Camera, RenderTarget, Renderer};
pub use scene::{EntityId, Light, MeshInstance, PreviewScene};
