//! Scene composition entry points used by the preview generator.

use crate::component::ComponentRegistry;
use crate::error::SceneError;
use crate::model::ModelAsset;
use crate::prefab::PrefabDefinition;
use crate::scene::PreviewScene;
use glam::Mat4;
use std::path::Path;

/// Builds the subject of a preview scene from an asset file.
///
/// Implementations only place the subject; lights and camera are added by
/// the caller.
pub trait SceneComposer {
    /// Scene containing a single model.
    fn compose_model(&self, source: &Path) -> Result<PreviewScene, SceneError>;

    /// Scene containing an instantiated prefab.
    fn compose_prefab(&self, source: &Path) -> Result<PreviewScene, SceneError>;
}

/// Composer backed by glTF model files and JSON prefab definitions.
#[derive(Debug, Clone, Default)]
pub struct GltfSceneComposer {
    registry: ComponentRegistry,
}

impl GltfSceneComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom component registry for prefab instantiation.
    pub fn with_registry(registry: ComponentRegistry) -> Self {
        Self { registry }
    }
}

impl SceneComposer for GltfSceneComposer {
    fn compose_model(&self, source: &Path) -> Result<PreviewScene, SceneError> {
        let model = ModelAsset::load(source)?;
        let mut scene = PreviewScene::new();
        let root = scene.spawn("preview_subject", None, Mat4::IDENTITY);
        scene.spawn_model(&model, Some(root), [1.0; 4]);
        Ok(scene)
    }

    fn compose_prefab(&self, source: &Path) -> Result<PreviewScene, SceneError> {
        let prefab = PrefabDefinition::load(source)?;
        let base_dir = source.parent().unwrap_or_else(|| Path::new("."));
        let mut scene = PreviewScene::new();
        prefab.instantiate(&mut scene, base_dir, &self.registry, ModelAsset::load)?;
        Ok(scene)
    }
}
