//! Prefab definitions and their instantiation into preview scenes.
//!
//! A prefab file is JSON:
//!
//! ```json
//! {
//!   "name": "Cart",
//!   "root": {
//!     "name": "cart",
//!     "transform": { "translation": [0, 0, 0] },
//!     "components": [ { "type": "MeshRenderer", "model": "cart_body.glb" } ],
//!     "children": [
//!       {
//!         "name": "wheel",
//!         "transform": { "translation": [0.8, -0.4, 0], "scale": [0.5, 0.5, 0.5] },
//!         "components": [ { "type": "MeshRenderer", "model": "wheel.glb" } ]
//!       }
//!     ]
//!   }
//! }
//! ```

use crate::component::{Component, ComponentRegistry};
use crate::error::SceneError;
use crate::model::ModelAsset;
use crate::scene::{EntityId, PreviewScene};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Deepest node nesting accepted from a prefab file.
pub const MAX_PREFAB_DEPTH: usize = 64;

/// Translation, rotation (xyzw quaternion) and scale of a prefab node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformData {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl TransformData {
    pub fn to_matrix(&self) -> Mat4 {
        let rotation = Quat::from_array(self.rotation);
        // An all-zero quaternion in hand-written files means "no rotation".
        let rotation = if rotation.length_squared() > f32::EPSILON {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            rotation,
            Vec3::from(self.translation),
        )
    }
}

/// One node of a prefab's tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefabNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transform: TransformData,
    /// Raw component objects, resolved through a [`ComponentRegistry`].
    #[serde(default)]
    pub components: Vec<serde_json::Value>,
    #[serde(default)]
    pub children: Vec<PrefabNode>,
}

/// A prefab file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefabDefinition {
    #[serde(default)]
    pub name: String,
    pub root: PrefabNode,
}

impl PrefabDefinition {
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SceneError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Instantiates the prefab tree into `scene` and returns the root entity.
    ///
    /// `MeshRenderer` model paths resolve against `base_dir`. Each distinct model
    /// path is loaded through `load_model` at most once per call.
    pub fn instantiate<F>(
        &self,
        scene: &mut PreviewScene,
        base_dir: &Path,
        registry: &ComponentRegistry,
        mut load_model: F,
    ) -> Result<EntityId, SceneError>
    where
        F: FnMut(&Path) -> Result<ModelAsset, SceneError>,
    {
        let mut instantiator = Instantiator {
            scene,
            base_dir,
            registry,
            models: HashMap::new(),
            load_model: &mut load_model,
        };
        instantiator.spawn_node(&self.root, None, 0)
    }
}

struct Instantiator<'a, F> {
    scene: &'a mut PreviewScene,
    base_dir: &'a Path,
    registry: &'a ComponentRegistry,
    models: HashMap<PathBuf, Arc<ModelAsset>>,
    load_model: &'a mut F,
}

impl<F> Instantiator<'_, F>
where
    F: FnMut(&Path) -> Result<ModelAsset, SceneError>,
{
    fn spawn_node(
        &mut self,
        node: &PrefabNode,
        parent: Option<EntityId>,
        depth: usize,
    ) -> Result<EntityId, SceneError> {
        if depth > MAX_PREFAB_DEPTH {
            return Err(SceneError::Prefab(format!(
                "node nesting deeper than {} at '{}'",
                MAX_PREFAB_DEPTH, node.name
            )));
        }

        let id = self.scene.spawn(node.name.clone(), parent, node.transform.to_matrix());

        for data in &node.components {
            let Some(component) = self.registry.construct(data)? else {
                continue;
            };
            match component {
                Component::MeshRenderer { model, tint } => {
                    let model = self.model(&model)?;
                    self.scene.spawn_model(&model, Some(id), tint);
                }
                Component::Light(light) => self.scene.add_light(light),
                Component::Visibility { visible } => self.scene.set_visible(id, visible),
            }
        }

        for child in &node.children {
            self.spawn_node(child, Some(id), depth + 1)?;
        }

        Ok(id)
    }

    fn model(&mut self, relative: &Path) -> Result<Arc<ModelAsset>, SceneError> {
        let path = self.base_dir.join(relative);
        if let Some(model) = self.models.get(&path) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new((self.load_model)(&path)?);
        self.models.insert(path, Arc::clone(&model));
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mesh;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> PrefabDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_transform_defaults_to_identity() {
        assert_eq!(TransformData::default().to_matrix(), Mat4::IDENTITY);
        let zero_quat = TransformData {
            rotation: [0.0; 4],
            ..Default::default()
        };
        assert_eq!(zero_quat.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_instantiate_preserves_hierarchy_and_caches_models() {
        let prefab = parse(json!({
            "name": "Cart",
            "root": {
                "name": "cart",
                "transform": { "translation": [0.0, 1.0, 0.0] },
                "components": [ { "type": "MeshRenderer", "model": "box.glb" } ],
                "children": [
                    {
                        "name": "wheel",
                        "transform": { "translation": [2.0, 0.0, 0.0], "scale": [0.5, 0.5, 0.5] },
                        "components": [ { "type": "MeshRenderer", "model": "box.glb" } ]
                    }
                ]
            }
        }));

        let mut loads = Vec::new();
        let mut scene = PreviewScene::new();
        let root = prefab
            .instantiate(&mut scene, Path::new("/project/prefabs"), &ComponentRegistry::default(), |path| {
                loads.push(path.to_path_buf());
                Ok(ModelAsset::from_mesh("box", Mesh::cuboid(Vec3::ONE)))
            })
            .unwrap();

        assert_eq!(scene.entity_name(root), Some("cart"));
        assert_eq!(loads, vec![PathBuf::from("/project/prefabs/box.glb")]);

        let wheel = scene.find("wheel").unwrap();
        assert_eq!(scene.parent(wheel), Some(root));

        // Root box spans x in [-1, 1]; the wheel box is scaled by 0.5 around x = 2.
        let bounds = scene.compute_world_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(2.5, 2.0, 1.0));
    }

    #[test]
    fn test_instantiate_applies_visibility_and_lights() {
        let prefab = parse(json!({
            "root": {
                "name": "root",
                "children": [
                    {
                        "name": "hidden",
                        "components": [
                            { "type": "MeshRenderer", "model": "a.glb" },
                            { "type": "Visibility", "visible": false }
                        ]
                    },
                    {
                        "name": "lamp",
                        "components": [ { "type": "Light", "direction": [0.0, -1.0, 0.0] } ]
                    },
                    {
                        "name": "script",
                        "components": [ { "type": "Script", "source": "spin.lua" } ]
                    }
                ]
            }
        }));

        let mut scene = PreviewScene::new();
        prefab
            .instantiate(&mut scene, Path::new("."), &ComponentRegistry::default(), |_| {
                Ok(ModelAsset::from_mesh("a", Mesh::cuboid(Vec3::ONE)))
            })
            .unwrap();

        assert!(scene.compute_world_bounds().is_none());
        assert_eq!(scene.lights().len(), 1);
        assert!(scene.find("script").is_some());
    }

    #[test]
    fn test_instantiate_propagates_model_errors() {
        let prefab = parse(json!({
            "root": { "components": [ { "type": "MeshRenderer", "model": "missing.glb" } ] }
        }));
        let mut scene = PreviewScene::new();
        let err = prefab
            .instantiate(&mut scene, Path::new("."), &ComponentRegistry::default(), |path| {
                Err(SceneError::UnsupportedModel(path.to_path_buf()))
            })
            .unwrap_err();
        assert!(matches!(err, SceneError::UnsupportedModel(_)));
    }

    #[test]
    fn test_rejects_excessive_nesting() {
        let mut node = PrefabNode::default();
        for _ in 0..(MAX_PREFAB_DEPTH + 2) {
            node = PrefabNode {
                children: vec![node],
                ..Default::default()
            };
        }
        let prefab = PrefabDefinition {
            name: "deep".into(),
            root: node,
        };
        let mut scene = PreviewScene::new();
        let err = prefab
            .instantiate(&mut scene, Path::new("."), &ComponentRegistry::default(), |_| {
                Ok(ModelAsset::default())
            })
            .unwrap_err();
        assert!(matches!(err, SceneError::Prefab(_)));
    }

    #[test]
    fn test_load_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.prefab");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PrefabDefinition::load(&path).unwrap_err(),
            SceneError::Json { .. }
        ));
    }
}
