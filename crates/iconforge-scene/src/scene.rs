//! Throwaway preview scenes.
//!
//! A [`PreviewScene`] is a flat arena of entities with parent links. It only
//! lives for the duration of one thumbnail render.

use crate::bounds::Aabb;
use crate::model::{Mesh, ModelAsset};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index of an entity inside its [`PreviewScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub usize);

/// A light illuminating the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Light {
    /// Parallel light travelling along `direction`.
    Directional {
        direction: Vec3,
        color: [f32; 3],
        intensity: f32,
    },
}

impl Light {
    pub fn directional(direction: Vec3, intensity: f32) -> Self {
        Light::Directional {
            direction: direction.normalize_or_zero(),
            color: [1.0, 1.0, 1.0],
            intensity,
        }
    }
}

/// A mesh attached to an entity.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub mesh: Arc<Mesh>,
    /// Linear RGBA multiplier applied to the shaded color.
    pub tint: [f32; 4],
}

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    parent: Option<EntityId>,
    local: Mat4,
    mesh: Option<MeshInstance>,
    visible: bool,
}

/// A minimal scene: subject entities, lights and an ambient term.
#[derive(Debug, Clone)]
pub struct PreviewScene {
    entities: Vec<Entity>,
    lights: Vec<Light>,
    pub ambient: f32,
}

impl Default for PreviewScene {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            lights: Vec::new(),
            ambient: 0.15,
        }
    }
}

impl PreviewScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity. `parent` must already exist in this scene.
    pub fn spawn(&mut self, name: impl Into<String>, parent: Option<EntityId>, local: Mat4) -> EntityId {
        let parent = parent.filter(|p| p.0 < self.entities.len());
        self.entities.push(Entity {
            name: name.into(),
            parent,
            local,
            mesh: None,
            visible: true,
        });
        EntityId(self.entities.len() - 1)
    }

    pub fn set_mesh(&mut self, id: EntityId, mesh: Arc<Mesh>, tint: [f32; 4]) {
        if let Some(entity) = self.entities.get_mut(id.0) {
            entity.mesh = Some(MeshInstance { mesh, tint });
        }
    }

    pub fn set_visible(&mut self, id: EntityId, visible: bool) {
        if let Some(entity) = self.entities.get_mut(id.0) {
            entity.visible = visible;
        }
    }

    /// Spawns every root of `model` (and their descendants) under `parent`.
    pub fn spawn_model(&mut self, model: &ModelAsset, parent: Option<EntityId>, tint: [f32; 4]) -> Vec<EntityId> {
        model
            .roots
            .iter()
            .filter_map(|&root| self.spawn_model_node(model, root, parent, tint, 0))
            .collect()
    }

    fn spawn_model_node(
        &mut self,
        model: &ModelAsset,
        index: usize,
        parent: Option<EntityId>,
        tint: [f32; 4],
        depth: usize,
    ) -> Option<EntityId> {
        // glTF forbids cycles, but a malformed file must not recurse forever.
        if depth > model.nodes.len() {
            return None;
        }
        let node = model.nodes.get(index)?;
        let id = self.spawn(node.name.clone(), parent, node.local);
        if let Some(mesh) = &node.mesh {
            self.set_mesh(id, Arc::clone(mesh), tint);
        }
        for &child in &node.children {
            self.spawn_model_node(model, child, Some(id), tint, depth + 1);
        }
        Some(id)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        self.entities.get(id.0).map(|e| e.name.as_str())
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(id.0).and_then(|e| e.parent)
    }

    /// Finds the first entity with the given name.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities.iter().position(|e| e.name == name).map(EntityId)
    }

    /// Composes local transforms from the root down to `id`.
    pub fn world_matrix(&self, id: EntityId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(EntityId(index)) = current {
            let Some(entity) = self.entities.get(index) else {
                break;
            };
            matrix = entity.local * matrix;
            current = entity.parent;
            hops += 1;
            if hops > self.entities.len() {
                break;
            }
        }
        matrix
    }

    fn is_effectively_visible(&self, id: EntityId) -> bool {
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(EntityId(index)) = current {
            let Some(entity) = self.entities.get(index) else {
                return false;
            };
            if !entity.visible {
                return false;
            }
            current = entity.parent;
            hops += 1;
            if hops > self.entities.len() {
                return false;
            }
        }
        true
    }

    /// Visible, non-empty mesh instances with their world matrices.
    pub fn renderables(&self) -> Vec<(&MeshInstance, Mat4)> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(index, entity)| {
                let instance = entity.mesh.as_ref()?;
                if instance.mesh.is_empty() || !self.is_effectively_visible(EntityId(index)) {
                    return None;
                }
                Some((instance, self.world_matrix(EntityId(index))))
            })
            .collect()
    }

    /// World-space union of every renderable's bounds, or `None` when nothing renders.
    pub fn compute_world_bounds(&self) -> Option<Aabb> {
        self.renderables()
            .into_iter()
            .filter_map(|(instance, world)| instance.mesh.bounds.map(|b| b.transformed(&world)))
            .filter(Aabb::is_finite)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Direction-weighted light list helper used by renderers.
    pub fn light_directions(&self) -> impl Iterator<Item = (Vec3, [f32; 3], f32)> + '_ {
        self.lights.iter().map(|light| match *light {
            Light::Directional {
                direction,
                color,
                intensity,
            } => (direction, color, intensity),
        })
    }
}
