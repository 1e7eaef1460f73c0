//! Prefab component data.
//!
//! Components arrive as JSON objects carrying a `"type"` tag. Each known tag
//! maps to a constructor in the [`ComponentRegistry`]; the result is a closed
//! [`Component`] variant that prefab instantiation applies to an entity.

use crate::error::SceneError;
use crate::scene::Light;
use glam::Vec3;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Component data understood by the preview scene builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Renders a model file at the entity's transform.
    MeshRenderer { model: PathBuf, tint: [f32; 4] },
    /// Adds a light to the scene.
    Light(Light),
    /// Hides the entity and its descendants when `visible` is false.
    Visibility { visible: bool },
}

/// Builds a [`Component`] from its JSON object.
pub type ComponentConstructor = fn(&Value) -> Result<Component, SceneError>;

/// Maps `"type"` tags to component constructors.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    constructors: HashMap<String, ComponentConstructor>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("MeshRenderer", construct_mesh_renderer);
        registry.register("Light", construct_light);
        registry.register("Visibility", construct_visibility);
        registry
    }
}

impl ComponentRegistry {
    /// Registry with no constructors.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, tag: impl Into<String>, constructor: ComponentConstructor) {
        self.constructors.insert(tag.into(), constructor);
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Constructs the component described by `data`.
    ///
    /// Returns `Ok(None)` for a missing or unregistered tag; those components
    /// carry nothing a thumbnail needs.
    pub fn construct(&self, data: &Value) -> Result<Option<Component>, SceneError> {
        let Some(tag) = data.get("type").and_then(Value::as_str) else {
            tracing::debug!("skipping component without a type tag");
            return Ok(None);
        };
        match self.constructors.get(tag) {
            Some(constructor) => constructor(data).map(Some),
            None => {
                tracing::debug!(tag, "skipping unregistered component");
                Ok(None)
            }
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(tag: &str, data: &Value) -> Result<T, SceneError> {
    T::deserialize(data).map_err(|e| SceneError::Prefab(format!("invalid {} component: {}", tag, e)))
}

fn default_tint() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

fn construct_mesh_renderer(data: &Value) -> Result<Component, SceneError> {
    #[derive(Deserialize)]
    struct Data {
        model: PathBuf,
        #[serde(default = "default_tint")]
        tint: [f32; 4],
    }
    let data: Data = parse("MeshRenderer", data)?;
    Ok(Component::MeshRenderer {
        model: data.model,
        tint: data.tint,
    })
}

fn construct_light(data: &Value) -> Result<Component, SceneError> {
    #[derive(Deserialize)]
    struct Data {
        direction: [f32; 3],
        #[serde(default = "default_intensity")]
        intensity: f32,
        #[serde(default = "default_color")]
        color: [f32; 3],
    }
    fn default_intensity() -> f32 {
        1.0
    }
    fn default_color() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }
    let data: Data = parse("Light", data)?;
    Ok(Component::Light(Light::Directional {
        direction: Vec3::from(data.direction).normalize_or_zero(),
        color: data.color,
        intensity: data.intensity,
    }))
}

fn construct_visibility(data: &Value) -> Result<Component, SceneError> {
    #[derive(Deserialize)]
    struct Data {
        visible: bool,
    }
    let data: Data = parse("Visibility", data)?;
    Ok(Component::Visibility {
        visible: data.visible,
    })
}
