//! glTF/GLB model loading.
//!
//! Only geometry and the node hierarchy are read. Materials and images are
//! ignored so a model with missing texture files still produces a preview.

use crate::bounds::Aabb;
use crate::error::SceneError;
use glam::{Mat4, Vec3};
use std::path::Path;
use std::sync::Arc;

/// A triangle list in model space.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Cached bounds of `positions`; `None` for an empty mesh.
    pub bounds: Option<Aabb>,
}

impl Mesh {
    /// Creates a mesh, computing its bounds. Indices past the vertex list and
    /// trailing indices that do not form a full triangle are dropped.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let vertex_count = positions.len() as u32;
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();
        let bounds = Aabb::from_points(positions.iter().copied());
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// Axis-aligned box mesh, mostly useful for fixtures and placeholders.
    pub fn cuboid(half_extent: Vec3) -> Self {
        let h = half_extent;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 7, 6, 3, 6, 2, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self::new(positions, indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// One node of a model's hierarchy.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    pub local: Mat4,
    pub mesh: Option<Arc<Mesh>>,
    pub children: Vec<usize>,
}

/// A loaded model: an arena of nodes plus the indices of the root nodes.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub nodes: Vec<ModelNode>,
    pub roots: Vec<usize>,
}

impl ModelAsset {
    /// Wraps a single mesh in a one-node model.
    pub fn from_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            nodes: vec![ModelNode {
                name: name.into(),
                local: Mat4::IDENTITY,
                mesh: Some(Arc::new(mesh)),
                children: Vec::new(),
            }],
            roots: vec![0],
        }
    }

    /// Loads a `.gltf` or `.glb` file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if !matches!(ext.as_deref(), Some("gltf") | Some("glb")) {
            return Err(SceneError::UnsupportedModel(path.to_path_buf()));
        }

        let gltf_err = |source| SceneError::Gltf {
            path: path.to_path_buf(),
            source,
        };
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_err)?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_err)?;

        Ok(Self::from_document(&document, &buffers))
    }

    fn from_document(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Self {
        let meshes: Vec<Arc<Mesh>> = document
            .meshes()
            .map(|mesh| Arc::new(read_mesh(&mesh, buffers)))
            .collect();

        let nodes: Vec<ModelNode> = document
            .nodes()
            .map(|node| ModelNode {
                name: node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node{}", node.index())),
                local: Mat4::from_cols_array_2d(&node.transform().matrix()),
                mesh: node.mesh().map(|m| Arc::clone(&meshes[m.index()])),
                children: node.children().map(|c| c.index()).collect(),
            })
            .collect();

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());

        match scene {
            Some(scene) => Self {
                roots: scene.nodes().map(|n| n.index()).collect(),
                nodes,
            },
            None => {
                // No scene graph: show every mesh at the origin.
                let nodes: Vec<ModelNode> = meshes
                    .iter()
                    .enumerate()
                    .map(|(i, mesh)| ModelNode {
                        name: format!("mesh{}", i),
                        local: Mat4::IDENTITY,
                        mesh: Some(Arc::clone(mesh)),
                        children: Vec::new(),
                    })
                    .collect();
                Self {
                    roots: (0..nodes.len()).collect(),
                    nodes,
                }
            }
        }
    }

    /// Number of nodes carrying a non-empty mesh.
    pub fn mesh_node_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.mesh.as_ref().is_some_and(|m| !m.is_empty()))
            .count()
    }
}

/// Merges all triangle primitives of a glTF mesh into one triangle list.
fn read_mesh(mesh: &gltf::Mesh<'_>, buffers: &[gltf::buffer::Data]) -> Mesh {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
        let Some(prim_positions) = reader.read_positions() else {
            continue;
        };

        let base = positions.len() as u32;
        positions.extend(prim_positions.map(Vec3::from));
        let added = positions.len() as u32 - base;

        match reader.read_indices() {
            Some(read) => {
                // Triangles referencing vertices outside this primitive are
                // dropped before offsetting.
                let local: Vec<u32> = read.into_u32().collect();
                indices.extend(
                    local
                        .chunks_exact(3)
                        .filter(|tri| tri.iter().all(|&i| i < added))
                        .flatten()
                        .map(|&i| base + i),
                );
            }
            None => indices.extend(base..base + added),
        }
    }

    Mesh::new(positions, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_drops_invalid_indices() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2, 0, 1, 7, 2],
        );
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_cuboid_bounds() {
        let mesh = Mesh::cuboid(Vec3::new(1.0, 2.0, 3.0));
        let bounds = mesh.bounds.unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.triangle_count(), 12);
    }

    /// Two triangle primitives sharing one 3-vertex position accessor. The
    /// second primitive's index list is `second_indices`.
    fn write_two_primitive_gltf(dir: &Path, second_indices: &[u32]) -> std::path::PathBuf {
        use base64::Engine;

        let mut bytes = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u32, 1, 2].iter().chain(second_indices) {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );

        let doc = serde_json::json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [ { "nodes": [0] } ],
            "nodes": [ { "mesh": 0 } ],
            "meshes": [ { "primitives": [
                { "attributes": { "POSITION": 0 }, "indices": 1 },
                { "attributes": { "POSITION": 0 }, "indices": 2 }
            ] } ],
            "buffers": [ { "byteLength": bytes.len(), "uri": uri } ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 12 },
                { "buffer": 0, "byteOffset": 48, "byteLength": second_indices.len() * 4 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" },
                { "bufferView": 2, "componentType": 5125, "count": second_indices.len(), "type": "SCALAR" }
            ]
        });
        let path = dir.join("two_prims.gltf");
        std::fs::write(&path, doc.to_string()).unwrap();
        path
    }

    #[test]
    fn test_load_merges_primitives_with_offset_indices() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_two_primitive_gltf(tmp.path(), &[2, 1, 0]);

        let model = ModelAsset::load(&path).unwrap();
        let mesh = model.nodes[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.positions.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 5, 4, 3]);
    }

    #[test]
    fn test_load_drops_out_of_range_indices_in_later_primitive() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_two_primitive_gltf(tmp.path(), &[0, 1, u32::MAX, 3, 1, 2, 0, 1, 2]);

        let model = ModelAsset::load(&path).unwrap();
        let mesh = model.nodes[0].mesh.as_ref().unwrap();
        // Both broken triangles go; the valid one stays aligned.
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = ModelAsset::load(Path::new("thing.fbx")).unwrap_err();
        assert!(matches!(err, SceneError::UnsupportedModel(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ModelAsset::load(Path::new("/nonexistent/model.glb")).unwrap_err();
        assert!(matches!(err, SceneError::Gltf { .. }));
    }
}
