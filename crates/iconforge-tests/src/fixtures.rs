//! Test fixture utilities for building synthetic projects.

use base64::Engine;
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory with helpers for adding assets.
pub struct ProjectFixture {
    pub root: TempDir,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of a project-relative file.
    pub fn file(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn prepare(&self, rel: &str) -> PathBuf {
        let path = self.file(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create asset dir");
        }
        path
    }

    /// Adds a solid-color PNG texture.
    pub fn add_texture(&self, rel: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
        let path = self.prepare(rel);
        RgbaImage::from_pixel(width, height, Rgba(rgba))
            .save(&path)
            .expect("Failed to write texture");
        path
    }

    /// Adds a `.gltf` cube of the given half extent with an embedded buffer.
    pub fn add_gltf_cube(&self, rel: &str, half_extent: f32) -> PathBuf {
        let path = self.prepare(rel);
        fs::write(&path, gltf_cube_json(half_extent)).expect("Failed to write glTF");
        path
    }

    /// Adds a prefab file.
    pub fn add_prefab(&self, rel: &str, definition: &serde_json::Value) -> PathBuf {
        let path = self.prepare(rel);
        let text = serde_json::to_string_pretty(definition).expect("Failed to serialize prefab");
        fs::write(&path, text).expect("Failed to write prefab");
        path
    }

    /// Writes arbitrary bytes (broken assets, unrelated files).
    pub fn add_raw(&self, rel: &str, bytes: &[u8]) -> PathBuf {
        let path = self.prepare(rel);
        fs::write(&path, bytes).expect("Failed to write file");
        path
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.file(rel)).expect("Failed to remove asset");
    }

    /// Thumbnail cache directory of this project.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.path().join(iconforge_cache::CACHE_SUBDIR)
    }

    /// Parsed manifest file, or `None` if it has not been written.
    pub fn read_manifest(&self) -> Option<serde_json::Value> {
        let text = fs::read_to_string(self.cache_dir().join(iconforge_cache::MANIFEST_FILE)).ok()?;
        serde_json::from_str(&text).ok()
    }
}

/// Unit-cube corner positions scaled by `half_extent`, plus 12 triangles.
fn cube_geometry(half_extent: f32) -> (Vec<[f32; 3]>, Vec<u16>) {
    let h = half_extent;
    let positions = vec![
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, // -z
        4, 5, 6, 4, 6, 7, // +z
        0, 1, 5, 0, 5, 4, // -y
        3, 7, 6, 3, 6, 2, // +y
        0, 4, 7, 0, 7, 3, // -x
        1, 2, 6, 1, 6, 5, // +x
    ];
    (positions, indices)
}

/// glTF 2.0 document for a cube, buffer embedded as a base64 data URI.
pub fn gltf_cube_json(half_extent: f32) -> String {
    let (positions, indices) = cube_geometry(half_extent);

    let mut bytes = Vec::new();
    for p in &positions {
        for c in p {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
    }
    let positions_len = bytes.len();
    for i in &indices {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    let indices_len = bytes.len() - positions_len;
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    );

    let h = half_extent;
    serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "cube", "mesh": 0 } ],
        "meshes": [ {
            "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "mode": 4 } ]
        } ],
        "buffers": [ { "byteLength": bytes.len(), "uri": uri } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": positions_len, "target": 34962 },
            { "buffer": 0, "byteOffset": positions_len, "byteLength": indices_len, "target": 34963 }
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": positions.len(),
                "type": "VEC3",
                "min": [-h, -h, -h],
                "max": [h, h, h]
            },
            {
                "bufferView": 1,
                "componentType": 5123,
                "count": indices.len(),
                "type": "SCALAR"
            }
        ]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gltf_cube_loads() {
        let project = ProjectFixture::new();
        let path = project.add_gltf_cube("models/cube.gltf", 0.5);
        let model = iconforge_scene::ModelAsset::load(&path).unwrap();
        assert_eq!(model.mesh_node_count(), 1);
    }

    #[test]
    fn test_texture_fixture() {
        let project = ProjectFixture::new();
        let path = project.add_texture("t.png", 3, 2, [1, 2, 3, 255]);
        let image = image::open(path).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
    }
}
