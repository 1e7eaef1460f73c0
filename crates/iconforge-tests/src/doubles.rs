//! Test doubles for the cache's injected dependencies.

use iconforge_cache::{AssetIndex, AssetKey, AssetType, IndexedAsset};
use iconforge_scene::{Camera, PreviewScene, RenderError, RenderTarget, Renderer, SoftwareRenderer};
use image::RgbaImage;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Asset index whose contents the test edits directly.
///
/// Clones share the same list, so a test can keep one handle while the cache
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedIndex {
    assets: Rc<RefCell<Vec<IndexedAsset>>>,
}

impl ScriptedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path` under `key`, classifying it by extension.
    pub fn add(&self, key: &str, path: &Path) {
        let asset_type = AssetType::from_path(path).expect("fixture path must be eligible");
        self.add_typed(key, asset_type, path);
    }

    pub fn add_typed(&self, key: &str, asset_type: AssetType, path: &Path) {
        let key = AssetKey::new(key);
        let mut assets = self.assets.borrow_mut();
        assets.retain(|a| a.key != key);
        assets.push(IndexedAsset {
            key,
            asset_type,
            path: path.to_path_buf(),
        });
    }

    pub fn remove(&self, key: &str) {
        let key = AssetKey::new(key);
        self.assets.borrow_mut().retain(|a| a.key != key);
    }

    pub fn len(&self) -> usize {
        self.assets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.borrow().is_empty()
    }
}

impl AssetIndex for ScriptedIndex {
    fn list_eligible_assets(&self) -> Vec<IndexedAsset> {
        self.assets.borrow().clone()
    }
}

/// Software renderer that counts calls.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    pub inner: SoftwareRenderer,
    pub scene_renders: usize,
    pub downscales: usize,
}

impl CountingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_calls(&self) -> usize {
        self.scene_renders + self.downscales
    }
}

impl Renderer for CountingRenderer {
    fn render_scene(
        &mut self,
        scene: &PreviewScene,
        camera: &Camera,
        size: u32,
    ) -> Result<RenderTarget, RenderError> {
        self.scene_renders += 1;
        self.inner.render_scene(scene, camera, size)
    }

    fn downscale_image(
        &mut self,
        source: &RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RenderError> {
        self.downscales += 1;
        self.inner.downscale_image(source, width, height)
    }
}

/// Renderer that fails every call, as a lost graphics context would.
#[derive(Debug, Default)]
pub struct FailingRenderer {
    pub calls: usize,
}

impl Renderer for FailingRenderer {
    fn render_scene(
        &mut self,
        _scene: &PreviewScene,
        _camera: &Camera,
        _size: u32,
    ) -> Result<RenderTarget, RenderError> {
        self.calls += 1;
        Err(RenderError::Backend("device lost".into()))
    }

    fn downscale_image(
        &mut self,
        _source: &RgbaImage,
        _width: u32,
        _height: u32,
    ) -> Result<RgbaImage, RenderError> {
        self.calls += 1;
        Err(RenderError::Backend("device lost".into()))
    }
}

