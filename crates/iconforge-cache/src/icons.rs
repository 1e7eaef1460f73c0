//! Decoded thumbnails held in memory.

use crate::key::AssetKey;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Shared handle to a decoded thumbnail. Dropping the last handle releases it.
pub type IconHandle = Arc<RgbaImage>;

/// In-memory map of loaded thumbnails.
///
/// The cache never reads from disk by itself; it is filled by successful
/// generations or by manifest loads performed by the service.
#[derive(Debug, Default)]
pub struct IconCache {
    icons: HashMap<AssetKey, IconHandle>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_get(&self, key: &AssetKey) -> Option<IconHandle> {
        self.icons.get(key).cloned()
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.icons.contains_key(key)
    }

    /// Stores `image` for `key`, releasing any previous handle.
    pub fn put(&mut self, key: AssetKey, image: RgbaImage) -> IconHandle {
        let handle = Arc::new(image);
        self.icons.insert(key, Arc::clone(&handle));
        handle
    }

    /// Releases and removes the icon for `key`. Returns whether one was held.
    pub fn remove(&mut self, key: &AssetKey) -> bool {
        self.icons.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.icons.clear();
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.icons.keys()
    }
}

/// Decodes a thumbnail file.
pub fn load_icon_file(path: &Path) -> Result<RgbaImage, image::ImageError> {
    Ok(image::open(path)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn image(value: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_put_replaces_and_releases() {
        let mut cache = IconCache::new();
        let key = AssetKey::new("a.png");

        let first = cache.put(key.clone(), image(1));
        assert_eq!(Arc::strong_count(&first), 2);

        cache.put(AssetKey::new("A.PNG"), image(2));
        assert_eq!(cache.len(), 1);
        // The cache dropped its reference to the first image.
        assert_eq!(Arc::strong_count(&first), 1);
        assert_eq!(cache.try_get(&key).unwrap().get_pixel(0, 0).0[0], 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = IconCache::new();
        cache.put(AssetKey::new("a.png"), image(1));
        cache.put(AssetKey::new("b.png"), image(2));

        assert!(cache.remove(&AssetKey::new("a.png")));
        assert!(!cache.remove(&AssetKey::new("a.png")));
        assert!(cache.try_get(&AssetKey::new("a.png")).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_icon_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("icon.png");
        image(9).save(&path).unwrap();
        assert_eq!(load_icon_file(&path).unwrap().dimensions(), (2, 2));
        assert!(load_icon_file(&tmp.path().join("missing.png")).is_err());
    }
}
