//! Asset identity and classification.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Stable, case-insensitive identity of an asset.
///
/// Project assets use their slash-separated project-relative path; engine
/// assets carry the [`crate::ENGINE_KEY_PREFIX`] namespace. Comparison,
/// hashing and ordering ignore ASCII and Unicode case.
#[derive(Clone)]
pub struct AssetKey {
    display: String,
    folded: String,
}

impl AssetKey {
    /// Normalizes `raw`: backslashes become `/`, a leading `./` is dropped and
    /// runs of slashes collapse (the `scheme://` separator is kept intact).
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().replace('\\', "/");
        let (scheme, rest) = match trimmed.find("://") {
            Some(pos) => trimmed.split_at(pos + 3),
            None => ("", trimmed.as_str()),
        };

        let mut path = String::with_capacity(rest.len());
        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            if segment == "." && path.is_empty() {
                continue;
            }
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);
        }

        let display = format!("{}{}", scheme, path);
        let folded = display.to_lowercase();
        Self { display, folded }
    }

    /// Key for a file under `root`, or `None` if `path` is not inside `root`.
    pub fn from_relative(root: &Path, path: &Path, prefix: &str) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() {
            return None;
        }
        Some(Self::new(&format!("{}{}", prefix, joined)))
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Lower-cased form used for comparison and icon file naming.
    pub fn folded(&self) -> &str {
        &self.folded
    }
}

impl PartialEq for AssetKey {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for AssetKey {}

impl Hash for AssetKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for AssetKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssetKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl fmt::Debug for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetKey({:?})", self.display)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for AssetKey {
    fn from(raw: &str) -> Self {
        AssetKey::new(raw)
    }
}

impl Serialize for AssetKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> Deserialize<'de> for AssetKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AssetKey::new(&raw))
    }
}

/// Asset kinds that get a preview thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetType {
    Texture,
    Model,
    Prefab,
}

impl AssetType {
    pub const ALL: [AssetType; 3] = [AssetType::Texture, AssetType::Model, AssetType::Prefab];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Texture => "Texture",
            AssetType::Model => "Model",
            AssetType::Prefab => "Prefab",
        }
    }

    /// Classifies a file by name; `None` means the file is not eligible.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".prefab") || name.ends_with(".prefab.json") {
            return Some(AssetType::Prefab);
        }
        let ext = name.rsplit_once('.')?.1;
        match ext {
            "png" | "jpg" | "jpeg" | "tga" | "bmp" => Some(AssetType::Texture),
            "gltf" | "glb" => Some(AssetType::Model),
            _ => None,
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thumbnail file name for `key`: a stable hash of the folded key, never the
/// source file name.
pub fn icon_file_name(key: &AssetKey) -> String {
    let hash = blake3::hash(key.folded().as_bytes()).to_hex();
    format!("{}.png", &hash.as_str()[..32])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_key_normalization() {
        assert_eq!(AssetKey::new("textures\\grass.png").as_str(), "textures/grass.png");
        assert_eq!(AssetKey::new("./textures//grass.png").as_str(), "textures/grass.png");
        assert_eq!(AssetKey::new("  models/a.glb ").as_str(), "models/a.glb");
        assert_eq!(
            AssetKey::new("engine://meshes//cube.glb").as_str(),
            "engine://meshes/cube.glb"
        );
    }

    #[test]
    fn test_key_case_insensitive() {
        let a = AssetKey::new("Textures/Grass.PNG");
        let b = AssetKey::new("textures/grass.png");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
        // Display keeps the caller's spelling
        assert_eq!(a.to_string(), "Textures/Grass.PNG");
    }

    #[test]
    fn test_key_from_relative() {
        let root = PathBuf::from("/project");
        let key = AssetKey::from_relative(&root, &root.join("models").join("ship.glb"), "").unwrap();
        assert_eq!(key.as_str(), "models/ship.glb");

        let engine = AssetKey::from_relative(&root, &root.join("cube.glb"), "engine://").unwrap();
        assert_eq!(engine.as_str(), "engine://cube.glb");

        assert!(AssetKey::from_relative(&root, Path::new("/elsewhere/a.png"), "").is_none());
    }

    #[test]
    fn test_key_serde_roundtrip_normalizes() {
        let key: AssetKey = serde_json::from_str("\"a\\\\b.png\"").unwrap();
        assert_eq!(key.as_str(), "a/b.png");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"a/b.png\"");
    }

    #[test]
    fn test_asset_type_from_path() {
        assert_eq!(AssetType::from_path(Path::new("a/b.PNG")), Some(AssetType::Texture));
        assert_eq!(AssetType::from_path(Path::new("b.jpeg")), Some(AssetType::Texture));
        assert_eq!(AssetType::from_path(Path::new("ship.glb")), Some(AssetType::Model));
        assert_eq!(AssetType::from_path(Path::new("ship.gltf")), Some(AssetType::Model));
        assert_eq!(AssetType::from_path(Path::new("cart.prefab")), Some(AssetType::Prefab));
        assert_eq!(AssetType::from_path(Path::new("cart.prefab.json")), Some(AssetType::Prefab));
        assert_eq!(AssetType::from_path(Path::new("config.json")), None);
        assert_eq!(AssetType::from_path(Path::new("sound.wav")), None);
        assert_eq!(AssetType::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_icon_file_name_stable_and_case_folded() {
        let a = icon_file_name(&AssetKey::new("Models/Ship.glb"));
        let b = icon_file_name(&AssetKey::new("models/ship.glb"));
        let c = icon_file_name(&AssetKey::new("models/ship2.glb"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), 32 + ".png".len());
        assert!(!a.contains("ship"));
    }
}
