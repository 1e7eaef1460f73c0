//! Live view of the assets that should have thumbnails.

use crate::key::{AssetKey, AssetType};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Key namespace for engine-bundled assets.
pub const ENGINE_KEY_PREFIX: &str = "engine://";

/// One eligible asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedAsset {
    pub key: AssetKey,
    pub asset_type: AssetType,
    /// Absolute path of the source file.
    pub path: PathBuf,
}

/// Source of truth for which assets exist.
///
/// Called again on every change notification, so implementations should
/// reflect the current state of the project rather than a snapshot.
pub trait AssetIndex {
    fn list_eligible_assets(&self) -> Vec<IndexedAsset>;
}

/// Filesystem-backed index over a project directory and optional engine
/// asset directory.
///
/// Hidden directories (including the thumbnail cache under `.cache`) are
/// skipped. Results are sorted by key.
#[derive(Debug, Clone)]
pub struct ProjectAssetIndex {
    root: PathBuf,
    engine_root: Option<PathBuf>,
}

impl ProjectAssetIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            engine_root: None,
        }
    }

    pub fn with_engine_assets(mut self, dir: impl Into<PathBuf>) -> Self {
        self.engine_root = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(root: &Path, prefix: &str, out: &mut Vec<IndexedAsset>) {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry during asset scan");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(asset_type) = AssetType::from_path(path) else {
                continue;
            };
            let Some(key) = AssetKey::from_relative(root, path, prefix) else {
                continue;
            };
            out.push(IndexedAsset {
                key,
                asset_type,
                path: path.to_path_buf(),
            });
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

impl AssetIndex for ProjectAssetIndex {
    fn list_eligible_assets(&self) -> Vec<IndexedAsset> {
        let mut assets = Vec::new();
        Self::scan(&self.root, "", &mut assets);
        if let Some(engine_root) = &self.engine_root {
            Self::scan(engine_root, ENGINE_KEY_PREFIX, &mut assets);
        }
        assets.sort_by(|a, b| a.key.cmp(&b.key));
        // Two spellings of the same path on a case-sensitive filesystem map
        // to one key; the first wins.
        assets.dedup_by(|b, a| a.key == b.key);
        tracing::debug!(count = assets.len(), root = %self.root.display(), "asset index scanned");
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn keys(assets: &[IndexedAsset]) -> Vec<String> {
        assets.iter().map(|a| a.key.to_string()).collect()
    }

    #[test]
    fn test_scan_classifies_and_sorts() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "textures/b.png");
        touch(tmp.path(), "textures/a.jpg");
        touch(tmp.path(), "models/ship.glb");
        touch(tmp.path(), "prefabs/cart.prefab.json");
        touch(tmp.path(), "audio/boom.wav");
        touch(tmp.path(), "notes.txt");

        let assets = ProjectAssetIndex::new(tmp.path()).list_eligible_assets();
        assert_eq!(
            keys(&assets),
            vec![
                "models/ship.glb",
                "prefabs/cart.prefab.json",
                "textures/a.jpg",
                "textures/b.png",
            ]
        );
        assert_eq!(assets[0].asset_type, AssetType::Model);
        assert_eq!(assets[1].asset_type, AssetType::Prefab);
        assert_eq!(assets[0].path, tmp.path().join("models/ship.glb"));
    }

    #[test]
    fn test_scan_skips_hidden_dirs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), ".cache/asset-icons/0123.png");
        touch(tmp.path(), ".git/logo.png");
        touch(tmp.path(), "ui/logo.png");

        let assets = ProjectAssetIndex::new(tmp.path()).list_eligible_assets();
        assert_eq!(keys(&assets), vec!["ui/logo.png"]);
    }

    #[test]
    fn test_engine_assets_namespaced() {
        let project = TempDir::new().unwrap();
        let engine = TempDir::new().unwrap();
        touch(project.path(), "cube.glb");
        touch(engine.path(), "meshes/cube.glb");

        let assets = ProjectAssetIndex::new(project.path())
            .with_engine_assets(engine.path())
            .list_eligible_assets();
        assert_eq!(keys(&assets), vec!["cube.glb", "engine://meshes/cube.glb"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let index = ProjectAssetIndex::new(tmp.path().join("nope"));
        assert!(index.list_eligible_assets().is_empty());
    }
}
