//! Durable record of generated thumbnails.
//!
//! The manifest is loaded once, mutated in memory and written back in
//! batches. Writes go to a temporary file in the cache directory which then
//! replaces the manifest, so a crash leaves either the old or the new file.

use crate::error::CacheError;
use crate::hasher::CACHE_FORMAT_VERSION;
use crate::key::{AssetKey, AssetType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Record of one generated thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Fingerprint of the source file the thumbnail was rendered from.
    #[serde(rename = "sourceHash")]
    pub fingerprint: String,
    /// Thumbnail file name, relative to the cache directory.
    pub icon_file: String,
    pub asset_type: AssetType,
}

/// On-disk manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<AssetKey, ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Manifest plus its persistence policy.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    manifest: Manifest,
    dirty: bool,
    dirty_ops: u32,
    dirty_since: Option<Instant>,
    flush_threshold: u32,
    flush_max_age: Duration,
}

impl ManifestStore {
    /// Loads the manifest at `path`.
    ///
    /// A missing, unreadable or unparsable file, or one written by another
    /// cache format version, yields an empty manifest. Never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let manifest = Self::read(&path);
        Self {
            path,
            manifest,
            dirty: false,
            dirty_ops: 0,
            dirty_since: None,
            flush_threshold: 16,
            flush_max_age: Duration::from_secs(2),
        }
    }

    fn read(path: &Path) -> Manifest {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Manifest::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable icon manifest, starting empty");
                return Manifest::default();
            }
        };
        match serde_json::from_str::<Manifest>(&text) {
            Ok(manifest) if manifest.version == CACHE_FORMAT_VERSION => manifest,
            Ok(manifest) => {
                tracing::info!(
                    found = manifest.version,
                    expected = CACHE_FORMAT_VERSION,
                    "icon manifest version changed, regenerating all thumbnails"
                );
                Manifest::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt icon manifest, starting empty");
                Manifest::default()
            }
        }
    }

    /// Sets the batching policy: flush after `threshold` mutations or once the
    /// oldest unflushed mutation is `max_age` old.
    pub fn with_flush_policy(mut self, threshold: u32, max_age: Duration) -> Self {
        self.flush_threshold = threshold.max(1);
        self.flush_max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn get(&self, key: &AssetKey) -> Option<&ManifestEntry> {
        self.manifest.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.manifest.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.manifest.entries.keys()
    }

    /// Inserts or replaces an entry, returning the previous one.
    pub fn upsert(&mut self, key: AssetKey, entry: ManifestEntry) -> Option<ManifestEntry> {
        let previous = self.manifest.entries.insert(key, entry);
        self.mark_dirty();
        previous
    }

    pub fn remove(&mut self, key: &AssetKey) -> Option<ManifestEntry> {
        let removed = self.manifest.entries.remove(key);
        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    pub fn mark_dirty(&mut self) {
        if !self.dirty {
            self.dirty_since = Some(Instant::now());
        }
        self.dirty = true;
        self.dirty_ops = self.dirty_ops.saturating_add(1);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the manifest if it is dirty and a flush is due.
    ///
    /// Due means `force`, the mutation counter reached the threshold, or the
    /// oldest pending mutation is older than the max age. Returns `true` when
    /// the file was written; a failed write is logged and the store stays
    /// dirty so a later call retries.
    pub fn flush_if_due(&mut self, force: bool, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        let aged = self
            .dirty_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.flush_max_age);
        if !(force || self.dirty_ops >= self.flush_threshold || aged) {
            return false;
        }

        match self.save() {
            Ok(()) => {
                self.dirty = false;
                self.dirty_ops = 0;
                self.dirty_since = None;
                tracing::debug!(path = %self.path.display(), entries = self.len(), "icon manifest flushed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save icon manifest");
                false
            }
        }
    }

    /// Unconditionally writes the manifest.
    pub fn save(&self) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let json = serde_json::to_string_pretty(&self.manifest).map_err(|source| CacheError::Json {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| CacheError::io(&dir, e))?;
        if let Err(e) = tmp.write_all(json.as_bytes()) {
            return Err(CacheError::io(tmp.path(), e));
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|source| CacheError::Persist {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}
