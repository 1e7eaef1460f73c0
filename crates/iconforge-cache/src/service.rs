//! The host-facing cache service.

use crate::config::CacheConfig;
use crate::hasher::fingerprint;
use crate::icons::{load_icon_file, IconCache, IconHandle};
use crate::index::{AssetIndex, IndexedAsset};
use crate::key::{icon_file_name, AssetKey};
use crate::manifest::{ManifestEntry, ManifestStore};
use crate::preview::{PreviewGenerator, PreviewSettings};
use crate::scheduler::{GenerationScheduler, Status};
use iconforge_scene::{Renderer, SceneComposer};
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Cache directory, relative to the project directory.
pub const CACHE_SUBDIR: &str = ".cache/asset-icons";

/// Manifest file name inside the cache directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// What a single [`AssetPreviewCache::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing queued (or the cache is not initialized).
    Idle,
    /// Work is queued but the throttle interval has not elapsed.
    Throttled,
    /// The manifest entry was still valid; no rendering happened.
    CacheHit(AssetKey),
    /// A thumbnail was rendered and recorded.
    Generated(AssetKey),
    /// The job failed; the key is now in the failed set.
    Failed(AssetKey),
}

/// Read-only diagnostic counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub queue_length: usize,
    pub loaded_icons: usize,
    pub total_generated: u64,
    pub total_failed: u64,
    pub cache_hits: u64,
    #[serde(rename = "last_generation_ms", serialize_with = "serialize_millis")]
    pub last_generation: Option<Duration>,
}

fn serialize_millis<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&(d.as_nanos() as f64 / 1_000_000.0)),
        None => serializer.serialize_none(),
    }
}

/// Manifest plus the directory it lives in; present between
/// [`AssetPreviewCache::initialize`] and [`AssetPreviewCache::shutdown`].
struct Session {
    cache_dir: PathBuf,
    manifest: ManifestStore,
}

/// Incremental thumbnail cache for the assets of one project.
///
/// Must be driven from a single thread: see the crate docs.
pub struct AssetPreviewCache {
    index: Box<dyn AssetIndex>,
    composer: Box<dyn SceneComposer>,
    config: CacheConfig,
    generator: PreviewGenerator,
    session: Option<Session>,
    assets: HashMap<AssetKey, IndexedAsset>,
    icons: IconCache,
    scheduler: GenerationScheduler,
    /// Keys whose next job must render even if the fingerprint matches.
    forced: HashSet<AssetKey>,
    stats: CacheStats,
}

impl AssetPreviewCache {
    pub fn new(
        index: Box<dyn AssetIndex>,
        composer: Box<dyn SceneComposer>,
        config: CacheConfig,
    ) -> Self {
        let generator = PreviewGenerator::new(PreviewSettings::from(&config));
        let scheduler = GenerationScheduler::new(config.min_tick_interval());
        Self {
            index,
            composer,
            config,
            generator,
            session: None,
            assets: HashMap::new(),
            icons: IconCache::new(),
            scheduler,
            forced: HashSet::new(),
            stats: CacheStats::default(),
        }
    }

    /// Replaces the preview generator (custom strategies).
    pub fn with_generator(mut self, generator: PreviewGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Opens the cache for `project_dir`.
    ///
    /// Loads the manifest from `<project>/.cache/asset-icons`, indexes the
    /// project, prunes entries for assets that no longer exist and queues
    /// every eligible asset in key order. Assets whose thumbnail is current
    /// resolve as cache hits when their job runs. Returns the pruned keys.
    pub fn initialize(&mut self, project_dir: &Path) -> Vec<AssetKey> {
        if self.session.is_some() {
            self.shutdown();
        }

        let cache_dir = project_dir.join(CACHE_SUBDIR);
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!(path = %cache_dir.display(), error = %e, "failed to create icon cache directory");
        }
        let manifest = ManifestStore::load(cache_dir.join(MANIFEST_FILE))
            .with_flush_policy(self.config.flush_threshold, self.config.flush_max_age());
        tracing::info!(
            path = %cache_dir.display(),
            entries = manifest.len(),
            "icon cache opened"
        );
        self.session = Some(Session {
            cache_dir,
            manifest,
        });

        self.reindex();
        let pruned = self.prune();
        if !pruned.is_empty() {
            tracing::info!(count = pruned.len(), "pruned thumbnails of removed assets");
        }

        let mut keys: Vec<AssetKey> = self.assets.keys().cloned().collect();
        keys.sort();
        for key in keys {
            self.scheduler.enqueue(key);
        }
        tracing::debug!(queued = self.scheduler.len(), "initial thumbnail jobs queued");
        pruned
    }

    /// Flushes the manifest and releases every in-memory icon and job.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.manifest.flush_if_due(true, Instant::now());
            tracing::debug!(path = %session.cache_dir.display(), "icon cache closed");
        }
        self.icons.clear();
        self.scheduler.clear();
        self.forced.clear();
        self.assets.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.cache_dir.as_path())
    }

    pub fn manifest(&self) -> Option<&ManifestStore> {
        self.session.as_ref().map(|s| &s.manifest)
    }

    /// Runs at most one generation job. Call once per frame.
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> TickOutcome {
        self.tick_at(Instant::now(), renderer)
    }

    /// [`tick`](Self::tick) with an explicit clock reading.
    pub fn tick_at(&mut self, now: Instant, renderer: &mut dyn Renderer) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Idle;
        };
        session.manifest.flush_if_due(false, now);

        let Some(key) = self.scheduler.tick(now) else {
            return if self.scheduler.is_empty() {
                TickOutcome::Idle
            } else {
                TickOutcome::Throttled
            };
        };

        // Pruning forgets keys as they leave the index, so a dequeued key is
        // always indexed.
        let Some(asset) = self.assets.get(&key).cloned() else {
            tracing::debug!(key = %key, "dequeued key is not indexed, dropping job");
            self.scheduler.forget(&key);
            return TickOutcome::Idle;
        };
        let outcome = self.process(key, asset, renderer);
        if let Some(session) = self.session.as_mut() {
            session.manifest.flush_if_due(false, now);
        }
        outcome
    }

    fn process(
        &mut self,
        key: AssetKey,
        asset: IndexedAsset,
        renderer: &mut dyn Renderer,
    ) -> TickOutcome {
        let forced = self.forced.remove(&key);
        let Some(session) = self.session.as_mut() else {
            self.scheduler.forget(&key);
            return TickOutcome::Idle;
        };

        let fresh = match fingerprint(asset.asset_type, &asset.path) {
            Ok(fp) => fp,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cannot fingerprint asset");
                self.stats.total_failed += 1;
                self.scheduler.fail(&key, None);
                return TickOutcome::Failed(key);
            }
        };

        if !forced {
            if let Some(entry) = session.manifest.get(&key) {
                let recorded = session.cache_dir.join(&entry.icon_file);
                if entry.fingerprint == fresh
                    && entry.asset_type == asset.asset_type
                    && recorded.is_file()
                {
                    if self.icons.contains(&key) {
                        self.stats.cache_hits += 1;
                        self.scheduler.complete(&key);
                        return TickOutcome::CacheHit(key);
                    }
                    match load_icon_file(&recorded) {
                        Ok(image) => {
                            self.icons.put(key.clone(), image);
                            self.stats.cache_hits += 1;
                            self.scheduler.complete(&key);
                            return TickOutcome::CacheHit(key);
                        }
                        Err(e) => {
                            tracing::debug!(key = %key, error = %e, "unreadable thumbnail, regenerating");
                        }
                    }
                }
            }
        }

        let icon_file = icon_file_name(&key);
        let icon_path = session.cache_dir.join(&icon_file);
        let staging = session.cache_dir.join(format!("{}.partial", icon_file));

        let started = Instant::now();
        let ok = self.generator.generate(
            renderer,
            self.composer.as_ref(),
            asset.asset_type,
            &key,
            &asset.path,
            &staging,
        );
        self.stats.last_generation = Some(started.elapsed());

        let image = if ok {
            std::fs::rename(&staging, &icon_path)
                .map_err(|e| e.to_string())
                .and_then(|()| load_icon_file(&icon_path).map_err(|e| e.to_string()))
        } else {
            Err("preview generation failed".to_string())
        };

        let image = match image {
            Ok(image) => image,
            Err(reason) => {
                if ok {
                    tracing::warn!(key = %key, error = %reason, "failed to install thumbnail");
                }
                remove_file_if_exists(&staging);
                self.stats.total_failed += 1;
                self.scheduler.fail(&key, Some(fresh));
                return TickOutcome::Failed(key);
            }
        };

        let entry = ManifestEntry {
            fingerprint: fresh,
            icon_file: icon_file.clone(),
            asset_type: asset.asset_type,
        };
        if let Some(previous) = session.manifest.upsert(key.clone(), entry) {
            if previous.icon_file != icon_file {
                remove_file_if_exists(&session.cache_dir.join(&previous.icon_file));
            }
        }
        self.icons.put(key.clone(), image);
        self.stats.total_generated += 1;
        self.scheduler.complete(&key);
        tracing::debug!(
            key = %key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "thumbnail generated"
        );
        TickOutcome::Generated(key)
    }

    /// Re-reads the asset index and reconciles the cache with it.
    ///
    /// `None` means the change set is unknown: every eligible asset is queued
    /// (failed assets only if their content changed since the failure).
    /// `Some(keys)` re-queues each listed key that is still eligible, clearing
    /// any failure, and drops the ones that are not. Both finish with a prune
    /// pass; the pruned keys are returned in sorted order.
    pub fn on_assets_changed(&mut self, changed: Option<&HashSet<String>>) -> Vec<AssetKey> {
        if self.session.is_none() {
            tracing::debug!("asset change ignored, icon cache not initialized");
            return Vec::new();
        }
        self.reindex();

        match changed {
            None => {
                let mut keys: Vec<AssetKey> = self.assets.keys().cloned().collect();
                keys.sort();
                for key in keys {
                    let failed_with: Option<Option<String>> = self
                        .scheduler
                        .failed_fingerprint(&key)
                        .map(|fp| fp.map(str::to_owned));
                    let Some(failed_with) = failed_with else {
                        self.scheduler.enqueue(key);
                        continue;
                    };
                    let Some(asset) = self.assets.get(&key) else {
                        continue;
                    };
                    let current = fingerprint(asset.asset_type, &asset.path).ok();
                    if current.is_some() && current != failed_with {
                        tracing::debug!(key = %key, "failed asset changed, retrying");
                        self.scheduler.requeue(key);
                    }
                }
            }
            Some(changed) => {
                let mut keys: Vec<AssetKey> = changed.iter().map(|raw| AssetKey::new(raw)).collect();
                keys.sort();
                keys.dedup();
                for key in keys {
                    if self.assets.contains_key(&key) {
                        self.scheduler.requeue(key);
                    } else {
                        self.remove_key(&key);
                    }
                }
            }
        }

        let pruned = self.prune();
        if !pruned.is_empty() {
            tracing::info!(count = pruned.len(), "pruned thumbnails of removed assets");
        }
        pruned
    }

    /// Returns the loaded thumbnail for `asset_key`.
    ///
    /// On a miss the recorded thumbnail is loaded from disk when the manifest
    /// fingerprint still matches the source; otherwise an eligible asset with
    /// no scheduling state is queued and `None` is returned.
    pub fn try_get_icon(&mut self, asset_key: &str) -> Option<IconHandle> {
        let key = AssetKey::new(asset_key);
        if let Some(icon) = self.icons.try_get(&key) {
            return Some(icon);
        }
        if self.session.is_none() || !self.assets.contains_key(&key) {
            return None;
        }
        if self.try_load_from_manifest(&key) {
            return self.icons.try_get(&key);
        }
        if self.scheduler.status(&key, false) == Status::None {
            self.scheduler.enqueue(key);
        }
        None
    }

    fn try_load_from_manifest(&mut self, key: &AssetKey) -> bool {
        let (Some(session), Some(asset)) = (self.session.as_ref(), self.assets.get(key)) else {
            return false;
        };
        let Some(entry) = session.manifest.get(key) else {
            return false;
        };
        let path = session.cache_dir.join(&entry.icon_file);
        if entry.asset_type != asset.asset_type || !path.is_file() {
            return false;
        }
        match fingerprint(asset.asset_type, &asset.path) {
            Ok(fp) if fp == entry.fingerprint => {}
            Ok(_) => return false,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "cannot fingerprint asset");
                return false;
            }
        }
        match load_icon_file(&path) {
            Ok(image) => {
                self.icons.put(key.clone(), image);
                self.stats.cache_hits += 1;
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, path = %path.display(), error = %e, "failed to load thumbnail");
                false
            }
        }
    }

    pub fn status(&self, asset_key: &str) -> Status {
        let key = AssetKey::new(asset_key);
        self.scheduler.status(&key, self.icons.contains(&key))
    }

    /// Queues `asset_key` for a render that ignores the manifest, clearing a
    /// failure. Returns `false` when the asset is not eligible.
    pub fn regenerate_icon(&mut self, asset_key: &str) -> bool {
        let key = AssetKey::new(asset_key);
        if self.session.is_none() || !self.assets.contains_key(&key) {
            tracing::debug!(key = %key, "regenerate requested for unknown asset");
            return false;
        }
        self.forced.insert(key.clone());
        self.scheduler.requeue(key);
        true
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            queue_length: self.scheduler.len(),
            loaded_icons: self.icons.len(),
            ..self.stats.clone()
        }
    }

    /// `true` when no job is waiting.
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// How long until the next tick may start a job; `None` when idle.
    pub fn time_until_next_job(&self) -> Option<Duration> {
        self.scheduler.time_until_next(Instant::now())
    }

    /// Eligible assets from the latest index scan, sorted by key.
    pub fn eligible_assets(&self) -> Vec<&IndexedAsset> {
        let mut assets: Vec<&IndexedAsset> = self.assets.values().collect();
        assets.sort_by(|a, b| a.key.cmp(&b.key));
        assets
    }

    fn reindex(&mut self) {
        self.assets = self
            .index
            .list_eligible_assets()
            .into_iter()
            .map(|asset| (asset.key.clone(), asset))
            .collect();
    }

    /// Removes every trace of keys that are no longer eligible.
    fn prune(&mut self) -> Vec<AssetKey> {
        let mut stale: BTreeSet<AssetKey> = BTreeSet::new();
        if let Some(session) = &self.session {
            stale.extend(session.manifest.keys().cloned());
        }
        stale.extend(self.icons.keys().cloned());
        stale.extend(self.scheduler.pending_keys().cloned());
        stale.extend(self.scheduler.failed_keys().cloned());
        stale.extend(self.forced.iter().cloned());
        stale.retain(|key| !self.assets.contains_key(key));

        for key in &stale {
            self.remove_key(key);
        }
        stale.into_iter().collect()
    }

    fn remove_key(&mut self, key: &AssetKey) {
        if let Some(session) = self.session.as_mut() {
            if let Some(entry) = session.manifest.remove(key) {
                remove_file_if_exists(&session.cache_dir.join(&entry.icon_file));
            }
            remove_file_if_exists(&session.cache_dir.join(icon_file_name(key)));
        }
        self.icons.remove(key);
        self.scheduler.forget(key);
        self.forced.remove(key);
        tracing::debug!(key = %key, "thumbnail removed");
    }
}

fn remove_file_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to delete thumbnail"),
    }
}
