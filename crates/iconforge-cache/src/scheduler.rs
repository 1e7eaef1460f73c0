//! Throttled generation queue.
//!
//! The host calls into the cache from a single cooperative frame loop, so
//! thumbnail jobs are spread across frames: at most one job is handed out per
//! tick, and never sooner than `min_interval` after the previous one.

use crate::key::AssetKey;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Preview state of a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    /// Not cached and not scheduled.
    None,
    /// Waiting in the pending queue.
    Queued,
    /// Job in progress.
    Generating,
    /// Last attempt failed; waits for a content change or explicit retry.
    Failed,
    /// A thumbnail is loaded in memory.
    Ready,
}

impl Status {
    /// Resolves the state from membership flags.
    ///
    /// The scheduler keeps pending, generating and failed disjoint. A loaded
    /// icon can coexist with a pending regeneration, in which case the
    /// scheduling state wins so hosts can show progress over the stale icon.
    pub fn resolve(pending: bool, generating: bool, failed: bool, loaded: bool) -> Status {
        if generating {
            Status::Generating
        } else if pending {
            Status::Queued
        } else if failed {
            Status::Failed
        } else if loaded {
            Status::Ready
        } else {
            Status::None
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::None => "none",
            Status::Queued => "queued",
            Status::Generating => "generating",
            Status::Failed => "failed",
            Status::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// FIFO of keys awaiting generation plus the in-flight and failed sets.
#[derive(Debug)]
pub struct GenerationScheduler {
    pending: VecDeque<AssetKey>,
    queued: HashSet<AssetKey>,
    generating: Option<AssetKey>,
    /// Failed keys with the fingerprint they failed on, when it was known.
    failed: HashMap<AssetKey, Option<String>>,
    min_interval: Duration,
    last_dequeue: Option<Instant>,
}

impl GenerationScheduler {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            queued: HashSet::new(),
            generating: None,
            failed: HashMap::new(),
            min_interval,
            last_dequeue: None,
        }
    }

    /// Appends `key` to the tail of the queue.
    ///
    /// No-op (returns `false`) when the key is already pending, currently
    /// generating, or failed. Failed keys only come back through [`requeue`].
    ///
    /// [`requeue`]: GenerationScheduler::requeue
    pub fn enqueue(&mut self, key: AssetKey) -> bool {
        if self.queued.contains(&key)
            || self.generating.as_ref() == Some(&key)
            || self.failed.contains_key(&key)
        {
            return false;
        }
        self.queued.insert(key.clone());
        self.pending.push_back(key);
        true
    }

    /// Clears any failure for `key` and enqueues it.
    pub fn requeue(&mut self, key: AssetKey) -> bool {
        self.failed.remove(&key);
        self.enqueue(key)
    }

    /// Hands out the next job, if one is waiting and the throttle allows it.
    ///
    /// Returns `None` while a job is still marked generating, when the queue
    /// is empty, or when less than the minimum interval has passed since the
    /// previous dequeue.
    pub fn tick(&mut self, now: Instant) -> Option<AssetKey> {
        if self.generating.is_some() || self.pending.is_empty() {
            return None;
        }
        if let Some(last) = self.last_dequeue {
            if now.saturating_duration_since(last) < self.min_interval {
                return None;
            }
        }
        let key = self.pending.pop_front()?;
        self.queued.remove(&key);
        self.last_dequeue = Some(now);
        self.generating = Some(key.clone());
        Some(key)
    }

    /// Time until [`tick`](GenerationScheduler::tick) can hand out a job, or
    /// `None` when nothing is waiting.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        if self.pending.is_empty() {
            return None;
        }
        let wait = match self.last_dequeue {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        };
        Some(wait)
    }

    /// Marks the in-flight job for `key` as finished successfully.
    pub fn complete(&mut self, key: &AssetKey) {
        if self.generating.as_ref() == Some(key) {
            self.generating = None;
        }
        self.failed.remove(key);
    }

    /// Marks the in-flight job for `key` as failed.
    pub fn fail(&mut self, key: &AssetKey, fingerprint: Option<String>) {
        if self.generating.as_ref() == Some(key) {
            self.generating = None;
        }
        if self.queued.remove(key) {
            self.pending.retain(|k| k != key);
        }
        self.failed.insert(key.clone(), fingerprint);
    }

    /// Drops every trace of `key` (pruning).
    pub fn forget(&mut self, key: &AssetKey) {
        if self.queued.remove(key) {
            self.pending.retain(|k| k != key);
        }
        if self.generating.as_ref() == Some(key) {
            self.generating = None;
        }
        self.failed.remove(key);
    }

    /// Empties the queue and failure set.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.queued.clear();
        self.generating = None;
        self.failed.clear();
    }

    pub fn is_pending(&self, key: &AssetKey) -> bool {
        self.queued.contains(key)
    }

    pub fn is_generating(&self, key: &AssetKey) -> bool {
        self.generating.as_ref() == Some(key)
    }

    pub fn is_failed(&self, key: &AssetKey) -> bool {
        self.failed.contains_key(key)
    }

    /// Fingerprint recorded when `key` failed (outer `None`: not failed).
    pub fn failed_fingerprint(&self, key: &AssetKey) -> Option<Option<&str>> {
        self.failed.get(key).map(|fp| fp.as_deref())
    }

    pub fn failed_keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.failed.keys()
    }

    pub fn pending_keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Status of `key` given whether its icon is loaded.
    pub fn status(&self, key: &AssetKey, loaded: bool) -> Status {
        Status::resolve(
            self.is_pending(key),
            self.is_generating(key),
            self.is_failed(key),
            loaded,
        )
    }
}
