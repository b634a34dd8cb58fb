//! Compilation cache - memoized exports keyed by library and target.
//!
//! Each key owns a slot behind its own mutex, so concurrent requests for
//! the same key compute once while unrelated keys proceed in parallel. The
//! map's shard lock is only held long enough to fetch the slot.
//!
//! Every entry belongs to a generation. Bumping the generation makes all
//! earlier entries unreachable; they are pruned on the bump itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use dashmap::DashMap;

use crate::compilation::engine::CompilationEngine;
use crate::core::{CompilationTarget, LibraryExport, LibraryIdentity};

/// Identifies one cached export.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub library: LibraryIdentity,
    pub target: CompilationTarget,
}

impl CacheKey {
    pub fn new(library: LibraryIdentity, target: CompilationTarget) -> Self {
        CacheKey { library, target }
    }
}

type Slot = Arc<Mutex<Option<Arc<LibraryExport>>>>;

/// Generation-aware memo table for library exports.
#[derive(Default)]
pub struct CompilationCache {
    entries: DashMap<(CacheKey, u64), Slot>,
    generation: AtomicU64,
}

impl CompilationCache {
    pub fn new() -> Self {
        CompilationCache::default()
    }

    /// Return the cached export for `key`, computing it with `compute` on a
    /// miss.
    ///
    /// Within one generation `compute` runs at most once per key, even under
    /// concurrent callers. If it fails the key stays a miss and the error is
    /// returned; a later call retries.
    pub fn get_or_compute<E>(
        &self,
        key: &CacheKey,
        compute: impl FnOnce() -> Result<LibraryExport, E>,
    ) -> Result<Arc<LibraryExport>, E> {
        let generation = self.generation();
        let slot = Arc::clone(
            &self
                .entries
                .entry((key.clone(), generation))
                .or_default(),
        );

        // A panic in another computation leaves the slot empty, never
        // half-written, so the poison flag carries no information.
        let mut value = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(export) = value.as_ref() {
            return Ok(Arc::clone(export));
        }

        let export = Arc::new(compute()?);
        *value = Some(Arc::clone(&export));
        tracing::debug!("cached export of {} for {}", key.library, key.target);
        Ok(export)
    }

    /// The cached export for `key` in the current generation, if any.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<LibraryExport>> {
        let slot = self
            .entries
            .get(&(key.clone(), self.generation()))
            .map(|slot| Arc::clone(&slot))?;
        let value = slot.lock().unwrap_or_else(PoisonError::into_inner);
        value.clone()
    }

    /// Drop the current generation's entry for `key`.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(&(key.clone(), self.generation()));
    }

    /// Start a new generation, hiding every existing entry.
    pub fn bump_generation(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.entries.retain(|(_, entry_generation), _| *entry_generation >= generation);
        tracing::info!("compilation cache advanced to generation {}", generation);
        generation
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Number of populated entries in the current generation.
    ///
    /// Never waits on a computation in progress; such entries are not yet
    /// populated and are not counted.
    pub fn len(&self) -> usize {
        let generation = self.generation();
        let slots: Vec<Slot> = self
            .entries
            .iter()
            .filter(|entry| entry.key().1 == generation)
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        slots
            .iter()
            .filter(|slot| match slot.try_lock() {
                Ok(value) => value.is_some(),
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
                Err(TryLockError::WouldBlock) => false,
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bump the generation whenever `engine` reports a changed input file.
    ///
    /// The engine only holds a weak handle, so it does not keep the cache
    /// alive.
    pub fn subscribe(self: &Arc<Self>, engine: &dyn CompilationEngine) {
        let cache = Arc::downgrade(self);
        engine.on_input_file_changed(Box::new(move |path| {
            if let Some(cache) = cache.upgrade() {
                tracing::debug!("{} changed", path.display());
                cache.bump_generation();
            }
        }));
    }
}
