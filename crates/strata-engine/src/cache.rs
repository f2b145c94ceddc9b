//! Compute-once cache for expensive, immutable build products.
//!
//! The outer map lock is held only long enough to find or create a key's
//! slot. Computation happens under the slot's own lock, so two callers of
//! the same key never compute it twice, and callers of other keys are
//! never blocked by it.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

// A panic inside a build leaves the slot empty, which is a valid state.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Concurrency-safe memoizing map.
///
/// Values are shared as `Arc<V>`. Failed builds are not cached; the next
/// caller retries.
pub struct MeshCache<K, V> {
    slots: Mutex<IndexMap<K, Slot<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Eq + Hash + Clone, V> MeshCache<K, V> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(IndexMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The cached value for `key`, building it with `build` on first use.
    ///
    /// Concurrent callers for the same key wait for the first build
    /// instead of starting their own.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key).or_default())
        };
        let mut value = lock(&slot);
        if let Some(v) = value.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(v));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let v = Arc::new(build()?);
        *value = Some(Arc::clone(&v));
        Ok(v)
    }

    /// The cached value for `key`, if it has been built.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = lock(&self.slots).get(key).cloned()?;
        let value = lock(&slot);
        value.clone()
    }

    /// Number of keys with a built value.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<V>> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|s| lock(s).is_some()).count()
    }

    /// `true` if nothing has been built.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that ran a build.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop every cached value.
    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}

impl<K: Eq + Hash + Clone, V> Default for MeshCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
