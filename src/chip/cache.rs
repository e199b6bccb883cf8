//! Memo cache for rendered images.
//!
//! Entries are keyed by component id and content, package and size. Each key owns its own
//! slot lock, so concurrent requests for one key compute at most once while
//! requests for different keys proceed in parallel. A failed computation
//! drops its slot from the map and the next request retries.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::chip::descriptor::ComponentDescriptor;
use crate::chip::error::RenderResult;
use crate::chip::rendered::RenderedChipImage;

/// Identifies one render request.
///
/// The component id alone is not unique (derived ids are slugs of the
/// name), so the key also carries the descriptor's content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Component identifier.
    pub component_id: String,
    /// Content fingerprint of the descriptor.
    pub fingerprint: u64,
    /// Package-type token as requested.
    pub package: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub fn new(
        component_id: impl Into<String>,
        package: impl Into<String>,
        size: (u32, u32),
    ) -> Self {
        Self {
            component_id: component_id.into(),
            fingerprint: 0,
            package: package.into(),
            width: size.0,
            height: size.1,
        }
    }

    /// Keys a render of `descriptor` as `package` (trimmed) at `size`.
    #[must_use]
    pub fn for_descriptor(
        descriptor: &ComponentDescriptor,
        package: &str,
        size: (u32, u32),
    ) -> Self {
        Self {
            fingerprint: descriptor.fingerprint(),
            ..Self::new(descriptor.id.clone(), package.trim(), size)
        }
    }
}

type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Single-flight memo cache.
pub struct RenderCache<V = RenderedChipImage> {
    slots: Mutex<HashMap<CacheKey, Slot<V>>>,
}

impl<V> Default for RenderCache<V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> fmt::Debug for RenderCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl<V> RenderCache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, computing it with `compute` if
    /// absent.
    ///
    /// Callers racing on the same key wait for the first one's result.
    ///
    /// # Errors
    ///
    /// Returns whatever `compute` returns; nothing is cached in that case.
    pub fn get_or_try_insert_with<F>(&self, key: CacheKey, compute: F) -> RenderResult<Arc<V>>
    where
        F: FnOnce() -> RenderResult<V>,
    {
        // The map lock is never held while waiting on a slot lock.
        let slot = Arc::clone(lock(&self.slots).entry(key.clone()).or_default());

        let mut value = lock(&slot);
        if let Some(hit) = value.as_ref() {
            return Ok(Arc::clone(hit));
        }
        match compute() {
            Ok(computed) => {
                let fresh = Arc::new(computed);
                *value = Some(Arc::clone(&fresh));
                // a failed caller ahead of us may have dropped this slot
                lock(&self.slots)
                    .entry(key)
                    .or_insert_with(|| Arc::clone(&slot));
                Ok(fresh)
            }
            Err(e) => {
                let mut slots = lock(&self.slots);
                if slots.get(&key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                    slots.remove(&key);
                }
                Err(e)
            }
        }
    }

    /// Returns the cached value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let slot = lock(&self.slots).get(key).map(Arc::clone)?;
        let value = lock(&slot);
        value.as_ref().map(Arc::clone)
    }

    /// Number of filled entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<V>> = lock(&self.slots).values().map(Arc::clone).collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        lock(&self.slots).clear();
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        lock(&self.slots).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::error::RenderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn key(id: &str) -> CacheKey {
        CacheKey::new(id, "DIP-40", (400, 400))
    }

    #[test]
    fn second_request_is_a_hit() {
        let cache: RenderCache<u32> = RenderCache::new();
        let a = cache.get_or_try_insert_with(key("z80"), || Ok(7)).unwrap();
        let b = cache.get_or_try_insert_with(key("z80"), || Ok(8)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b, 7);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn size_is_part_of_the_key() {
        let cache: RenderCache<u32> = RenderCache::new();
        cache.get_or_try_insert_with(key("z80"), || Ok(1)).unwrap();
        cache
            .get_or_try_insert_with(CacheKey::new("z80", "DIP-40", (200, 400)), || Ok(2))
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache: RenderCache<u32> = RenderCache::new();
        let err = cache
            .get_or_try_insert_with(key("bad"), || Err(RenderError::surface("boom")))
            .unwrap_err();
        assert!(matches!(err, RenderError::DrawingSurfaceFailure { .. }));
        assert!(cache.get(&key("bad")).is_none());
        assert!(cache.is_empty());
        let v = cache.get_or_try_insert_with(key("bad"), || Ok(3)).unwrap();
        assert_eq!(*v, 3);
    }

    #[test]
    fn failed_computation_leaves_no_slot() {
        let cache: RenderCache<u32> = RenderCache::new();
        for id in ["a", "b", "c"] {
            cache
                .get_or_try_insert_with(key(id), || Err(RenderError::surface("boom")))
                .unwrap_err();
        }
        assert_eq!(cache.slot_count(), 0);

        cache.get_or_try_insert_with(key("a"), || Ok(1)).unwrap();
        assert_eq!(cache.slot_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn same_id_different_content_are_separate_entries() {
        use crate::chip::descriptor::Category;

        let ula40 = ComponentDescriptor::new("ULA", Category::Custom)
            .with_pin_names((1..=40).map(|i| format!("P{i}")));
        let ula28 = ComponentDescriptor::new("ULA", Category::Custom)
            .with_pin_names((1..=28).map(|i| format!("P{i}")));
        let k40 = CacheKey::for_descriptor(&ula40, "DIP-40", (240, 260));
        let k28 = CacheKey::for_descriptor(&ula28, " DIP-40 ", (240, 260));
        assert_eq!(k40.component_id, k28.component_id);
        assert_eq!(k28.package, "DIP-40");
        assert_ne!(k40, k28);

        let cache: RenderCache<usize> = RenderCache::new();
        let a = cache.get_or_try_insert_with(k40, || Ok(40)).unwrap();
        let b = cache.get_or_try_insert_with(k28, || Ok(28)).unwrap();
        assert_eq!((*a, *b), (40, 28));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache: RenderCache<u32> = RenderCache::new();
        cache.get_or_try_insert_with(key("a"), || Ok(1)).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key("a")).is_none());
    }

    #[test]
    fn concurrent_requests_compute_once() {
        let cache: Arc<RenderCache<usize>> = Arc::new(RenderCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache
                        .get_or_try_insert_with(key("vic"), || {
                            thread::sleep(Duration::from_millis(20));
                            Ok(calls.fetch_add(1, Ordering::SeqCst))
                        })
                        .unwrap()
                })
            })
            .collect();

        let values: Vec<usize> = handles.into_iter().map(|h| *h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| *v == 0));
    }
}
