//! Bounded memoization cache shared by concurrent lookups.
//!
//! Reads take a shared lock. A miss is filled by the caller after it has
//! computed the value outside the lock, so two racing callers may both
//! compute; the first insert wins and the second is dropped. Once the cache
//! holds `capacity` entries the oldest insertion is evicted.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

/// Fixed-capacity map with first-in first-out eviction.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    state: RwLock<CacheState<K, V>>,
    capacity: usize,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    // A panic while holding the lock cannot leave a half-written entry
    // behind, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, CacheState<K, V>> {
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<K, V>> {
        self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns a clone of the cached value for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.read().entries.get(key).cloned()
    }

    /// Stores `value` unless `key` is already present, and returns the value
    /// that is cached afterwards.
    pub fn insert(&self, key: K, value: V) -> V {
        let mut state = self.write();
        if let Some(existing) = state.entries.get(&key) {
            return existing.clone();
        }
        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, value.clone());
        value
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut state = self.write();
        state.entries.clear();
        state.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_get_after_insert() {
        let cache = MemoCache::new(4);
        assert_eq!(cache.get(&"go"), None);
        cache.insert("go", true);
        assert_eq!(cache.get(&"go"), Some(true));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = MemoCache::new(4);
        assert_eq!(cache.insert("go", 1), 1);
        assert_eq!(cache.insert("go", 2), 1);
        assert_eq!(cache.get(&"go"), Some(1));
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let cache = MemoCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = MemoCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(1, "x");
        cache.insert(2, "y");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some("y"));
    }

    #[test]
    fn test_concurrent_fill_is_consistent() {
        let cache = Arc::new(MemoCache::new(1024));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..256u32 {
                        let value = cache.get(&i).unwrap_or_else(|| cache.insert(i, i * 2));
                        assert_eq!(value, i * 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 256);
    }

    #[test]
    fn test_clear() {
        let cache = MemoCache::new(8);
        cache.insert("go", 3);
        cache.clear();
        assert!(cache.is_empty());
    }
}
