use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A small injected cache with a bounded entry lifetime.
///
/// Replaces the source system's module-level tenant cache: owned by whoever
/// constructs it, no ambient global state. Entries expire `ttl` after
/// insertion; expired entries are dropped on access.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((value, inserted_at)) if inserted_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, (value, Instant::now()));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key).map(|(value, _)| value)
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let ttl = self.ttl;
        entries.retain(|_, (_, inserted_at)| inserted_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn returns_fresh_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("tenant-a", 1);
        assert_eq!(cache.get(&"tenant-a"), Some(1));
        assert_eq!(cache.get(&"tenant-b"), None);
    }

    #[test]
    fn expires_entries_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.insert("tenant-a", 1);
        sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"tenant-a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn survives_a_poisoned_lock() {
        struct ExplodingClone;
        impl Clone for ExplodingClone {
            fn clone(&self) -> Self {
                panic!("clone failed")
            }
        }

        let cache: TtlCache<&str, ExplodingClone> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", ExplodingClone);
        // The panicking clone fires while the guard is held, poisoning it.
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = cache.get(&"a");
        }));
        assert!(result.is_err());
        assert_eq!(cache.len(), 1);
        cache.remove(&"a");
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let cache = TtlCache::new(Duration::from_millis(30));
        cache.insert("old", 1);
        sleep(Duration::from_millis(40));
        cache.insert("new", 2);
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"new"), Some(2));
    }
}
