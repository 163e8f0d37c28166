use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU cache. A capacity of zero yields a cache that stores nothing.
pub struct Cache<K, V> {
    inner: Option<Mutex<LruCache<K, V>>>,
}

impl<K: Hash + Eq, V: Clone> Cache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Cache {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let inner = self.inner.as_ref()?;
        let mut cache = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        if let Some(inner) = &self.inner {
            let mut cache = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            cache.put(key, value);
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let inner = self.inner.as_ref()?;
        let mut cache = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.pop(key)
    }
}
