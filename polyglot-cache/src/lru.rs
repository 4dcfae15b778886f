//! Thread-safe least-recently-used cache.
//!
//! A [`lru::LruCache`] behind one mutex, so recency updates on `get` and
//! eviction on `set` are never interleaved between threads.

use parking_lot::Mutex;
use polyglot_log::trace;
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Fixed-capacity LRU cache safe to share between threads.
///
/// ```
/// use polyglot_cache::LruCache;
/// use std::num::NonZeroUsize;
///
/// let cache = LruCache::new(NonZeroUsize::new(2).unwrap());
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.get("a");       // "a" is now the most recent
/// cache.set("c", 3);    // evicts "b"
///
/// assert_eq!(cache.get("b"), None);
/// assert_eq!(cache.get("a"), Some(1));
/// ```
pub struct LruCache<K, V> {
    inner: Mutex<lru::LruCache<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(lru::LruCache::new(capacity)),
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    ///
    /// A miss leaves the recency order untouched.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Insert or update `key`, making it the most recently used entry.
    ///
    /// Inserting a new key into a full cache evicts the least recently used
    /// entry first and returns it.
    pub fn set(&self, key: K, value: V) -> Option<(K, V)> {
        let mut inner = self.inner.lock();

        if inner.contains(&key) {
            inner.put(key, value);
            return None;
        }

        let evicted = inner.push(key, value);
        if evicted.is_some() {
            trace!(target: "polyglot::cache", "Evicted least recently used entry");
        }
        evicted
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().pop(key)
    }

    /// Check for `key` without touching the recency order.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().contains(key)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> NonZeroUsize {
        self.inner.lock().cap()
    }

    /// Snapshot of the keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().iter().map(|(key, _)| key.clone()).collect()
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruCache")
            .field("len", &inner.len())
            .field("capacity", &inner.cap())
            .finish()
    }
}
