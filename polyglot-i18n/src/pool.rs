//! Object pooling for hot paths
//!
//! Interpolation and cache-key construction build short-lived strings on
//! every call. Pooling the scratch buffers keeps their capacity around
//! between calls instead of growing fresh allocations each time.
//!
//! ```
//! use polyglot_i18n::pool::StringPool;
//!
//! let pool = StringPool::strings(16, 1024);
//! {
//!     let mut buf = pool.acquire();
//!     buf.push_str("scratch");
//! } // returned and cleared here
//!
//! assert_eq!(pool.idle(), 1);
//! assert!(pool.acquire().is_empty());
//! ```

use crate::interpolate::Params;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

type Create<T> = Box<dyn Fn() -> T + Send + Sync>;
type Recycle<T> = Box<dyn Fn(&mut T) -> bool + Send + Sync>;

/// Pool counters.
#[derive(Debug, Default)]
pub struct PoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    returned: AtomicU64,
    discarded: AtomicU64,
}

impl PoolStats {
    /// Acquisitions served from the pool.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Acquisitions that had to create a new object.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Objects put back for reuse.
    pub fn returned(&self) -> u64 {
        self.returned.load(Ordering::Relaxed)
    }

    /// Objects dropped because the pool was full or they were oversized.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

/// Thread-safe pool of reusable objects.
pub struct ObjectPool<T> {
    idle: Mutex<Vec<T>>,
    max_idle: usize,
    create: Create<T>,
    recycle: Recycle<T>,
    stats: PoolStats,
}

impl<T> ObjectPool<T> {
    /// Create a pool keeping at most `max_idle` objects.
    ///
    /// `recycle` resets an object on return and decides whether it is worth
    /// keeping.
    pub fn new<C, R>(max_idle: usize, create: C, recycle: R) -> Self
    where
        C: Fn() -> T + Send + Sync + 'static,
        R: Fn(&mut T) -> bool + Send + Sync + 'static,
    {
        Self {
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
            create: Box::new(create),
            recycle: Box::new(recycle),
            stats: PoolStats::default(),
        }
    }

    /// Take an object, creating one when the pool is empty.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let reused = self.idle.lock().pop();
        let item = match reused {
            Some(item) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                item
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                (self.create)()
            }
        };

        Pooled {
            item: Some(item),
            pool: self,
        }
    }

    fn release(&self, mut item: T) {
        if !(self.recycle)(&mut item) {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(item);
            self.stats.returned.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of idle objects ready for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Pool counters.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

/// Pool of `String` scratch buffers.
pub type StringPool = ObjectPool<String>;

impl ObjectPool<String> {
    /// String pool whose buffers start at 64 bytes and are dropped instead
    /// of returned once they grow past `max_capacity`.
    pub fn strings(max_idle: usize, max_capacity: usize) -> Self {
        Self::new(
            max_idle,
            || String::with_capacity(64),
            move |buf: &mut String| {
                buf.clear();
                buf.capacity() <= max_capacity
            },
        )
    }
}

/// Process-wide buffer pool shared by interpolation and cache-key building.
pub(crate) static STRINGS: Lazy<StringPool> = Lazy::new(|| StringPool::strings(256, 4096));

/// Scratch parameter maps for plural lookups that inject `count`.
pub(crate) static PARAMS: Lazy<ObjectPool<Params>> = Lazy::new(|| {
    ObjectPool::new(64, Params::new, |map: &mut Params| {
        map.clear();
        map.capacity() <= 64
    })
});

/// An object borrowed from an [`ObjectPool`]; returned on drop.
pub struct Pooled<'a, T> {
    item: Option<T>,
    pool: &'a ObjectPool<T>,
}

impl<T> Pooled<'_, T> {
    /// Keep the object instead of returning it to the pool.
    pub fn detach(mut self) -> T {
        match self.item.take() {
            Some(item) => item,
            None => unreachable!("pooled object taken twice"),
        }
    }
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("pooled object already detached"),
        }
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(item) => item,
            None => unreachable!("pooled object already detached"),
        }
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_reuse() {
        let pool = StringPool::strings(4, 1024);
        {
            let mut buf = pool.acquire();
            buf.push_str("hello");
        }
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 5);
        assert_eq!(pool.stats().hits(), 1);
        assert_eq!(pool.stats().misses(), 1);
    }

    #[test]
    fn test_oversized_buffers_are_discarded() {
        let pool = StringPool::strings(4, 16);
        {
            let mut buf = pool.acquire();
            buf.push_str(&"x".repeat(1000));
        }
        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.stats().discarded(), 1);
    }

    #[test]
    fn test_max_idle() {
        let pool = StringPool::strings(1, 1024);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.stats().returned(), 1);
        assert_eq!(pool.stats().discarded(), 1);
    }

    #[test]
    fn test_detach_skips_return() {
        let pool = StringPool::strings(4, 1024);
        let mut buf = pool.acquire();
        buf.push_str("kept");
        let owned = buf.detach();
        assert_eq!(owned, "kept");
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_map_pool() {
        let pool: ObjectPool<HashMap<String, u32>> = ObjectPool::new(
            2,
            HashMap::new,
            |map: &mut HashMap<String, u32>| {
                map.clear();
                true
            },
        );
        {
            let mut map = pool.acquire();
            map.insert("a".into(), 1);
        }
        assert!(pool.acquire().is_empty());
    }
}
