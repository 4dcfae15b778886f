//! In-memory caching for Polyglot.
//!
//! Provides the building blocks the translation layer caches with:
//!
//! - [`LruCache`] - fixed-capacity, thread-safe least-recently-used cache
//! - [`CacheConfig`] - capacity and time-to-live settings
//! - [`CacheMetrics`] / [`CacheStats`] - hit, miss and latency counters
//!
//! # Examples
//!
//! ```
//! use polyglot_cache::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), CacheError> {
//! let config = CacheConfig::new(128, Duration::from_secs(60));
//! let cache: LruCache<String, String> = LruCache::new(config.validate()?);
//! let metrics = CacheMetrics::new();
//!
//! cache.set("greeting:en".to_string(), "Hello".to_string());
//! match cache.get("greeting:en") {
//!     Some(_) => metrics.record_hit(),
//!     None => metrics.record_miss(),
//! }
//!
//! assert_eq!(metrics.snapshot(cache.len(), 128).hits, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lru;
pub mod metrics;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use lru::LruCache;
pub use metrics::{CacheMetrics, CacheStats};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::CacheConfig;
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::lru::LruCache;
    pub use crate::metrics::{CacheMetrics, CacheStats};
}
