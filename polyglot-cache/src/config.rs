//! Cache configuration types.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default number of entries kept by a cache.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default time-to-live for cached entries (5 minutes).
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Cache configuration.
///
/// Deserializes from any serde format; missing fields take their defaults:
///
/// ```
/// use polyglot_cache::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(r#"{ "capacity": 64 }"#).unwrap();
/// assert_eq!(config.capacity, 64);
/// assert_eq!(config.ttl(), std::time::Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,

    /// Time-to-live for each entry, in milliseconds
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::default().with_capacity(capacity).with_ttl(ttl)
    }

    /// Set the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Entry time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Validate and return the capacity as a [`NonZeroUsize`].
    pub fn validate(&self) -> CacheResult<NonZeroUsize> {
        if self.ttl_ms == 0 {
            return Err(CacheError::ZeroTtl);
        }
        NonZeroUsize::new(self.capacity).ok_or(CacheError::ZeroCapacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::default()
            .with_capacity(10)
            .with_ttl(Duration::from_millis(250));

        assert_eq!(config.capacity, 10);
        assert_eq!(config.ttl_ms, 250);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = CacheConfig::new(0, Duration::from_secs(1));
        assert_eq!(config.validate(), Err(CacheError::ZeroCapacity));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = CacheConfig::new(8, Duration::ZERO);
        assert_eq!(config.validate(), Err(CacheError::ZeroTtl));
    }

    #[test]
    fn test_validate_returns_capacity() {
        let config = CacheConfig::new(8, Duration::from_secs(1));
        assert_eq!(config.validate().map(NonZeroUsize::get), Ok(8));
    }
}
