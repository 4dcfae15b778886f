//! Error types for cache configuration.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific errors.
///
/// Lookups and inserts never fail; errors only arise when a configuration
/// cannot produce a usable cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must hold at least one entry
    #[error("Cache capacity must be greater than zero")]
    ZeroCapacity,

    /// Entries would expire immediately
    #[error("Cache TTL must be greater than zero")]
    ZeroTtl,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
