// Polyglot - translation resolution and caching for Rust
//
// This library re-exports the provider, cache and logging crates behind a
// single dependency.

// Re-export the translation engine
pub use polyglot_i18n::*;

// Re-export member crates
pub use polyglot_cache;
pub use polyglot_i18n;
pub use polyglot_log;

// Prelude for common imports
pub mod prelude {
    pub use polyglot_i18n::prelude::*;
    pub use polyglot_i18n::{
        BatchResponse, ManagedProvider, MemorySource, ProviderFactory, ProviderState,
        StringInterner, TranslateRequest,
    };

    pub use polyglot_cache::{CacheError, LruCache};

    pub use polyglot_log::{Format as LogFormat, Level as LogLevel, LogConfig};

    pub use async_trait::async_trait;
}
