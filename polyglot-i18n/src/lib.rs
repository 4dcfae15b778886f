//! Translation resolution and caching for Polyglot.
//!
//! This crate turns a symbolic key plus a language into a localized,
//! parameter-interpolated string:
//!
//! - **Providers** - the [`Provider`] contract and the document-backed
//!   [`DocumentProvider`] with dot-path keys and a default-language fallback
//! - **Interpolation** - `{{name}}` placeholders filled from [`Params`]
//! - **Caching** - [`CachedProvider`], an LRU+TTL decorator for any provider
//! - **Batching** - [`BatchTranslator`], a worker pool over many requests
//! - **Composition** - [`Registry`] with provider factories, [`Hook`]s and
//!   [`Middleware`]s
//!
//! ## Quick Start
//!
//! ```
//! use polyglot_i18n::prelude::*;
//! use polyglot_i18n::source::MemorySource;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let source = MemorySource::new()
//!     .with_file("en.json", r#"{ "welcome": "Hi {{name}}" }"#)
//!     .with_file("fr.json", r#"{ "welcome": "Salut {{name}}" }"#);
//!
//! let config = ProviderConfig::new("en").with_languages(["en", "fr"]);
//! let provider = DocumentProvider::new("docs", config, Arc::new(source))?;
//!
//! let cancel = CancellationToken::new();
//! provider.start(&cancel).await?;
//!
//! let p = params([("name", json!("Ana"))]);
//! assert_eq!(provider.translate("welcome", "fr", &p).await?, "Salut Ana");
//! assert_eq!(provider.translate("missing", "fr", &p).await?, "missing");
//! # Ok(())
//! # }
//! ```
//!
//! ## Resolution
//!
//! A key is looked up in the requested language first, then (optionally) in
//! its base language (`pt` for `pt-BR`), then in the default language when
//! fallback is enabled. A key nobody resolves returns the key itself, or
//! [`I18nError::NotFound`] in strict mode.

pub mod batch;
mod cached;
mod config;
mod document;
mod document_provider;
mod error;
pub mod hooks;
mod intern;
mod interpolate;
pub mod middleware;
mod plural;
pub mod pool;
mod provider;
mod registry;
pub mod source;

pub use batch::{BatchRequest, BatchResponse, BatchTranslator};
pub use cached::{CacheEntry, CachedProvider};
pub use config::{ProviderConfig, SourceConfig};
pub use document::{DocumentFormat, DocumentSet, TranslationDocument};
pub use document_provider::DocumentProvider;
pub use error::I18nError;
pub use hooks::{
    ErrorEvent, FnHook, Hook, ObserverList, ProviderEvent, StartEvent, StopEvent, TranslateEvent,
};
pub use intern::StringInterner;
pub use interpolate::{Params, format_value, interpolate, params};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain, Next, TranslateRequest};
pub use plural::PluralForm;
pub use pool::{ObjectPool, Pooled, StringPool};
pub use provider::{COUNT_PARAM, Provider, ProviderState, validate_request};
pub use registry::{
    DOCUMENT_PROVIDER, DocumentProviderFactory, ManagedProvider, ProviderFactory, Registry,
};
pub use source::{DocumentSource, FsSource, MemorySource};

pub use polyglot_cache::{CacheConfig, CacheStats};
pub use tokio_util::sync::CancellationToken;

/// Result type for i18n operations
pub type Result<T> = std::result::Result<T, I18nError>;

/// Alias of [`Result`] for glob imports alongside `std::result::Result`.
pub type I18nResult<T> = Result<T>;

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        BatchRequest, BatchTranslator, CacheConfig, CachedProvider, CancellationToken,
        DocumentProvider, DocumentProviderFactory, Hook, I18nError, I18nResult, Middleware,
        Params, Provider, ProviderConfig, ProviderEvent, Registry, Result, interpolate, params,
    };
}
