//! LRU+TTL caching decorator for providers.
//!
//! ```rust,ignore
//! use polyglot_i18n::{CachedProvider, DocumentProvider};
//! use polyglot_cache::CacheConfig;
//! use std::sync::Arc;
//!
//! let base = Arc::new(DocumentProvider::from_config("docs", config)?);
//! let cached = CachedProvider::new(base, CacheConfig::default())?;
//!
//! cached.translate("welcome", "en", &params).await?; // miss
//! cached.translate("welcome", "en", &params).await?; // hit
//! assert_eq!(cached.stats().hits, 1);
//! ```

use crate::interpolate::Params;
use crate::plural::PluralForm;
use crate::pool::STRINGS;
use crate::provider::{Provider, ProviderState, validate_request};
use crate::Result;
use async_trait::async_trait;
use polyglot_cache::{CacheConfig, CacheMetrics, CacheStats, LruCache};
use polyglot_log::{debug, trace};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock as AsyncRwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const SEPARATOR: char = '\u{1f}';

/// A cached translation result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Interpolated translation
    pub value: String,
    /// Insertion time plus TTL
    pub expires_at: Instant,
    /// Whether the entry came from a plural lookup
    pub is_plural_variant: bool,
    /// Resolved plural forms for plural entries
    pub variants: HashMap<PluralForm, String>,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration, form: Option<PluralForm>) -> Self {
        let mut variants = HashMap::new();
        if let Some(form) = form {
            variants.insert(form, value.clone());
        }

        Self {
            value,
            expires_at: Instant::now() + ttl,
            is_plural_variant: form.is_some(),
            variants,
        }
    }

    /// Whether the entry is past its expiry.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Provider decorator serving repeated translations from an LRU cache.
pub struct CachedProvider {
    inner: Arc<dyn Provider>,
    cache: LruCache<String, CacheEntry>,
    ttl: Duration,
    metrics: CacheMetrics,
    // Translations hold it shared; clearing takes it exclusively.
    gate: AsyncRwLock<()>,
}

impl CachedProvider {
    /// Wrap `inner` with a cache sized and timed by `config`.
    pub fn new(inner: Arc<dyn Provider>, config: CacheConfig) -> Result<Self> {
        let capacity = config.validate()?;
        debug!(
            "Caching provider {} (capacity {}, ttl {:?})",
            inner.name(),
            capacity,
            config.ttl()
        );

        Ok(Self {
            inner,
            cache: LruCache::new(capacity),
            ttl: config.ttl(),
            metrics: CacheMetrics::new(),
            gate: AsyncRwLock::new(()),
        })
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &Arc<dyn Provider> {
        &self.inner
    }

    /// Entry time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Hit/miss counters and cache occupancy.
    pub fn stats(&self) -> CacheStats {
        self.metrics
            .snapshot(self.cache.len(), self.cache.capacity().get())
    }

    /// Zero the hit/miss counters without touching entries.
    pub fn reset_stats(&self) {
        self.metrics.reset();
    }

    /// Drop every entry and reset the counters.
    ///
    /// Waits for in-flight translations, so none of them can repopulate the
    /// cache or bump a counter halfway through.
    pub async fn clear_cache(&self) {
        let _gate = self.gate.write().await;
        self.cache.clear();
        self.metrics.reset();
        debug!("Cleared translation cache for {}", self.inner.name());
    }

    fn lookup(&self, cache_key: &str, plural: bool) -> Option<String> {
        let entry = self.cache.get(cache_key)?;

        if entry.is_expired() {
            self.cache.remove(cache_key);
            trace!("Expired cache entry for {}", self.inner.name());
            return None;
        }

        if entry.is_plural_variant != plural {
            return None;
        }

        Some(entry.value)
    }

    async fn cached<F>(&self, cache_key: String, form: Option<PluralForm>, load: F) -> Result<String>
    where
        F: Future<Output = Result<String>> + Send,
    {
        let _gate = self.gate.read().await;
        let started = std::time::Instant::now();

        if let Some(value) = self.lookup(&cache_key, form.is_some()) {
            self.metrics.record_hit();
            self.metrics.record_latency(started.elapsed());
            return Ok(value);
        }

        self.metrics.record_miss();
        let value = load.await?;
        self.cache
            .set(cache_key, CacheEntry::new(value.clone(), self.ttl, form));
        self.metrics.record_latency(started.elapsed());
        Ok(value)
    }
}

impl fmt::Debug for CachedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedProvider")
            .field("inner", &self.inner.name())
            .field("ttl", &self.ttl)
            .field("cache", &self.cache)
            .finish()
    }
}

#[async_trait]
impl Provider for CachedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_language(&self) -> &str {
        self.inner.default_language()
    }

    fn supported_languages(&self) -> Vec<String> {
        self.inner.supported_languages()
    }

    fn state(&self) -> ProviderState {
        self.inner.state()
    }

    async fn translate(&self, key: &str, language: &str, params: &Params) -> Result<String> {
        validate_request(key, language)?;
        let cache_key = cache_key(key, language, params, None);
        self.cached(cache_key, None, self.inner.translate(key, language, params))
            .await
    }

    async fn translate_plural(
        &self,
        key: &str,
        language: &str,
        count: i64,
        params: &Params,
    ) -> Result<String> {
        validate_request(key, language)?;
        let cache_key = cache_key(key, language, params, Some(count));
        let form = PluralForm::for_count(count);
        self.cached(
            cache_key,
            Some(form),
            self.inner.translate_plural(key, language, count, params),
        )
        .await
    }

    fn has_translation(&self, key: &str, language: &str) -> bool {
        self.inner.has_translation(key, language)
    }

    async fn load_translations(&self, cancel: &CancellationToken) -> Result<()> {
        self.inner.load_translations(cancel).await?;
        self.clear_cache().await;
        Ok(())
    }

    async fn start(&self, cancel: &CancellationToken) -> Result<()> {
        self.inner.start(cancel).await
    }

    async fn stop(&self, cancel: &CancellationToken) -> Result<()> {
        let result = self.inner.stop(cancel).await;
        self.clear_cache().await;
        result
    }

    async fn health(&self) -> Result<()> {
        self.inner.health().await
    }

    fn loaded_languages(&self) -> Vec<String> {
        self.inner.loaded_languages()
    }

    fn loaded_keys(&self, language: &str) -> Vec<String> {
        self.inner.loaded_keys(language)
    }
}

/// Build the cache key for one lookup.
///
/// Singular and plural lookups use different prefixes; the language is part
/// of the key, and parameters contribute an order-independent hash.
fn cache_key(key: &str, language: &str, params: &Params, count: Option<i64>) -> String {
    let mut buf = STRINGS.acquire();
    buf.push(if count.is_some() { 'p' } else { 's' });
    buf.push(SEPARATOR);
    buf.push_str(language);
    buf.push(SEPARATOR);
    buf.push_str(key);
    buf.push(SEPARATOR);
    let _ = write!(buf, "{:016x}", params_hash(params));
    if let Some(count) = count {
        buf.push(SEPARATOR);
        let _ = write!(buf, "{}", count);
    }
    buf.as_str().to_owned()
}

/// Hash parameters in name order so map iteration order never matters.
fn params_hash(params: &Params) -> u64 {
    if params.is_empty() {
        return 0;
    }

    let mut names: Vec<&String> = params.keys().collect();
    names.sort_unstable();

    let mut hasher = DefaultHasher::new();
    for name in names {
        name.hash(&mut hasher);
        if let Some(value) = params.get(name) {
            value.to_string().hash(&mut hasher);
        }
    }
    hasher.finish()
}
