//! Provider registry.
//!
//! The registry is the composition root: it holds provider factories, hooks
//! and middlewares, builds wrapped providers on demand, and stops every
//! provider it built on shutdown.
//!
//! ```rust,ignore
//! use polyglot_i18n::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Registry::with_defaults();
//! registry.add_middleware(Arc::new(LoggingMiddleware::new()))?;
//!
//! let provider = registry.create_provider("document", &ProviderConfig::default())?;
//! provider.start(&cancel).await?;
//! let text = provider.translate("welcome", "en", &params).await?;
//!
//! registry.shutdown(&cancel).await?;
//! ```

use crate::cached::CachedProvider;
use crate::config::ProviderConfig;
use crate::document_provider::DocumentProvider;
use crate::hooks::{ErrorEvent, Hook, ObserverList, ProviderEvent, StartEvent, StopEvent, TranslateEvent};
use crate::interpolate::Params;
use crate::middleware::{Middleware, MiddlewareChain, MiddlewareObserver, TranslateRequest};
use crate::provider::{Provider, ProviderState};
use crate::source::DocumentSource;
use crate::{I18nError, Result};
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use polyglot_log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Name the built-in document factory registers under.
pub const DOCUMENT_PROVIDER: &str = "document";

/// Builds providers from configuration.
pub trait ProviderFactory: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Reject configurations this factory cannot build from.
    fn validate(&self, config: &ProviderConfig) -> Result<()> {
        config.validate()
    }

    /// Build an unstarted provider.
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn Provider>>;
}

/// Builds [`DocumentProvider`]s, wrapped in a [`CachedProvider`] when the
/// configuration enables caching.
pub struct DocumentProviderFactory {
    name: String,
    source: Option<Arc<dyn DocumentSource>>,
}

impl DocumentProviderFactory {
    /// Factory reading documents from `config.source.base_path`.
    pub fn new() -> Self {
        Self {
            name: DOCUMENT_PROVIDER.to_string(),
            source: None,
        }
    }

    /// Read documents from `source` instead of the filesystem.
    pub fn with_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Register under a different name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for DocumentProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for DocumentProviderFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
        let provider = match &self.source {
            Some(source) => DocumentProvider::new(&self.name, config.clone(), Arc::clone(source))?,
            None => DocumentProvider::from_config(&self.name, config.clone())?,
        };

        match &config.cache {
            Some(cache) => Ok(Arc::new(CachedProvider::new(Arc::new(provider), cache.clone())?)),
            None => Ok(Arc::new(provider)),
        }
    }
}

/// A provider wrapped with the hooks and middlewares registered when it was
/// created.
pub struct ManagedProvider {
    inner: Arc<dyn Provider>,
    chain: MiddlewareChain,
    hooks: ObserverList<ProviderEvent>,
    middleware_events: ObserverList<ProviderEvent>,
}

impl ManagedProvider {
    fn new(
        inner: Arc<dyn Provider>,
        hooks: ObserverList<ProviderEvent>,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        let mut middleware_events = ObserverList::new();
        for middleware in &middlewares {
            middleware_events.insert(Arc::new(MiddlewareObserver(Arc::clone(middleware))));
        }

        Self {
            chain: MiddlewareChain::new(Arc::clone(&inner), middlewares),
            inner,
            hooks,
            middleware_events,
        }
    }

    /// The unwrapped provider.
    pub fn inner(&self) -> &Arc<dyn Provider> {
        &self.inner
    }

    /// Hooks this instance notifies, in delivery order.
    pub fn hook_names(&self) -> Vec<String> {
        self.hooks.names()
    }

    /// Middlewares this instance runs, in registration order.
    pub fn middleware_names(&self) -> Vec<String> {
        self.middleware_events.names()
    }

    async fn run(&self, request: TranslateRequest) -> Result<String> {
        let started = Instant::now();
        let key = request.key.clone();
        let language = request.language.clone();
        let count = request.count;

        let value = self.chain.execute(request).await?;

        if !self.hooks.is_empty() {
            let event = ProviderEvent::Translate(TranslateEvent {
                provider: self.inner.name().to_string(),
                key,
                language,
                count,
                value: value.clone(),
                elapsed: started.elapsed(),
            });
            // Delivered off the request path; hooks still run in priority order.
            let hooks = self.hooks.clone();
            tokio::spawn(async move {
                hooks.notify(&event).await;
            });
        }

        Ok(value)
    }

    async fn notify_error(&self, operation: &'static str, error: &I18nError) {
        let event = ProviderEvent::Error(ErrorEvent {
            provider: self.inner.name().to_string(),
            operation,
            error: error.to_string(),
        });
        self.hooks.notify(&event).await;
        self.middleware_events.notify(&event).await;
    }
}

impl fmt::Debug for ManagedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedProvider")
            .field("provider", &self.inner.name())
            .field("state", &self.inner.state())
            .field("hooks", &self.hooks)
            .field("middlewares", &self.middleware_events)
            .finish()
    }
}

#[async_trait]
impl Provider for ManagedProvider {
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
        self.run(TranslateRequest::new(key, language, params.clone()))
            .await
    }

    async fn translate_plural(
        &self,
        key: &str,
        language: &str,
        count: i64,
        params: &Params,
    ) -> Result<String> {
        self.run(TranslateRequest::plural(key, language, count, params.clone()))
            .await
    }

    fn has_translation(&self, key: &str, language: &str) -> bool {
        self.inner.has_translation(key, language)
    }

    async fn load_translations(&self, cancel: &CancellationToken) -> Result<()> {
        self.inner.load_translations(cancel).await
    }

    async fn start(&self, cancel: &CancellationToken) -> Result<()> {
        let starting = ProviderEvent::Start(StartEvent {
            provider: self.inner.name().to_string(),
            languages: self.inner.supported_languages(),
        });
        if let Err(e) = self.middleware_events.dispatch(&starting).await {
            warn!("Middleware vetoed start of {}: {}", self.inner.name(), e);
            return Err(e);
        }

        if let Err(e) = self.inner.start(cancel).await {
            self.notify_error("start", &e).await;
            return Err(e);
        }

        let started = ProviderEvent::Start(StartEvent {
            provider: self.inner.name().to_string(),
            languages: self.inner.loaded_languages(),
        });
        self.hooks.notify(&started).await;
        Ok(())
    }

    async fn stop(&self, cancel: &CancellationToken) -> Result<()> {
        let result = self.inner.stop(cancel).await;

        let stopped = ProviderEvent::Stop(StopEvent {
            provider: self.inner.name().to_string(),
            error: result.as_ref().err().map(ToString::to_string),
        });
        self.hooks.notify(&stopped).await;
        self.middleware_events.notify(&stopped).await;

        if let Err(e) = &result {
            self.notify_error("stop", e).await;
        }
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

/// Factories, hooks and middlewares, plus every provider built from them.
#[derive(Default)]
pub struct Registry {
    factories: RwLock<HashMap<String, Arc<dyn ProviderFactory>>>,
    hooks: RwLock<ObserverList<ProviderEvent>>,
    middlewares: RwLock<Vec<Arc<dyn Middleware>>>,
    instances: Mutex<Vec<Arc<ManagedProvider>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in [`DocumentProviderFactory`] registered.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        let factory: Arc<dyn ProviderFactory> = Arc::new(DocumentProviderFactory::new());
        registry
            .factories
            .write()
            .insert(factory.name().to_string(), factory);
        registry
    }

    /// Register a provider factory under its name.
    pub fn register_provider(&self, factory: Arc<dyn ProviderFactory>) -> Result<()> {
        validate_name("provider", factory.name())?;

        let mut factories = self.factories.write();
        if factories.contains_key(factory.name()) {
            return Err(I18nError::Duplicate {
                kind: "provider",
                name: factory.name().to_string(),
            });
        }

        debug!("Registered provider factory {}", factory.name());
        factories.insert(factory.name().to_string(), factory);
        Ok(())
    }

    /// Remove a provider factory. Providers it already built are unaffected.
    pub fn unregister_provider(&self, name: &str) -> Result<()> {
        self.factories
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_registered("provider", name))
    }

    /// Register a hook.
    pub fn add_hook(&self, hook: Arc<dyn Hook>) -> Result<()> {
        validate_name("hook", hook.name())?;

        let mut hooks = self.hooks.write();
        if hooks.contains(hook.name()) {
            return Err(I18nError::Duplicate {
                kind: "hook",
                name: hook.name().to_string(),
            });
        }

        debug!("Registered hook {} (priority {})", hook.name(), hook.priority());
        hooks.insert(hook);
        Ok(())
    }

    /// Remove a hook.
    pub fn remove_hook(&self, name: &str) -> Result<()> {
        self.hooks
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_registered("hook", name))
    }

    /// Register a middleware. It becomes the outermost one for providers
    /// created afterwards.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware>) -> Result<()> {
        validate_name("middleware", middleware.name())?;

        let mut middlewares = self.middlewares.write();
        if middlewares.iter().any(|m| m.name() == middleware.name()) {
            return Err(I18nError::Duplicate {
                kind: "middleware",
                name: middleware.name().to_string(),
            });
        }

        debug!("Registered middleware {}", middleware.name());
        middlewares.push(middleware);
        Ok(())
    }

    /// Remove a middleware.
    pub fn remove_middleware(&self, name: &str) -> Result<()> {
        let mut middlewares = self.middlewares.write();
        let at = middlewares
            .iter()
            .position(|m| m.name() == name)
            .ok_or_else(|| not_registered("middleware", name))?;
        middlewares.remove(at);
        Ok(())
    }

    /// Build a provider with the factory registered as `name`.
    ///
    /// The provider is wrapped with the hooks and middlewares registered at
    /// this moment; later registrations do not reach it. It is returned
    /// unstarted and tracked for [`shutdown`](Self::shutdown).
    pub fn create_provider(&self, name: &str, config: &ProviderConfig) -> Result<Arc<ManagedProvider>> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| I18nError::UnknownProvider(name.to_string()))?;

        factory.validate(config)?;
        let provider = factory.create(config)?;

        let hooks = self.hooks.read().clone();
        let middlewares = self.middlewares.read().clone();
        debug!(
            "Creating provider {} with {} hooks and {} middlewares",
            name,
            hooks.len(),
            middlewares.len()
        );

        let managed = Arc::new(ManagedProvider::new(provider, hooks, middlewares));
        self.instances.lock().push(Arc::clone(&managed));
        Ok(managed)
    }

    /// Stop every provider this registry created and stop tracking them.
    ///
    /// Providers are stopped concurrently; all failures are collected into
    /// one [`I18nError::Aggregate`].
    pub async fn shutdown(&self, cancel: &CancellationToken) -> Result<()> {
        let instances = std::mem::take(&mut *self.instances.lock());
        info!("Shutting down {} providers", instances.len());

        let errors: Vec<I18nError> = join_all(instances.iter().map(|p| p.stop(cancel)))
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            warn!("{} providers failed to stop", errors.len());
            Err(I18nError::Aggregate(errors))
        }
    }

    /// Number of tracked providers.
    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// Registered factory names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Hook names in delivery order.
    pub fn hook_names(&self) -> Vec<String> {
        self.hooks.read().names()
    }

    /// Middleware names in registration order.
    pub fn middleware_names(&self) -> Vec<String> {
        self.middlewares
            .read()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.provider_names())
            .field("hooks", &self.hook_names())
            .field("middlewares", &self.middleware_names())
            .field("instances", &self.instance_count())
            .finish()
    }
}

fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(I18nError::InvalidName {
            kind,
            reason: "name must not be empty".to_string(),
        });
    }
    Ok(())
}

fn not_registered(kind: &'static str, name: &str) -> I18nError {
    I18nError::NotRegistered {
        kind,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::FnHook;
    use crate::source::MemorySource;

    struct Named(&'static str);

    impl ProviderFactory for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
            let source = Arc::new(MemorySource::new().with_file("en.json", r#"{"k":"v"}"#));
            Ok(Arc::new(DocumentProvider::new(self.0, config.clone(), source)?))
        }
    }

    fn noop_hook(name: &str, priority: i32) -> Arc<dyn Hook> {
        Arc::new(FnHook::new(name, priority, |_: &ProviderEvent| Ok(())))
    }

    #[test]
    fn test_register_provider_validation() {
        let registry = Registry::new();
        assert!(matches!(
            registry.register_provider(Arc::new(Named(" "))),
            Err(I18nError::InvalidName { kind: "provider", .. })
        ));

        registry.register_provider(Arc::new(Named("a"))).unwrap();
        assert!(matches!(
            registry.register_provider(Arc::new(Named("a"))),
            Err(I18nError::Duplicate { kind: "provider", .. })
        ));
        assert_eq!(registry.provider_names(), vec!["a"]);

        registry.unregister_provider("a").unwrap();
        assert!(matches!(
            registry.unregister_provider("a"),
            Err(I18nError::NotRegistered { .. })
        ));
    }

    #[test]
    fn test_hook_and_middleware_names_are_unique() {
        let registry = Registry::new();
        registry.add_hook(noop_hook("audit", 0)).unwrap();
        assert!(registry.add_hook(noop_hook("audit", 5)).is_err());
        assert!(registry.add_hook(noop_hook("", 5)).is_err());

        registry
            .add_middleware(Arc::new(crate::middleware::LoggingMiddleware::new()))
            .unwrap();
        assert!(registry
            .add_middleware(Arc::new(crate::middleware::LoggingMiddleware::new()))
            .is_err());

        registry.remove_hook("audit").unwrap();
        registry.remove_middleware("logging").unwrap();
        assert!(registry.remove_hook("audit").is_err());
        assert!(registry.remove_middleware("logging").is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let registry = Registry::new();
        assert!(matches!(
            registry.create_provider("missing", &ProviderConfig::default()),
            Err(I18nError::UnknownProvider(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected_by_factory() {
        let registry = Registry::new();
        registry.register_provider(Arc::new(Named("a"))).unwrap();

        let config = ProviderConfig::default().with_workers(0);
        assert!(matches!(
            registry.create_provider("a", &config),
            Err(I18nError::Config(_))
        ));
        assert_eq!(registry.instance_count(), 0);
    }

    #[test]
    fn test_snapshot_at_creation() {
        let registry = Registry::new();
        registry.register_provider(Arc::new(Named("a"))).unwrap();
        registry.add_hook(noop_hook("first", 2)).unwrap();
        registry.add_hook(noop_hook("zeroth", 1)).unwrap();

        let provider = registry.create_provider("a", &ProviderConfig::default()).unwrap();
        registry.add_hook(noop_hook("late", 0)).unwrap();

        assert_eq!(provider.hook_names(), vec!["zeroth", "first"]);
        assert_eq!(registry.hook_names(), vec!["late", "zeroth", "first"]);
        assert_eq!(registry.instance_count(), 1);
    }

    #[test]
    fn test_with_defaults() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.provider_names(), vec![DOCUMENT_PROVIDER]);
    }

    #[tokio::test]
    async fn test_document_factory_adds_cache_layer() {
        let source: Arc<dyn DocumentSource> =
            Arc::new(MemorySource::new().with_file("en.json", r#"{"k":"v"}"#));
        let factory = DocumentProviderFactory::new().with_source(source);

        let plain = factory.create(&ProviderConfig::default()).unwrap();
        let cached = factory
            .create(&ProviderConfig::default().with_cache(polyglot_cache::CacheConfig::default()))
            .unwrap();

        let cancel = CancellationToken::new();
        plain.start(&cancel).await.unwrap();
        cached.start(&cancel).await.unwrap();

        assert_eq!(plain.name(), DOCUMENT_PROVIDER);
        assert_eq!(cached.translate("k", "en", &Params::new()).await.unwrap(), "v");
        assert_eq!(plain.translate("k", "en", &Params::new()).await.unwrap(), "v");
    }
}
