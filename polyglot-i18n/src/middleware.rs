//! Translation middleware.
//!
//! Middlewares wrap every translation made through a registry-created
//! provider. The most recently registered middleware is the outermost one:
//! with `[a, b]` registered, `b` runs first and hands off to `a`, which hands
//! off to the provider.
//!
//! ```
//! use polyglot_i18n::middleware::{Middleware, Next, TranslateRequest};
//! use polyglot_i18n::Result;
//! use async_trait::async_trait;
//!
//! /// Route every request for `en-GB` to `en`.
//! struct Alias;
//!
//! #[async_trait]
//! impl Middleware for Alias {
//!     fn name(&self) -> &str {
//!         "alias"
//!     }
//!
//!     async fn wrap_translate(&self, mut request: TranslateRequest, next: Next) -> Result<String> {
//!         if request.language == "en-GB" {
//!             request.language = "en".to_string();
//!         }
//!         next(request).await
//!     }
//! }
//! ```

use crate::hooks::{Hook, ProviderEvent};
use crate::interpolate::Params;
use crate::provider::Provider;
use crate::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use polyglot_log::{debug, trace};
use std::sync::Arc;
use std::time::Instant;

/// An owned translation request travelling through the middleware chain.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateRequest {
    pub key: String,
    pub language: String,
    pub params: Params,
    /// Set for plural lookups
    pub count: Option<i64>,
}

impl TranslateRequest {
    /// Singular request.
    pub fn new(key: impl Into<String>, language: impl Into<String>, params: Params) -> Self {
        Self {
            key: key.into(),
            language: language.into(),
            params,
            count: None,
        }
    }

    /// Plural request.
    pub fn plural(
        key: impl Into<String>,
        language: impl Into<String>,
        count: i64,
        params: Params,
    ) -> Self {
        Self {
            count: Some(count),
            ..Self::new(key, language, params)
        }
    }
}

/// Continuation invoking the rest of the chain.
pub type Next = Box<dyn FnOnce(TranslateRequest) -> BoxFuture<'static, Result<String>> + Send>;

/// Wraps translations made through a registry-created provider.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Handle a request, usually by calling `next` with it.
    async fn wrap_translate(&self, request: TranslateRequest, next: Next) -> Result<String>;

    /// Lifecycle notification. An error on [`ProviderEvent::Start`] aborts
    /// the start.
    async fn on_event(&self, _event: &ProviderEvent) -> Result<()> {
        Ok(())
    }
}

/// Delivers provider events to a middleware through an
/// [`ObserverList`](crate::hooks::ObserverList).
pub(crate) struct MiddlewareObserver(pub(crate) Arc<dyn Middleware>);

#[async_trait]
impl Hook for MiddlewareObserver {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn on_event(&self, event: &ProviderEvent) -> Result<()> {
        self.0.on_event(event).await
    }
}

/// A provider behind a fixed list of middlewares.
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    provider: Arc<dyn Provider>,
}

impl MiddlewareChain {
    /// Build a chain; `middlewares` are in registration order.
    pub fn new(provider: Arc<dyn Provider>, middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            middlewares: middlewares.into(),
            provider,
        }
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run `request` through every middleware and then the provider.
    pub async fn execute(&self, request: TranslateRequest) -> Result<String> {
        self.execute_from(self.middlewares.len(), request).await
    }

    // `index` counts the middlewares still to run; the last one is outermost.
    fn execute_from(&self, index: usize, request: TranslateRequest) -> BoxFuture<'static, Result<String>> {
        let Some(middleware) = index.checked_sub(1).and_then(|i| self.middlewares.get(i)) else {
            trace!("Middleware chain complete, calling provider");
            let provider = Arc::clone(&self.provider);
            return Box::pin(async move { call_provider(provider.as_ref(), request).await });
        };

        let middleware = Arc::clone(middleware);
        let chain = self.clone();
        trace!("Executing middleware {}", middleware.name());

        Box::pin(async move {
            middleware
                .wrap_translate(
                    request,
                    Box::new(move |request| chain.execute_from(index - 1, request)),
                )
                .await
        })
    }
}

async fn call_provider(provider: &dyn Provider, request: TranslateRequest) -> Result<String> {
    match request.count {
        Some(count) => {
            provider
                .translate_plural(&request.key, &request.language, count, &request.params)
                .await
        }
        None => {
            provider
                .translate(&request.key, &request.language, &request.params)
                .await
        }
    }
}

/// Logs every translation with its duration at debug level.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    async fn wrap_translate(&self, request: TranslateRequest, next: Next) -> Result<String> {
        let start = Instant::now();
        let key = request.key.clone();
        let language = request.language.clone();

        let result = next(request).await;
        match &result {
            Ok(_) => debug!("translate {} [{}] in {:?}", key, language, start.elapsed()),
            Err(e) => debug!("translate {} [{}] failed after {:?}: {}", key, language, start.elapsed(), e),
        }
        result
    }

    async fn on_event(&self, event: &ProviderEvent) -> Result<()> {
        debug!("provider {} event {}", event.provider(), event.kind());
        Ok(())
    }
}
