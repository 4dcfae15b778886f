//! Provider lifecycle and translation hooks.
//!
//! Hooks observe providers created by a [`Registry`](crate::Registry). Every
//! notification is a [`ProviderEvent`]; one [`ObserverList`] type delivers
//! them, ordered by ascending priority.
//!
//! ```
//! use polyglot_i18n::hooks::{Hook, ProviderEvent};
//! use polyglot_i18n::Result;
//! use async_trait::async_trait;
//!
//! struct AuditHook;
//!
//! #[async_trait]
//! impl Hook for AuditHook {
//!     fn name(&self) -> &str {
//!         "audit"
//!     }
//!
//!     async fn on_event(&self, event: &ProviderEvent) -> Result<()> {
//!         if let ProviderEvent::Translate(t) = event {
//!             println!("{} -> {}", t.key, t.value);
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::{I18nError, Result};
use async_trait::async_trait;
use polyglot_log::{trace, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A provider finished starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartEvent {
    pub provider: String,
    pub languages: Vec<String>,
}

/// A provider was stopped; `error` is set when stopping failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEvent {
    pub provider: String,
    pub error: Option<String>,
}

/// A lifecycle operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub provider: String,
    /// `"start"` or `"stop"`
    pub operation: &'static str,
    pub error: String,
}

/// A translation succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateEvent {
    pub provider: String,
    pub key: String,
    pub language: String,
    /// Set for plural lookups
    pub count: Option<i64>,
    pub value: String,
    pub elapsed: Duration,
}

/// Event delivered to hooks and middlewares.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Start(StartEvent),
    Stop(StopEvent),
    Error(ErrorEvent),
    Translate(TranslateEvent),
}

impl ProviderEvent {
    /// Event kind as a lowercase string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Stop(_) => "stop",
            Self::Error(_) => "error",
            Self::Translate(_) => "translate",
        }
    }

    /// Name of the provider the event is about.
    pub fn provider(&self) -> &str {
        match self {
            Self::Start(e) => &e.provider,
            Self::Stop(e) => &e.provider,
            Self::Error(e) => &e.provider,
            Self::Translate(e) => &e.provider,
        }
    }
}

/// Observer of events of type `E`.
#[async_trait]
pub trait Hook<E = ProviderEvent>: Send + Sync
where
    E: Send + Sync + 'static,
{
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Lower priorities run first.
    fn priority(&self) -> i32 {
        0
    }

    /// Handle one event.
    async fn on_event(&self, event: &E) -> Result<()>;
}

type HookFn<E> = Box<dyn Fn(&E) -> Result<()> + Send + Sync>;

/// Hook built from a closure.
pub struct FnHook<E: 'static = ProviderEvent> {
    name: String,
    priority: i32,
    handler: HookFn<E>,
}

impl<E: Send + Sync + 'static> FnHook<E> {
    /// Create a hook calling `handler` for every event.
    pub fn new<F>(name: impl Into<String>, priority: i32, handler: F) -> Self
    where
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl<E: Send + Sync + 'static> Hook<E> for FnHook<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn on_event(&self, event: &E) -> Result<()> {
        (self.handler)(event)
    }
}

/// Observers ordered by ascending priority; equal priorities keep insertion
/// order.
pub struct ObserverList<E: Send + Sync + 'static> {
    observers: Vec<Arc<dyn Hook<E>>>,
}

impl<E: Send + Sync + 'static> ObserverList<E> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Insert after every observer with the same or lower priority.
    pub fn insert(&mut self, observer: Arc<dyn Hook<E>>) {
        let priority = observer.priority();
        let at = self
            .observers
            .partition_point(|existing| existing.priority() <= priority);
        self.observers.insert(at, observer);
    }

    /// Remove the observer named `name`.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Hook<E>>> {
        let at = self.observers.iter().position(|o| o.name() == name)?;
        Some(self.observers.remove(at))
    }

    /// Whether an observer named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.observers.iter().any(|o| o.name() == name)
    }

    /// Observer names in delivery order.
    pub fn names(&self) -> Vec<String> {
        self.observers.iter().map(|o| o.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every observer. Failures are logged and returned,
    /// never short-circuiting delivery.
    pub async fn notify(&self, event: &E) -> Vec<I18nError>
    where
        E: fmt::Debug,
    {
        let mut failures = Vec::new();
        for observer in &self.observers {
            trace!("Notifying {} of {:?}", observer.name(), event);
            if let Err(e) = observer.on_event(event).await {
                warn!("Hook {} failed: {}", observer.name(), e);
                failures.push(I18nError::Hook {
                    name: observer.name().to_string(),
                    message: e.to_string(),
                });
            }
        }
        failures
    }

    /// Deliver `event` in order, stopping at the first failure.
    pub async fn dispatch(&self, event: &E) -> Result<()> {
        for observer in &self.observers {
            observer.on_event(event).await?;
        }
        Ok(())
    }
}

impl<E: Send + Sync + 'static> Clone for ObserverList<E> {
    fn clone(&self) -> Self {
        Self {
            observers: self.observers.clone(),
        }
    }
}

impl<E: Send + Sync + 'static> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + Sync + 'static> fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
