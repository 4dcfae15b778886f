//! Provider trait definition.

use crate::interpolate::Params;
use crate::{I18nError, Result};
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Parameter name plural lookups inject the count under.
pub const COUNT_PARAM: &str = "count";

/// Lifecycle state of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderState {
    /// Constructed, never started
    Created,
    /// Serving translations
    Started,
    /// Stopped; translations fail until started again
    Stopped,
    /// Last start attempt failed
    Failed,
}

impl ProviderState {
    /// Lowercase state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translation backend.
///
/// Resolves `(key, language)` pairs to localized strings and manages the
/// documents those strings come from.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, used in logs and errors.
    fn name(&self) -> &str;

    /// Language consulted when the requested one lacks a key.
    fn default_language(&self) -> &str;

    /// Languages this provider loads.
    fn supported_languages(&self) -> Vec<String>;

    /// Current lifecycle state.
    fn state(&self) -> ProviderState;

    /// Translate `key` into `language`, substituting `{{name}}` placeholders
    /// from `params`.
    ///
    /// # Errors
    ///
    /// * [`I18nError::EmptyKey`] / [`I18nError::EmptyLanguage`] for empty input
    /// * [`I18nError::NotStarted`] before `start` or after `stop`
    /// * [`I18nError::NotFound`] for unresolved keys in strict mode
    async fn translate(&self, key: &str, language: &str, params: &Params) -> Result<String>;

    /// Translate the plural variant of `key` selected by `count`.
    ///
    /// `key.one` or `key.other` is tried before the bare `key`. `count` is
    /// available to the template as `{{count}}` unless `params` already
    /// defines it.
    async fn translate_plural(
        &self,
        key: &str,
        language: &str,
        count: i64,
        params: &Params,
    ) -> Result<String>;

    /// Whether `language`'s own document resolves `key`, without fallback.
    fn has_translation(&self, key: &str, language: &str) -> bool;

    /// Load or reload every supported language, replacing the current
    /// documents in one step.
    async fn load_translations(&self, cancel: &CancellationToken) -> Result<()>;

    /// Load documents and begin serving translations.
    async fn start(&self, cancel: &CancellationToken) -> Result<()>;

    /// Stop serving translations.
    async fn stop(&self, cancel: &CancellationToken) -> Result<()>;

    /// Fails unless started with at least one document loaded.
    async fn health(&self) -> Result<()>;

    /// Languages with a loaded document, sorted.
    fn loaded_languages(&self) -> Vec<String>;

    /// Dot paths of every string leaf in `language`'s document, sorted.
    fn loaded_keys(&self, language: &str) -> Vec<String>;
}

/// Reject empty keys and languages.
pub fn validate_request(key: &str, language: &str) -> Result<()> {
    if key.is_empty() {
        return Err(I18nError::EmptyKey);
    }
    if language.is_empty() {
        return Err(I18nError::EmptyLanguage);
    }
    Ok(())
}
