//! Error types for i18n operations

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while resolving, loading or composing providers.
#[derive(Debug, Error)]
pub enum I18nError {
    /// Translation key was empty
    #[error("Translation key must not be empty")]
    EmptyKey,

    /// Language code was empty
    #[error("Language must not be empty")]
    EmptyLanguage,

    /// Key could not be resolved in strict mode
    #[error("Translation not found: {key} for language {language}")]
    NotFound { key: String, language: String },

    /// Provider used before `start` or after `stop`
    #[error("Provider not started: {0}")]
    NotStarted(String),

    /// Loading did not finish within the allotted time
    #[error("Timed out after {0:?} loading translations")]
    Timeout(Duration),

    /// Operation cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Loading translations failed
    #[error("Failed to load translations: {0}")]
    Load(String),

    /// Health check failed
    #[error("Provider unhealthy: {0}")]
    Unhealthy(String),

    /// Raw document missing from the source
    #[error("Document not found: {0}")]
    SourceNotFound(String),

    /// Document could not be decoded
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registration with an empty or otherwise unusable name
    #[error("Invalid {kind} name: {reason}")]
    InvalidName { kind: &'static str, reason: String },

    /// A registration with the same name already exists
    #[error("{kind} already registered: {name}")]
    Duplicate { kind: &'static str, name: String },

    /// Nothing registered under the name
    #[error("{kind} not registered: {name}")]
    NotRegistered { kind: &'static str, name: String },

    /// No factory registered under the name
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Hook reported a failure
    #[error("Hook {name} failed: {message}")]
    Hook { name: String, message: String },

    /// Middleware reported a failure
    #[error("Middleware {name} failed: {message}")]
    Middleware { name: String, message: String },

    /// A provider call panicked; the panic was contained to one item
    #[error("Provider panicked: {0}")]
    Panicked(String),

    /// Several independent operations failed
    #[error("{} operations failed: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<I18nError>),
}

fn join_errors(errors: &[I18nError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl I18nError {
    /// Whether this is a strict-mode miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the error stems from caller input rather than provider state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyKey
                | Self::EmptyLanguage
                | Self::InvalidName { .. }
                | Self::Duplicate { .. }
                | Self::NotRegistered { .. }
                | Self::UnknownProvider(_)
                | Self::Config(_)
        )
    }

    pub(crate) fn decode(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<polyglot_cache::CacheError> for I18nError {
    fn from(err: polyglot_cache::CacheError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_display() {
        let err = I18nError::Aggregate(vec![
            I18nError::NotStarted("a".into()),
            I18nError::Cancelled,
        ]);
        assert_eq!(
            err.to_string(),
            "2 operations failed: Provider not started: a; Operation cancelled"
        );
    }

    #[test]
    fn test_classification() {
        assert!(I18nError::EmptyKey.is_validation());
        assert!(!I18nError::Cancelled.is_validation());
        let missing = I18nError::NotFound {
            key: "k".into(),
            language: "en".into(),
        };
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "Translation not found: k for language en");
    }
}
