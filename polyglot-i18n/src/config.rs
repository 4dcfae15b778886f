//! Provider configuration
//!
//! Configuration can be built in code, read from a JSON/YAML/TOML file, and
//! overridden from environment variables:
//!
//! ```rust,ignore
//! use polyglot_i18n::ProviderConfig;
//!
//! let config = ProviderConfig::from_file("config/i18n.toml")?
//!     .apply_env("APP_I18N")?;
//! config.validate()?;
//! ```

use crate::{I18nError, Result};
use polyglot_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where documents are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory documents are resolved against
    pub base_path: PathBuf,
    /// Path pattern with a `{lang}` placeholder, e.g. `{lang}.json`
    pub pattern: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("locales"),
            pattern: "{lang}.json".to_string(),
        }
    }
}

/// Settings shared by every provider factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Language consulted when the requested one lacks a key
    pub default_language: String,
    /// Languages loaded on start
    pub supported_languages: Vec<String>,
    /// Retry missing keys against the default language
    pub fallback_to_default: bool,
    /// Fail unresolved keys instead of returning the key
    pub strict_mode: bool,
    /// Treat dots in keys as paths into nested documents
    pub nested_keys: bool,
    /// Try `pt` for `pt-BR` before the default language
    pub base_language_fallback: bool,
    /// Maximum time `start` waits for documents to load
    pub load_timeout_ms: u64,
    /// Document location
    pub source: SourceConfig,
    /// Wrap the provider in an LRU+TTL cache when set
    pub cache: Option<CacheConfig>,
    /// Concurrent workers used by batch translation
    pub workers: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string()],
            fallback_to_default: true,
            strict_mode: false,
            nested_keys: true,
            base_language_fallback: false,
            load_timeout_ms: 5_000,
            source: SourceConfig::default(),
            cache: None,
            workers: crate::batch::DEFAULT_WORKERS,
        }
    }
}

impl ProviderConfig {
    /// Create a configuration with the given default language, which is also
    /// the only supported language until more are added.
    pub fn new(default_language: impl Into<String>) -> Self {
        let default_language = default_language.into();
        Self {
            supported_languages: vec![default_language.clone()],
            default_language,
            ..Self::default()
        }
    }

    /// Set the supported languages. The default language is added if missing.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_languages = languages.into_iter().map(Into::into).collect();
        if !self.supported_languages.contains(&self.default_language) {
            self.supported_languages.insert(0, self.default_language.clone());
        }
        self
    }

    /// Enable or disable falling back to the default language.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_default = enabled;
        self
    }

    /// Enable or disable strict mode.
    pub fn with_strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self
    }

    /// Enable or disable nested key resolution.
    pub fn with_nested_keys(mut self, enabled: bool) -> Self {
        self.nested_keys = enabled;
        self
    }

    /// Enable or disable regional-to-base language fallback.
    pub fn with_base_language_fallback(mut self, enabled: bool) -> Self {
        self.base_language_fallback = enabled;
        self
    }

    /// Set the load timeout.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the document source.
    pub fn with_source(mut self, base_path: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        self.source = SourceConfig {
            base_path: base_path.into(),
            pattern: pattern.into(),
        };
        self
    }

    /// Enable caching.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the number of batch workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Load timeout as a [`Duration`].
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Check the configuration for values no provider can work with.
    pub fn validate(&self) -> Result<()> {
        if self.default_language.trim().is_empty() {
            return Err(I18nError::Config("default_language must not be empty".into()));
        }
        if self.supported_languages.is_empty() {
            return Err(I18nError::Config("supported_languages must not be empty".into()));
        }
        if self.supported_languages.iter().any(|l| l.trim().is_empty()) {
            return Err(I18nError::Config(
                "supported_languages must not contain empty codes".into(),
            ));
        }
        if !self.supported_languages.contains(&self.default_language) {
            return Err(I18nError::Config(format!(
                "default language {} is not in supported_languages",
                self.default_language
            )));
        }
        if self.load_timeout_ms == 0 {
            return Err(I18nError::Config("load_timeout_ms must be greater than zero".into()));
        }
        if !self.source.pattern.contains(crate::source::LANG_PLACEHOLDER) {
            return Err(I18nError::Config(format!(
                "source pattern {:?} has no {} placeholder",
                self.source.pattern,
                crate::source::LANG_PLACEHOLDER
            )));
        }
        if self.workers == 0 {
            return Err(I18nError::Config("workers must be greater than zero".into()));
        }
        if let Some(cache) = &self.cache {
            cache.validate()?;
        }
        Ok(())
    }

    /// Read a configuration file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| I18nError::Config(format!("No file extension: {}", path.display())))?;
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, ext)
    }

    /// Parse configuration text in the format named by `ext`.
    pub fn parse(content: &str, ext: &str) -> Result<Self> {
        let parse_err = |e: &dyn std::fmt::Display| I18nError::Config(format!("{} parse error: {}", ext, e));
        match ext.to_lowercase().as_str() {
            "json" => serde_json::from_str(content).map_err(|e| parse_err(&e)),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| parse_err(&e)),
            #[cfg(feature = "toml")]
            "toml" => toml::from_str(content).map_err(|e| parse_err(&e)),
            other => Err(I18nError::Config(format!("Unsupported format: {}", other))),
        }
    }

    /// Defaults overridden by `{prefix}_*` environment variables, after
    /// loading a `.env` file if one exists.
    pub fn from_env(prefix: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::default().apply_env(prefix)
    }

    /// Override fields from `{prefix}_*` environment variables.
    pub fn apply_env(self, prefix: &str) -> Result<Self> {
        self.apply_vars(prefix, std::env::vars())
    }

    /// Override fields from `{prefix}_*` variables in `vars`.
    ///
    /// Recognized suffixes: `DEFAULT_LANGUAGE`, `SUPPORTED_LANGUAGES`
    /// (comma separated), `FALLBACK_TO_DEFAULT`, `STRICT_MODE`, `NESTED_KEYS`,
    /// `BASE_LANGUAGE_FALLBACK`, `LOAD_TIMEOUT_MS`, `SOURCE_PATH`,
    /// `SOURCE_PATTERN`, `CACHE_CAPACITY`, `CACHE_TTL_MS`, `WORKERS`.
    pub fn apply_vars<I>(mut self, prefix: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{}_", prefix.to_uppercase());

        for (name, value) in vars {
            let Some(field) = name.strip_prefix(&prefix) else {
                continue;
            };

            match field {
                "DEFAULT_LANGUAGE" => self.default_language = value,
                "SUPPORTED_LANGUAGES" => {
                    self.supported_languages = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                }
                "FALLBACK_TO_DEFAULT" => self.fallback_to_default = parse_bool(&name, &value)?,
                "STRICT_MODE" => self.strict_mode = parse_bool(&name, &value)?,
                "NESTED_KEYS" => self.nested_keys = parse_bool(&name, &value)?,
                "BASE_LANGUAGE_FALLBACK" => {
                    self.base_language_fallback = parse_bool(&name, &value)?
                }
                "LOAD_TIMEOUT_MS" => self.load_timeout_ms = parse_num(&name, &value)?,
                "SOURCE_PATH" => self.source.base_path = PathBuf::from(value),
                "SOURCE_PATTERN" => self.source.pattern = value,
                "CACHE_CAPACITY" => {
                    self.cache.get_or_insert_with(CacheConfig::default).capacity =
                        parse_num(&name, &value)?;
                }
                "CACHE_TTL_MS" => {
                    self.cache.get_or_insert_with(CacheConfig::default).ttl_ms =
                        parse_num(&name, &value)?;
                }
                "WORKERS" => self.workers = parse_num(&name, &value)?,
                _ => {}
            }
        }

        Ok(self)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(I18nError::Config(format!("{} must be a boolean, got {:?}", name, value))),
    }
}

fn parse_num<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| I18nError::Config(format!("{} must be a number, got {:?}", name, value)))
}
