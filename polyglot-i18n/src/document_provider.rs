//! Provider backed by per-language translation documents.
//!
//! Documents are read through a [`DocumentSource`] from paths built out of
//! the configured pattern, decoded by extension, and swapped in as one
//! [`DocumentSet`]. Resolution tries the requested language, then its base
//! language (when enabled), then the default language (when fallback is
//! enabled). A key nobody resolves is an error in strict mode and the key
//! itself otherwise.

use crate::config::ProviderConfig;
use crate::document::{DocumentFormat, DocumentSet};
use crate::interpolate::{Params, interpolate};
use crate::plural::PluralForm;
use crate::pool::PARAMS;
use crate::provider::{COUNT_PARAM, Provider, ProviderState, validate_request};
use crate::source::{DocumentSource, FsSource, expand_pattern};
use crate::{I18nError, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use parking_lot::RwLock;
use polyglot_log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use unic_langid::LanguageIdentifier;

/// Provider resolving keys against decoded documents.
pub struct DocumentProvider {
    name: String,
    config: ProviderConfig,
    source: Arc<dyn DocumentSource>,
    documents: RwLock<Arc<DocumentSet>>,
    state: RwLock<ProviderState>,
    // Serializes start, stop and reloads.
    lifecycle: AsyncMutex<()>,
}

impl DocumentProvider {
    /// Create a provider reading documents from `source`.
    pub fn new(
        name: impl Into<String>,
        config: ProviderConfig,
        source: Arc<dyn DocumentSource>,
    ) -> Result<Self> {
        config.validate()?;
        if DocumentFormat::from_path(&config.source.pattern).is_none() {
            return Err(I18nError::Config(format!(
                "cannot infer document format from pattern {:?}",
                config.source.pattern
            )));
        }

        Ok(Self {
            name: name.into(),
            config,
            source,
            documents: RwLock::new(Arc::new(DocumentSet::new())),
            state: RwLock::new(ProviderState::Created),
            lifecycle: AsyncMutex::new(()),
        })
    }

    /// Create a provider reading documents from `config.source.base_path`.
    pub fn from_config(name: impl Into<String>, config: ProviderConfig) -> Result<Self> {
        let source = Arc::new(FsSource::new(config.source.base_path.clone()));
        Self::new(name, config, source)
    }

    /// The provider's configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Snapshot of the currently loaded documents.
    pub fn documents(&self) -> Arc<DocumentSet> {
        Arc::clone(&*self.documents.read())
    }

    fn ensure_started(&self) -> Result<()> {
        if *self.state.read() != ProviderState::Started {
            return Err(I18nError::NotStarted(self.name.clone()));
        }
        Ok(())
    }

    /// Walk the fallback chain, trying every candidate key in one language
    /// before moving on to the next.
    fn resolve<'a>(&self, documents: &'a DocumentSet, keys: &[&str], language: &str) -> Option<&'a str> {
        let nested = self.config.nested_keys;
        let base = if self.config.base_language_fallback {
            base_language(language)
        } else {
            None
        };
        let default = (self.config.fallback_to_default && language != self.config.default_language)
            .then_some(self.config.default_language.as_str());

        [Some(language), base.as_deref(), default]
            .into_iter()
            .flatten()
            .find_map(|lang| keys.iter().find_map(|key| lookup(documents, lang, key, nested)))
    }

    fn missing(&self, key: &str, language: &str) -> Result<String> {
        if self.config.strict_mode {
            return Err(I18nError::NotFound {
                key: key.to_string(),
                language: language.to_string(),
            });
        }

        debug!("{}: no translation for {} in {}, using key", self.name, key, language);
        Ok(key.to_string())
    }

    fn spawn_load(&self) -> JoinHandle<Result<DocumentSet>> {
        let name = self.name.clone();
        let source = Arc::clone(&self.source);
        let pattern = self.config.source.pattern.clone();
        let languages = self.config.supported_languages.clone();

        tokio::spawn(async move { load_documents(&name, source.as_ref(), &pattern, &languages).await })
    }

    /// Load in a separate task bounded by the load timeout.
    ///
    /// The task only returns the decoded set; the caller publishes it. An
    /// abandoned task is aborted and has nothing to publish into.
    async fn run_load(&self, cancel: &CancellationToken) -> Result<DocumentSet> {
        if cancel.is_cancelled() {
            return Err(I18nError::Cancelled);
        }

        let timeout = self.config.load_timeout();
        let task = self.spawn_load();
        let abort = task.abort_handle();

        tokio::select! {
            _ = cancel.cancelled() => {
                abort.abort();
                Err(I18nError::Cancelled)
            }
            _ = tokio::time::sleep(timeout) => {
                abort.abort();
                Err(I18nError::Timeout(timeout))
            }
            joined = task => match joined {
                Ok(result) => result,
                Err(e) => Err(I18nError::Load(format!("load task failed: {}", e))),
            },
        }
    }

    fn publish(&self, documents: DocumentSet) {
        debug!(
            "{}: publishing {} documents ({:?})",
            self.name,
            documents.len(),
            documents.languages()
        );
        *self.documents.write() = Arc::new(documents);
    }
}

impl fmt::Debug for DocumentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentProvider")
            .field("name", &self.name)
            .field("state", &*self.state.read())
            .field("languages", &self.documents.read().languages())
            .finish()
    }
}

#[async_trait]
impl Provider for DocumentProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_language(&self) -> &str {
        &self.config.default_language
    }

    fn supported_languages(&self) -> Vec<String> {
        self.config.supported_languages.clone()
    }

    fn state(&self) -> ProviderState {
        *self.state.read()
    }

    async fn translate(&self, key: &str, language: &str, params: &Params) -> Result<String> {
        validate_request(key, language)?;
        self.ensure_started()?;

        let documents = self.documents();
        match self.resolve(&documents, &[key], language) {
            Some(template) => Ok(interpolate(template, params)),
            None => self.missing(key, language),
        }
    }

    async fn translate_plural(
        &self,
        key: &str,
        language: &str,
        count: i64,
        params: &Params,
    ) -> Result<String> {
        validate_request(key, language)?;
        self.ensure_started()?;

        let mut scratch = None;
        let params: &Params = if params.contains_key(COUNT_PARAM) {
            params
        } else {
            let with_count = scratch.insert(PARAMS.acquire());
            with_count.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
            with_count.insert(COUNT_PARAM.to_string(), count.into());
            &**with_count
        };

        let documents = self.documents();
        let variant = PluralForm::for_count(count).variant_key(key);
        let template = self.resolve(&documents, &[variant.as_str(), key], language);

        match template {
            Some(template) => Ok(interpolate(template, params)),
            None => self.missing(key, language),
        }
    }

    fn has_translation(&self, key: &str, language: &str) -> bool {
        if validate_request(key, language).is_err() {
            return false;
        }
        lookup(&self.documents.read(), language, key, self.config.nested_keys).is_some()
    }

    async fn load_translations(&self, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.lifecycle.lock().await;
        let documents = self.run_load(cancel).await?;
        self.publish(documents);
        Ok(())
    }

    async fn start(&self, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        if *self.state.read() == ProviderState::Started {
            debug!("{}: already started", self.name);
            return Ok(());
        }

        info!("Starting provider {}", self.name);
        match self.run_load(cancel).await {
            Ok(documents) => {
                let count = documents.len();
                self.publish(documents);
                *self.state.write() = ProviderState::Started;
                info!("Provider {} started with {} languages", self.name, count);
                Ok(())
            }
            Err(e) => {
                *self.state.write() = ProviderState::Failed;
                warn!("Provider {} failed to start: {}", self.name, e);
                Err(e)
            }
        }
    }

    async fn stop(&self, _cancel: &CancellationToken) -> Result<()> {
        let _guard = self.lifecycle.lock().await;
        *self.state.write() = ProviderState::Stopped;
        *self.documents.write() = Arc::new(DocumentSet::new());
        info!("Provider {} stopped", self.name);
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        self.ensure_started()?;
        if self.documents.read().is_empty() {
            return Err(I18nError::Unhealthy(format!("{} has no documents loaded", self.name)));
        }
        Ok(())
    }

    fn loaded_languages(&self) -> Vec<String> {
        self.documents.read().languages()
    }

    fn loaded_keys(&self, language: &str) -> Vec<String> {
        self.documents
            .read()
            .get(language)
            .map(|document| document.keys())
            .unwrap_or_default()
    }
}

fn lookup<'a>(documents: &'a DocumentSet, language: &str, key: &str, nested: bool) -> Option<&'a str> {
    documents.get(language)?.lookup(key, nested)
}

/// `pt` for `pt-BR` or `pt_BR`; `None` for codes without subtags to drop.
fn base_language(language: &str) -> Option<String> {
    let id: LanguageIdentifier = language.parse().ok()?;
    let base = id.language.as_str();
    if base == "und" || base.eq_ignore_ascii_case(language) {
        return None;
    }
    Some(base.to_string())
}

async fn load_documents(
    name: &str,
    source: &dyn DocumentSource,
    pattern: &str,
    languages: &[String],
) -> Result<DocumentSet> {
    let reads = languages.iter().map(|language| async move {
        let path = expand_pattern(pattern, language);
        let format = DocumentFormat::from_path(&path)
            .ok_or_else(|| I18nError::Config(format!("unknown document format: {}", path)))?;

        match source.read(&path).await {
            Ok(bytes) => Ok(Some((language.clone(), format.decode(&path, &bytes)?))),
            Err(I18nError::SourceNotFound(missing)) => {
                warn!("{}: no document for {} ({})", name, language, missing);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    });

    let mut documents = DocumentSet::new();
    for (language, document) in try_join_all(reads).await?.into_iter().flatten() {
        documents.insert(language, document);
    }

    if documents.is_empty() {
        return Err(I18nError::Load(format!(
            "{}: no documents found for pattern {}",
            name, pattern
        )));
    }

    Ok(documents)
}
