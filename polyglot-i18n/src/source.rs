//! Raw document storage backends.

use crate::{I18nError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Placeholder replaced with the language code in document path patterns.
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// Expand a path pattern for one language.
///
/// ```
/// use polyglot_i18n::source::expand_pattern;
///
/// assert_eq!(expand_pattern("locales/{lang}.json", "pt-BR"), "locales/pt-BR.json");
/// ```
pub fn expand_pattern(pattern: &str, language: &str) -> String {
    pattern.replace(LANG_PLACEHOLDER, language)
}

/// Supplies raw document bytes by path.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Read the document at `path`.
    ///
    /// Missing documents must be reported as [`I18nError::SourceNotFound`]
    /// so callers can tell them apart from real I/O failures.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Reads documents from a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsSource {
    base_path: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory documents are resolved against.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

#[async_trait]
impl DocumentSource for FsSource {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.base_path.join(path);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(I18nError::SourceNotFound(full.display().to_string()))
            }
            Err(e) => Err(I18nError::Io(e)),
        }
    }
}

/// In-memory documents keyed by path.
///
/// Useful for embedding translations in a binary and for tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, builder style.
    pub fn with_file(self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a document.
    pub fn insert(&self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.write().insert(path.into(), contents.into());
    }

    /// Remove a document.
    pub fn remove(&self, path: &str) -> bool {
        self.files.write().remove(path).is_some()
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| I18nError::SourceNotFound(path.to_string()))
    }
}
