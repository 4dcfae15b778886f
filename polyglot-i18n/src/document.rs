//! Translation documents
//!
//! A document is the decoded tree for one language. Only string leaves are
//! translations; every other value is ignored by lookups.

use crate::{I18nError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Encoding of raw translation documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON (`.json`)
    Json,
    /// YAML (`.yaml`, `.yml`)
    #[cfg(feature = "yaml")]
    Yaml,
    /// TOML (`.toml`)
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Pick a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(Self::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Pick a format from the extension of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Decode a whole document. Either every byte decodes into a map or the
    /// call fails; partial documents are never returned.
    pub fn decode(&self, path: &str, bytes: &[u8]) -> Result<TranslationDocument> {
        let value: Value = match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| I18nError::decode(path, e))?
            }
            #[cfg(feature = "yaml")]
            Self::Yaml => {
                serde_yaml::from_slice(bytes).map_err(|e| I18nError::decode(path, e))?
            }
            #[cfg(feature = "toml")]
            Self::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| I18nError::decode(path, e))?;
                toml::from_str(text).map_err(|e| I18nError::decode(path, e))?
            }
        };

        TranslationDocument::from_value(value)
            .ok_or_else(|| I18nError::decode(path, "document root must be a map"))
    }
}

/// Decoded translations for one language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationDocument {
    root: Map<String, Value>,
}

impl TranslationDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a decoded value; `None` unless it is a map.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        DocumentFormat::Json.decode("<inline>", json.as_bytes())
    }

    /// Resolve `key` to a string leaf.
    ///
    /// With `nested` set, a dotted key walks the tree one segment at a time
    /// and stops as soon as a segment is missing or is not a map; a literal
    /// top-level key such as `"flat.key"` is tried when the walk fails.
    /// Otherwise the whole key is looked up at the top level.
    pub fn lookup(&self, key: &str, nested: bool) -> Option<&str> {
        let flat = || self.root.get(key).and_then(Value::as_str);
        if !nested || !key.contains('.') {
            return flat();
        }

        self.walk(key).or_else(flat)
    }

    fn walk(&self, key: &str) -> Option<&str> {
        let mut segments = key.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        current.as_str()
    }

    /// Every string leaf as a dot-joined path, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, &mut String::new(), &mut keys);
        keys.sort();
        keys
    }

    /// Number of string leaves.
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    /// Whether the document has no string leaves.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn collect_keys(map: &Map<String, Value>, prefix: &mut String, out: &mut Vec<String>) {
    for (name, value) in map {
        let restore = prefix.len();
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(name);

        match value {
            Value::String(_) => out.push(prefix.clone()),
            Value::Object(child) => collect_keys(child, prefix, out),
            _ => {}
        }

        prefix.truncate(restore);
    }
}

/// Documents for every loaded language, published as one unit.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    documents: HashMap<String, TranslationDocument>,
}

impl DocumentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the document for `language`.
    pub fn insert(&mut self, language: impl Into<String>, document: TranslationDocument) {
        self.documents.insert(language.into(), document);
    }

    /// Document for `language`.
    pub fn get(&self, language: &str) -> Option<&TranslationDocument> {
        self.documents.get(language)
    }

    /// Loaded languages, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.documents.keys().cloned().collect();
        languages.sort();
        languages
    }

    /// Number of loaded documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> TranslationDocument {
        TranslationDocument::from_value(value).unwrap()
    }

    #[test]
    fn test_nested_lookup() {
        let document = doc(json!({ "a": { "b": { "c": "deep" } } }));
        assert_eq!(document.lookup("a.b.c", true), Some("deep"));
        assert_eq!(document.lookup("a.b", true), None);
        assert_eq!(document.lookup("a.b.c.d", true), None);
        assert_eq!(document.lookup("a.x.c", true), None);
    }

    #[test]
    fn test_non_map_intermediate_is_absent() {
        let document = doc(json!({ "a": "leaf", "n": { "list": ["x"] } }));
        assert_eq!(document.lookup("a.b", true), None);
        assert_eq!(document.lookup("n.list.0", true), None);
    }

    #[test]
    fn test_flat_lookup_when_nested_disabled() {
        let document = doc(json!({ "a.b": "flat", "a": { "b": "tree" } }));
        assert_eq!(document.lookup("a.b", false), Some("flat"));
        assert_eq!(document.lookup("a.b", true), Some("tree"));
    }

    #[test]
    fn test_dotted_top_level_key_resolves_when_nested() {
        let document = doc(json!({ "flat.key": "flat", "a": "leaf" }));
        assert_eq!(document.lookup("flat.key", true), Some("flat"));
        assert_eq!(document.lookup("a.b", true), None);
        for key in document.keys() {
            assert!(document.lookup(&key, true).is_some(), "{}", key);
        }
    }

    #[test]
    fn test_only_string_leaves_resolve() {
        let document = doc(json!({
            "n": 1, "b": true, "z": null, "l": ["a"], "m": { "x": 2 }, "s": "ok"
        }));
        for key in ["n", "b", "z", "l", "m", "m.x"] {
            assert_eq!(document.lookup(key, true), None, "{}", key);
        }
        assert_eq!(document.lookup("s", true), Some("ok"));
        assert_eq!(document.keys(), vec!["s".to_string()]);
    }

    #[test]
    fn test_keys_are_flattened_and_sorted() {
        let document = doc(json!({
            "welcome": "Hi",
            "forms": { "validation": { "required": "Required", "max": 3 } },
            "app": { "title": "T" }
        }));
        assert_eq!(
            document.keys(),
            vec!["app.title", "forms.validation.required", "welcome"]
        );
        assert_eq!(document.len(), 3);
    }

    #[test]
    fn test_decode_rejects_non_map_root() {
        let err = DocumentFormat::Json.decode("en.json", b"[1, 2]").unwrap_err();
        assert!(matches!(err, I18nError::Decode { .. }));
    }

    #[test]
    fn test_decode_is_total() {
        let err = DocumentFormat::Json
            .decode("en.json", br#"{"a": "b", "c": "#)
            .unwrap_err();
        assert!(err.to_string().contains("en.json"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_decode_yaml() {
        let yaml = b"greeting:\n  hello: Hello {{name}}\n";
        let document = DocumentFormat::Yaml.decode("en.yaml", yaml).unwrap();
        assert_eq!(document.lookup("greeting.hello", true), Some("Hello {{name}}"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_decode_toml() {
        let text = b"[greeting]\nhello = \"Hallo\"\n";
        let document = DocumentFormat::Toml.decode("de.toml", text).unwrap();
        assert_eq!(document.lookup("greeting.hello", true), Some("Hallo"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path("locales/en.json"), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path("locales/en.txt"), None);
        #[cfg(feature = "yaml")]
        assert_eq!(DocumentFormat::from_path("en.YML"), Some(DocumentFormat::Yaml));
    }
}
