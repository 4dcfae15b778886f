//! Plural form selection
//!
//! Plural variants live under the base key: `items.one`, `items.other`.

use std::fmt;
use std::str::FromStr;

/// Plural form used to pick a variant key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluralForm {
    /// Exactly one item
    One,
    /// Every other count, including zero and negatives
    Other,
}

impl PluralForm {
    /// Select the form for `count`.
    pub fn for_count(count: i64) -> Self {
        if count == 1 { Self::One } else { Self::Other }
    }

    /// Suffix appended to the base key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Other => "other",
        }
    }

    /// Variant key for `key`, e.g. `items.one`.
    pub fn variant_key(&self, key: &str) -> String {
        let mut variant = String::with_capacity(key.len() + 6);
        variant.push_str(key);
        variant.push('.');
        variant.push_str(self.as_str());
        variant
    }
}

impl FromStr for PluralForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "one" => Ok(Self::One),
            "other" => Ok(Self::Other),
            other => Err(format!("unsupported plural form: {}", other)),
        }
    }
}

impl fmt::Display for PluralForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
