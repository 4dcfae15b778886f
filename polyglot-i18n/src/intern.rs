//! String interning
//!
//! Batches repeat the same handful of keys and language codes thousands of
//! times. Interning hands out one shared `Arc<str>` per distinct value.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Thread-safe string interner.
///
/// ```
/// use polyglot_i18n::StringInterner;
/// use std::sync::Arc;
///
/// let interner = StringInterner::new();
/// let a = interner.intern("en");
/// let b = interner.intern("en");
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct StringInterner {
    strings: RwLock<HashSet<Arc<str>>>,
}

impl StringInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical shared instance of `value`.
    pub fn intern(&self, value: &str) -> Arc<str> {
        if let Some(existing) = self.strings.read().get(value) {
            return Arc::clone(existing);
        }

        let mut strings = self.strings.write();
        // Another thread may have inserted between the two locks.
        if let Some(existing) = strings.get(value) {
            return Arc::clone(existing);
        }

        let interned: Arc<str> = Arc::from(value);
        strings.insert(Arc::clone(&interned));
        interned
    }

    /// Number of distinct strings held.
    pub fn len(&self) -> usize {
        self.strings.read().len()
    }

    /// Whether nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every interned string. Handed-out `Arc`s stay valid.
    pub fn clear(&self) {
        self.strings.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup() {
        let interner = StringInterner::new();
        let a = interner.intern("forms.required");
        let b = interner.intern(&String::from("forms.required"));
        let c = interner.intern("forms.optional");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_clear_keeps_handles_valid() {
        let interner = StringInterner::new();
        let a = interner.intern("en");
        interner.clear();
        assert!(interner.is_empty());
        assert_eq!(&*a, "en");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_interning_yields_one_instance() {
        let interner = Arc::new(StringInterner::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let interner = Arc::clone(&interner);
            handles.push(tokio::spawn(async move {
                (0..100).map(|i| interner.intern(&format!("k{}", i % 10))).collect::<Vec<_>>()
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        assert_eq!(interner.len(), 10);
        let first = interner.intern("k3");
        assert!(all.iter().filter(|s| &***s == "k3").all(|s| Arc::ptr_eq(s, &first)));
    }
}
