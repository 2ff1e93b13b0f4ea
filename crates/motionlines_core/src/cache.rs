//! Memoization of line-numbering results.
//!
//! Entries are keyed by an xxh64 digest of (text, column width, first
//! line). The key already encodes every input of a numbering pass, so
//! entries are never invalidated explicitly; LRU eviction is the only way
//! out.

use crate::html::Document;
use crate::lines::NumberingOptions;
use lru::LruCache;
use std::num::NonZeroUsize;
use xxhash_rust::xxh64::Xxh64;

/// LRU cache of numbered documents.
///
/// Keys are 64-bit digests rather than full texts; a digest collision would
/// return the wrong document, which is accepted at this key width.
#[derive(Debug)]
pub struct LineNumberCache {
    cache: LruCache<u64, Document>,
    hits: u64,
    misses: u64,
}

impl LineNumberCache {
    /// Creates a cache holding up to `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached document or computes and stores it.
    ///
    /// Failed computations are not cached.
    pub fn get_or_try_insert<E>(
        &mut self,
        text: &str,
        options: &NumberingOptions,
        compute: impl FnOnce() -> Result<Document, E>,
    ) -> Result<Document, E> {
        let key = cache_key(text, options);
        if let Some(doc) = self.cache.get(&key) {
            self.hits += 1;
            return Ok(doc.clone());
        }

        self.misses += 1;
        let doc = compute()?;
        self.cache.put(key, doc.clone());
        Ok(doc)
    }

    pub fn contains(&self, text: &str, options: &NumberingOptions) -> bool {
        self.cache.contains(&cache_key(text, options))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

fn cache_key(text: &str, options: &NumberingOptions) -> u64 {
    let mut hasher = Xxh64::new(0);
    hasher.update(text.as_bytes());
    hasher.update(&options.column_width.to_le_bytes());
    hasher.update(&options.first_line.to_le_bytes());
    hasher.update(&[u8::from(options.ignore_inserted_text)]);
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::{cache_key, LineNumberCache};
    use crate::html::Document;
    use crate::lines::NumberingOptions;

    #[test]
    fn key_covers_width_and_first_line() {
        let base = NumberingOptions::new(80, 1);
        assert_eq!(cache_key("<p>a</p>", &base), cache_key("<p>a</p>", &base));
        assert_ne!(cache_key("<p>a</p>", &base), cache_key("<p>a</p>", &base.starting_at(2)));
        assert_ne!(
            cache_key("<p>a</p>", &base),
            cache_key("<p>a</p>", &NumberingOptions::new(40, 1))
        );
    }

    #[test]
    fn computes_once_then_hits() {
        let mut cache = LineNumberCache::new(2);
        let options = NumberingOptions::new(80, 1);
        let mut calls = 0;
        for _ in 0..3 {
            let doc: Result<Document, ()> = cache.get_or_try_insert("<p>a</p>", &options, || {
                calls += 1;
                Ok(Document::default())
            });
            assert!(doc.is_ok());
        }
        assert_eq!(calls, 1);
        assert_eq!((cache.hits(), cache.misses()), (2, 1));
    }

    #[test]
    fn evicts_least_recently_used_and_skips_errors() {
        let mut cache = LineNumberCache::new(1);
        let options = NumberingOptions::new(80, 1);
        let failed: Result<Document, &str> = cache.get_or_try_insert("x", &options, || Err("boom"));
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let _ = cache.get_or_try_insert::<()>("a", &options, || Ok(Document::default()));
        let _ = cache.get_or_try_insert::<()>("b", &options, || Ok(Document::default()));
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains("a", &options));
        assert!(cache.contains("b", &options));
    }
}
