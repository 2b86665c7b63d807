//! Caller-owned memoization keyed by a content hash.
//!
//! Loads and exports are pure functions of their input bytes, so a cached
//! value is always interchangeable with a fresh computation. The cache only
//! lives as long as its owner; nothing here is global.

use std::collections::HashMap;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::data::export::{to_delimited_text, ExportFormat};
use crate::data::loader;
use crate::data::model::Table;
use crate::error::PipelineResult;

/// SHA-256 digest of some bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        ContentKey(digest)
    }

    /// Key of a table's content: the digest of its CSV encoding.
    pub fn of_table(table: &Table) -> PipelineResult<Self> {
        Ok(Self::of(&to_delimited_text(table)?))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Values memoized by [`ContentKey`], with explicit invalidation.
#[derive(Debug, Clone)]
pub struct ContentCache<V> {
    entries: HashMap<ContentKey, V>,
    hits: u64,
    misses: u64,
}

impl<V> Default for ContentCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<V> ContentCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ContentKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    /// Errors are returned as-is and not cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: ContentKey,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<&V, E> {
        if self.entries.contains_key(&key) {
            self.hits += 1;
            log::debug!("cache hit {key}");
        } else {
            self.misses += 1;
            log::debug!("cache miss {key}");
            let value = compute()?;
            self.entries.insert(key, value);
        }
        Ok(&self.entries[&key])
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &ContentKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Parsed tables keyed by the digest of the uploaded bytes.
pub type LoadCache = ContentCache<Table>;

impl LoadCache {
    /// [`loader::load`], skipped when these exact bytes were loaded before.
    pub fn load(&mut self, bytes: &[u8], declared_name: &str) -> PipelineResult<&Table> {
        self.get_or_try_insert_with(ContentKey::of(bytes), || loader::load(bytes, declared_name))
    }
}

/// Encoded exports keyed by table content and format.
#[derive(Debug, Clone, Default)]
pub struct ExportCache {
    csv: ContentCache<Vec<u8>>,
    xlsx: ContentCache<Vec<u8>>,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, table: &Table, format: ExportFormat) -> PipelineResult<&[u8]> {
        let key = ContentKey::of_table(table)?;
        let cache = match format {
            ExportFormat::Csv => &mut self.csv,
            ExportFormat::Xlsx => &mut self.xlsx,
        };
        cache
            .get_or_try_insert_with(key, || format.encode(table))
            .map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.csv.clear();
        self.xlsx.clear();
    }

    pub fn len(&self) -> usize {
        self.csv.len() + self.xlsx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    const DATA: &[u8] = b"age;y\n25;no\n40;yes\n";

    #[test]
    fn test_key_is_content_based() {
        assert_eq!(ContentKey::of(DATA), ContentKey::of(DATA));
        assert_ne!(ContentKey::of(DATA), ContentKey::of(b"age;y\n"));
        assert_eq!(ContentKey::of(b"").to_string().len(), 64);
    }

    #[test]
    fn test_load_cache_matches_uncached() {
        let mut cache = LoadCache::new();
        let uncached = loader::load(DATA, "bank.csv").unwrap();
        assert_eq!(cache.load(DATA, "bank.csv").unwrap(), &uncached);
        assert_eq!(cache.load(DATA, "renamed.csv").unwrap(), &uncached);
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache: ContentCache<u32> = ContentCache::new();
        let key = ContentKey::of(b"x");
        let err: Result<&u32, PipelineError> =
            cache.get_or_try_insert_with(key, || Err(PipelineError::EmptyTable("y".into())));
        assert!(err.is_err());
        assert!(cache.is_empty());
        let ok: Result<&u32, PipelineError> = cache.get_or_try_insert_with(key, || Ok(7));
        assert_eq!(ok.unwrap(), &7);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = LoadCache::new();
        cache.load(DATA, "bank.csv").unwrap();
        let key = ContentKey::of(DATA);
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_export_cache() {
        let table = loader::load(DATA, "bank.csv").unwrap();
        let mut cache = ExportCache::new();
        let first = cache.encode(&table, ExportFormat::Csv).unwrap().to_vec();
        let second = cache.encode(&table, ExportFormat::Csv).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(first, to_delimited_text(&table).unwrap());
        cache.encode(&table, ExportFormat::Xlsx).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
