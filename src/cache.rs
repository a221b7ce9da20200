//! Enrichment result cache
//!
//! Memoizes furigana and tokens per raw caption text. Eviction follows
//! insertion order: lookups use `peek`, so a hit never refreshes an entry.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::CacheConfig;
use crate::types::{FuriganaSegment, Token};

/// Annotations computed for one caption text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub furigana: Vec<FuriganaSegment>,
    pub tokens: Vec<Token>,
}

/// Bounded FIFO cache keyed by caption text
pub struct ResultCache {
    /// `None` when caching is disabled (`max_entries = 0`)
    entries: Option<Mutex<LruCache<String, Enrichment>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: NonZeroUsize::new(config.max_entries).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a cached result without touching its eviction position
    pub fn get(&self, text: &str) -> Option<Enrichment> {
        let found = self
            .entries
            .as_ref()
            .and_then(|entries| entries.lock().peek(text).cloned());

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert a result; the oldest insertion is evicted once full
    pub fn insert(&self, text: &str, enrichment: Enrichment) {
        let Some(entries) = &self.entries else {
            return;
        };
        let mut entries = entries.lock();
        if entries.contains(text) {
            return;
        }
        if let Some((evicted, _)) = entries.push(text.to_string(), enrichment) {
            tracing::debug!("Evicted cached enrichment for {:?}", evicted);
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().contains(text))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().cap().get())
            .unwrap_or(0)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}
