//! In-memory content cache with per-entry expiry.
//!
//! Backed by a `moka` cache. Each entry carries the TTL it was stored with,
//! so listings and comment threads can live for different lengths of time
//! in one map. An entry read at or after its deadline is a miss.

use std::fmt;
use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;

use crate::domain::{Comment, Discussion};

/// Values the gateway keeps between remote calls.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedContent {
    Discussions(Vec<Discussion>),
    Discussion(Box<Discussion>),
    Comments(Vec<Comment>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedContent,
    ttl: Duration,
}

/// Expires each entry after the TTL it was last written with.
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

pub struct ContentCache {
    entries: Cache<String, CacheEntry>,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl ContentCache {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().expire_after(EntryTtl).build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedContent> {
        let entry = self.entries.get(key)?;
        tracing::trace!(key, "cache hit");
        Some(entry.value)
    }

    pub fn set(&self, key: impl Into<String>, value: CachedContent, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry { value, ttl });
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Live keys starting with `prefix`.
    pub fn keys_matching(&self, prefix: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| String::clone(&key))
            .collect()
    }

    /// Remove every entry whose key starts with `prefix`. Returns how many were removed.
    ///
    /// Keys are removed one by one rather than through an invalidation
    /// predicate, so the entries are gone when this returns.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        for key in self.keys_matching(prefix) {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        tracing::debug!(prefix, removed, "invalidated cache entries");
        removed
    }

    pub fn clear(&self) {
        self.invalidate_prefix("");
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
