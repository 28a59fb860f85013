//! Memoized translations keyed by content hash.

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    translation: String,
    inserted_at: Instant,
}

/// Bounded store of past translations for one language pair.
///
/// Lookups are exact on the source text. Entries older than the TTL are
/// treated as absent and removed lazily on lookup; there is no background
/// sweeper. At capacity, the oldest tenth of the entries is evicted in one
/// batch so inserts do not thrash.
pub struct TranslationCache {
    entries: HashMap<String, CacheEntry>,
    config: CacheConfig,
    /// Language pair baked into every key so a reconfigured run never reads
    /// stale translations for a different pair.
    key_prefix: String,
    hits: u64,
    misses: u64,
    clock: Box<dyn Clock>,
}

impl TranslationCache {
    pub fn new(config: CacheConfig, source_lang: &str, target_lang: &str) -> Self {
        Self::with_clock(config, source_lang, target_lang, Box::new(SystemClock))
    }

    pub fn with_clock(
        config: CacheConfig,
        source_lang: &str,
        target_lang: &str,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            key_prefix: format!("{}:{}:", source_lang, target_lang),
            hits: 0,
            misses: 0,
            clock,
        }
    }

    fn key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key_prefix.as_bytes());
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Looks up a translation, expiring the entry if it is too old.
    pub fn get(&mut self, text: &str) -> Option<String> {
        let key = self.key(text);
        let ttl = Duration::from_secs(self.config.ttl_secs);
        let now = self.clock.now();

        match self.entries.get(&key) {
            Some(entry) if now.duration_since(entry.inserted_at) <= ttl => {
                self.hits += 1;
                Some(entry.translation.clone())
            }
            Some(_) => {
                self.entries.remove(&key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores a translation, batch-evicting the oldest entries at capacity.
    pub fn insert(&mut self, text: &str, translation: &str) {
        if self.entries.len() >= self.config.max_size {
            self.evict_oldest();
        }
        self.entries.insert(
            self.key(text),
            CacheEntry {
                translation: translation.to_string(),
                inserted_at: self.clock.now(),
            },
        );
    }

    /// Removes the oldest tenth of the entries, at least one.
    fn evict_oldest(&mut self) {
        let batch = (self.config.max_size / 10).max(1);
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|(k, e)| (k.clone(), e.inserted_at))
            .collect();
        by_age.sort_by_key(|&(_, at)| at);
        for (key, _) in by_age.into_iter().take(batch) {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
