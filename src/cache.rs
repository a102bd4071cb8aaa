//! Per-endpoint payload cache shared by every render of a session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone)]
struct CachedPayload {
    value: Arc<Value>,
    stored_at: Instant,
    fetched_at: DateTime<Utc>,
}

/// What the cache currently holds for one URL.
#[derive(Clone, Debug, Serialize)]
pub struct CacheEntryInfo {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
}

/// Successful payloads keyed by URL. Entries expire after `ttl` when one is
/// set, otherwise they live until invalidated or the process exits.
pub struct FetchCache {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, CachedPayload>>,
}

impl FetchCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn get(&self, url: &str) -> Option<Arc<Value>> {
        let mut entries = self.entries.lock().expect("fetch cache lock poisoned");
        let expired = match entries.get(url) {
            Some(entry) => self.is_expired(entry),
            None => return None,
        };
        if expired {
            entries.remove(url);
            return None;
        }
        entries.get(url).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, url: &str, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        let entry = CachedPayload {
            value: value.clone(),
            stored_at: Instant::now(),
            fetched_at: Utc::now(),
        };
        self.entries
            .lock()
            .expect("fetch cache lock poisoned")
            .insert(url.to_string(), entry);
        value
    }

    /// Drops a single URL; returns whether anything was cached for it.
    pub fn invalidate(&self, url: &str) -> bool {
        self.entries
            .lock()
            .expect("fetch cache lock poisoned")
            .remove(url)
            .is_some()
    }

    /// Drops everything and returns how many entries were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().expect("fetch cache lock poisoned");
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let entries = self.entries.lock().expect("fetch cache lock poisoned");
        let mut info: Vec<CacheEntryInfo> = entries
            .iter()
            .filter(|(_, entry)| !self.is_expired(entry))
            .map(|(url, entry)| CacheEntryInfo {
                url: url.clone(),
                fetched_at: entry.fetched_at,
            })
            .collect();
        info.sort_by(|a, b| a.url.cmp(&b.url));
        info
    }

    fn is_expired(&self, entry: &CachedPayload) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() >= ttl,
            None => false,
        }
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(None)
    }
}
