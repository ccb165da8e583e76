use super::CacheKey;
use saddle_core::stmt::Value;

use std::collections::HashMap;

/// When local cache entries are retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalCacheScope {
    /// Entries survive until the session writes, commits, rolls back, or
    /// closes.
    #[default]
    Session,
    /// The cache is cleared after every top-level query, which disables
    /// cross-call caching while still deduplicating nested queries within
    /// one call.
    Statement,
}

/// Session-local cache of materialized query results, owned by exactly one
/// executor.
#[derive(Debug, Default)]
pub struct LocalCache {
    entries: HashMap<CacheKey, Vec<Value>>,
}

impl LocalCache {
    pub fn get(&self, key: &CacheKey) -> Option<&Vec<Value>> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: CacheKey, value: Vec<Value>) {
        self.entries.insert(key, value);
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "clearing local cache");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
