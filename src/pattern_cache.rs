use std::sync::Arc;

use moka::sync::Cache;
use regex::Regex;

use crate::error::{Result, ValidationError};

/// In-memory cache of compiled `pattern` arguments
///
/// Keyed by pattern source. `moka` bounds the cache and makes sure a pattern
/// requested by several fields at once is compiled a single time.
pub struct PatternCache {
    cache: Cache<String, Arc<Regex>>,
}

impl PatternCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();

        Self { cache }
    }

    /// Get a compiled pattern from the cache, compiling it if missing
    ///
    /// Compilation failures are returned to the caller and never cached.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<Regex>> {
        self.cache
            .try_get_with(source.to_string(), || Regex::new(source).map(Arc::new))
            .map_err(|e| ValidationError::InvalidPattern {
                pattern: source.to_string(),
                source: (*e).clone(),
            })
    }

    /// Stores a ready-built regex under its own source text
    pub fn insert(&self, regex: Regex) {
        self.cache.insert(regex.as_str().to_string(), Arc::new(regex));
    }

    pub fn get(&self, source: &str) -> Option<Arc<Regex>> {
        self.cache.get(source)
    }

    /// Number of cached patterns, after pending maintenance has run
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}
