//! Process-wide descriptor cache.
//!
//! Write-once per key, read-many. Concurrent misses for the same key may both
//! derive a descriptor; derivation is deterministic so whichever insert lands
//! first is kept and the other result is dropped.

use super::{QueryDescriptor, QueryKey};
use crate::error::Result;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: DashMap<QueryKey, Arc<QueryDescriptor>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<Arc<QueryDescriptor>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Cached descriptor for `key`, deriving it with `derive` on a miss
    pub fn get_or_derive<F>(&self, key: &QueryKey, derive: F) -> Result<Arc<QueryDescriptor>>
    where
        F: FnOnce() -> Result<QueryDescriptor>,
    {
        if let Some(descriptor) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(descriptor);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let descriptor = Arc::new(derive()?);
        debug!(key = %key, "Caching query descriptor");

        Ok(self
            .entries
            .entry(key.clone())
            .or_insert(descriptor)
            .value()
            .clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> DescriptorCacheStats {
        let mut cache_keys: Vec<String> = self.entries.iter().map(|e| e.key().to_string()).collect();
        cache_keys.sort();
        DescriptorCacheStats {
            cached_descriptors: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cache_keys,
        }
    }
}

/// Statistics about the descriptor and accessor caches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptorCacheStats {
    pub cached_descriptors: usize,
    pub hits: u64,
    pub misses: u64,
    pub cache_keys: Vec<String>,
}
