//! Time-bounded caching of upstream responses
//!
//! Each source client shares one process-owned [`ResponseCache`], injected at
//! construction rather than held in a global, so tests can substitute a fresh
//! cache per case.

use crate::types::{ProvenanceInfo, RegistryMetadata, RepositoryInfo, VulnerabilityRecord};
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Logical request identity used as a cache key.
///
/// Keys are structured rather than raw strings so that normalization happens
/// upstream, once, instead of at every lookup site.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    pub name: String,
    pub version: Option<String>,
}

impl CacheKey {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(String::from),
        }
    }
}

/// A generic cache whose entries expire after a fixed duration.
///
/// Eviction is lazy: an expired entry is removed the next time it is looked
/// up, not on a background timer. Safe under concurrent access from multiple
/// in-flight audits.
#[derive(Debug)]
pub struct TtlCache<V: Clone> {
    entries: DashMap<CacheKey, (V, Instant)>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Get a value if present and not expired. Expired entries are removed.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, inserted_at) = entry.value();
                if inserted_at.elapsed() < self.ttl {
                    return Some(value.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        self.entries.insert(key, (value, Instant::now()));
    }

    /// Number of entries currently stored, including not-yet-evicted expired
    /// ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One typed TTL cache per external source, shared by all audits.
#[derive(Debug)]
pub struct ResponseCache {
    pub registry: TtlCache<RegistryMetadata>,
    pub downloads: TtlCache<u64>,
    pub repository: TtlCache<RepositoryInfo>,
    pub vulnerabilities: TtlCache<Vec<VulnerabilityRecord>>,
    pub provenance: TtlCache<ProvenanceInfo>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            registry: TtlCache::new(ttl),
            downloads: TtlCache::new(ttl),
            repository: TtlCache::new(ttl),
            vulnerabilities: TtlCache::new(ttl),
            provenance: TtlCache::new(ttl),
        }
    }
}
