use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{BucketId, CacheEntry, ConversionResult, Embedding, SemanticFingerprint};

/// Read handle on a cache entry. While any lease is alive the entry is not evicted.
#[derive(Debug, Clone)]
pub struct CacheLease(Arc<CacheEntry>);

impl CacheLease {
    pub fn new(entry: Arc<CacheEntry>) -> Self {
        Self(entry)
    }
}

impl Deref for CacheLease {
    type Target = CacheEntry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct CacheHit {
    pub lease: CacheLease,
    pub similarity: f32,
}

/// Query against the bucketed index: search `buckets` in order, accept the most similar
/// entry whose cosine similarity to `representative` reaches `min_similarity`. A match
/// among the first `exact` buckets ends the search early.
#[derive(Debug, Clone, Copy)]
pub struct CacheQuery<'a> {
    pub buckets: &'a [BucketId],
    pub exact: usize,
    pub representative: &'a Embedding,
    pub min_similarity: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn lookup(&self, query: CacheQuery<'_>) -> Result<Option<CacheHit>, CacheError>;

    async fn store(
        &self,
        fingerprint: SemanticFingerprint,
        result: ConversionResult,
    ) -> Result<(), CacheError>;

    fn stats(&self) -> CacheStats;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache backend timed out")]
    Timeout,
}
