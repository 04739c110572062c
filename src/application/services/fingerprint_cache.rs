use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::application::ports::{
    CacheError, CacheHit, CacheQuery, CacheStats, Embedder, ResultCache,
};
use crate::domain::{BucketId, ConversionResult, RawDocument, SemanticFingerprint};

use super::fingerprinter::{Fingerprinter, LshConfig};
use super::sampling::{EmbeddedSample, SamplingConfig, sample_windows};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FingerprintCacheConfig {
    pub similarity_threshold: f32,
    pub backend_timeout_ms: u64,
    pub lsh: LshConfig,
}

impl Default for FingerprintCacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.95,
            backend_timeout_ms: 250,
            lsh: LshConfig::default(),
        }
    }
}

impl FingerprintCacheConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(CacheHit),
    Miss,
    Unavailable(String),
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// Result of a single-flight section: either another caller filled the cache while this
/// one waited, or this caller ran the computation. `stored` tells whether the backend
/// accepted the computed result.
#[derive(Debug)]
pub enum Flight<T> {
    Cached(CacheHit),
    Computed { value: T, stored: bool },
}

/// Near-duplicate-aware front of a [`ResultCache`].
///
/// Backend failures and slow backends degrade to misses; they never fail the caller.
pub struct FingerprintCache {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ResultCache>,
    fingerprinter: Fingerprinter,
    sampling: SamplingConfig,
    config: FingerprintCacheConfig,
    in_flight: DashMap<BucketId, Arc<Mutex<()>>>,
}

impl FingerprintCache {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ResultCache>,
        sampling: SamplingConfig,
        config: FingerprintCacheConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            fingerprinter: Fingerprinter::new(config.lsh),
            sampling,
            config,
            in_flight: DashMap::new(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn fingerprint_sample(&self, sample: &EmbeddedSample) -> Option<SemanticFingerprint> {
        sample
            .representative()
            .and_then(|representative| self.fingerprinter.fingerprint(&representative))
    }

    /// Samples and embeds the document; `None` when there is no text or the provider fails.
    pub async fn fingerprint(&self, document: &RawDocument) -> Option<SemanticFingerprint> {
        let windows = sample_windows(document, &self.sampling);
        match EmbeddedSample::embed(windows, self.embedder.as_ref()).await {
            Ok(sample) => self.fingerprint_sample(&sample),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fingerprint document, cache bypassed");
                None
            }
        }
    }

    pub async fn get(&self, document: &RawDocument) -> CacheLookup {
        match self.fingerprint(document).await {
            Some(fingerprint) => self.lookup(&fingerprint).await,
            None => CacheLookup::Unavailable("document could not be fingerprinted".to_string()),
        }
    }

    pub async fn put(&self, document: &RawDocument, result: ConversionResult) -> bool {
        match self.fingerprint(document).await {
            Some(fingerprint) => self.store(&fingerprint, result).await,
            None => false,
        }
    }

    pub async fn lookup(&self, fingerprint: &SemanticFingerprint) -> CacheLookup {
        let candidates = self.fingerprinter.candidate_buckets(fingerprint);
        let query = CacheQuery {
            buckets: &candidates,
            exact: fingerprint.buckets().len(),
            representative: fingerprint.representative(),
            min_similarity: self.config.similarity_threshold,
        };

        let pending = self.store.lookup(query);
        let outcome = tokio::time::timeout(self.config.backend_timeout(), pending)
            .await
            .unwrap_or(Err(CacheError::Timeout));

        match outcome {
            Ok(Some(hit)) => {
                tracing::debug!(
                    bucket = %fingerprint.bucket(),
                    similarity = hit.similarity,
                    "Fingerprint cache hit"
                );
                CacheLookup::Hit(hit)
            }
            Ok(None) => CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    bucket = %fingerprint.bucket(),
                    "Cache lookup failed, treating as miss"
                );
                CacheLookup::Unavailable(e.to_string())
            }
        }
    }

    pub async fn store(&self, fingerprint: &SemanticFingerprint, result: ConversionResult) -> bool {
        let pending = self.store.store(fingerprint.clone(), result);
        match tokio::time::timeout(self.config.backend_timeout(), pending).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, bucket = %fingerprint.bucket(), "Cache store failed");
                false
            }
            Err(_) => {
                tracing::warn!(bucket = %fingerprint.bucket(), "Cache store timed out");
                false
            }
        }
    }

    /// Lookup, then compute under the bucket's single-flight lock and store the result.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        fingerprint: &SemanticFingerprint,
        compute: F,
    ) -> Result<(ConversionResult, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ConversionResult, E>>,
    {
        if let CacheLookup::Hit(hit) = self.lookup(fingerprint).await {
            return Ok((hit.lease.result.as_cached(), true));
        }

        match self
            .single_flight(fingerprint, |result| Some(result.clone()), compute)
            .await?
        {
            Flight::Cached(hit) => Ok((hit.lease.result.as_cached(), true)),
            Flight::Computed { value, .. } => Ok((value, false)),
        }
    }

    /// Runs `compute` while holding the per-bucket lock. Waiters re-check the cache once
    /// they get the lock, so one bucket sees at most one computation at a time. Whatever
    /// `cacheable` extracts from a successful run is stored before the lock is released.
    pub async fn single_flight<T, E, F, Fut>(
        &self,
        fingerprint: &SemanticFingerprint,
        cacheable: impl Fn(&T) -> Option<ConversionResult>,
        compute: F,
    ) -> Result<Flight<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let bucket = fingerprint.bucket();
        let gate = self
            .in_flight
            .entry(bucket)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let outcome = {
            let _guard = gate.lock().await;

            if let CacheLookup::Hit(hit) = self.lookup(fingerprint).await {
                Ok(Flight::Cached(hit))
            } else {
                match compute().await {
                    Ok(value) => {
                        let stored = match cacheable(&value) {
                            Some(result) => self.store(fingerprint, result).await,
                            None => false,
                        };
                        Ok(Flight::Computed { value, stored })
                    }
                    Err(e) => Err(e),
                }
            }
        };

        self.in_flight
            .remove_if(&bucket, |_, registered| Arc::strong_count(registered) <= 2);
        outcome
    }
}
