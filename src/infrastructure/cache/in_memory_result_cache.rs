use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::application::ports::{
    CacheError, CacheHit, CacheLease, CacheQuery, CacheStats, ResultCache,
};
use crate::domain::{BucketId, CacheEntry, ConversionResult, SemanticFingerprint};

/// Entries this similar to a new one sharing a bucket are replaced by it.
const REPLACE_SIMILARITY: f32 = 0.999;

/// Most entries one bucket holds; the least recently used unleased one makes room.
pub const MAX_BUCKET_ENTRIES: usize = 64;

struct Slot {
    entry: Arc<CacheEntry>,
    expires_at: Instant,
    last_used: u64,
}

impl Slot {
    fn is_leased(&self) -> bool {
        Arc::strong_count(&self.entry) > 1
    }
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<u64, Slot>,
    buckets: HashMap<BucketId, Vec<u64>>,
    recency: BTreeMap<u64, u64>,
    expiry: BTreeSet<(Instant, u64)>,
    next_id: u64,
    clock: u64,
    stats: CacheStats,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, id: u64) {
        let now = self.tick();
        if let Some(slot) = self.slots.get_mut(&id) {
            self.recency.remove(&slot.last_used);
            slot.last_used = now;
            self.recency.insert(now, id);
        }
    }

    fn remove(&mut self, id: u64) -> Option<Slot> {
        let slot = self.slots.remove(&id)?;
        self.recency.remove(&slot.last_used);
        self.expiry.remove(&(slot.expires_at, id));
        for bucket in slot.entry.fingerprint.buckets() {
            if let Some(ids) = self.buckets.get_mut(bucket) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.buckets.remove(bucket);
                }
            }
        }
        Some(slot)
    }

    /// Drops expired entries, walking only the expired head of the expiry index.
    /// Leased entries stay until a later call finds them released.
    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<u64> = self
            .expiry
            .range(..=(now, u64::MAX))
            .map(|(_, id)| *id)
            .filter(|id| self.slots.get(id).is_some_and(|slot| !slot.is_leased()))
            .collect();
        for id in expired {
            self.remove(id);
            self.stats.expirations += 1;
        }
    }

    fn evict_least_recent(&mut self, candidates: impl Iterator<Item = u64>) -> bool {
        let victim = candidates
            .filter_map(|id| self.slots.get(&id).map(|slot| (id, slot)))
            .filter(|(_, slot)| !slot.is_leased())
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(id, _)| id);
        match victim {
            Some(id) => {
                self.remove(id);
                self.stats.evictions += 1;
                true
            }
            None => false,
        }
    }

    /// Keeps every bucket of `fingerprint` within [`MAX_BUCKET_ENTRIES`].
    fn enforce_bucket_limit(&mut self, fingerprint: &SemanticFingerprint) {
        for bucket in fingerprint.buckets() {
            while self
                .buckets
                .get(bucket)
                .is_some_and(|ids| ids.len() > MAX_BUCKET_ENTRIES)
            {
                let ids = self.buckets.get(bucket).cloned().unwrap_or_default();
                if !self.evict_least_recent(ids.into_iter()) {
                    break;
                }
            }
        }
    }

    /// Evicts least recently used entries until within capacity. Leased entries are
    /// skipped, so the cache may briefly exceed capacity.
    fn enforce_capacity(&mut self, capacity: usize) {
        while self.slots.len() > capacity {
            let victim = self
                .recency
                .values()
                .copied()
                .find(|id| self.slots.get(id).is_some_and(|slot| !slot.is_leased()));
            match victim {
                Some(id) => {
                    self.remove(id);
                    self.stats.evictions += 1;
                }
                None => {
                    tracing::warn!(
                        entries = self.slots.len(),
                        capacity,
                        "All cache entries are leased, capacity temporarily exceeded"
                    );
                    break;
                }
            }
        }
    }
}

/// Process-local bucketed index with TTL expiry and LRU eviction. A lookup reads at most
/// [`MAX_BUCKET_ENTRIES`] entries per searched bucket, whatever the cache size.
pub struct InMemoryResultCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: Duration,
}

impl InMemoryResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries currently indexed under `bucket`.
    pub fn bucket_len(&self, bucket: BucketId) -> usize {
        self.lock().buckets.get(&bucket).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn lookup(&self, query: CacheQuery<'_>) -> Result<Option<CacheHit>, CacheError> {
        let now = Instant::now();
        let mut state = self.lock();
        state.purge_expired(now);

        let mut best: Option<(u64, f32)> = None;
        for (position, bucket) in query.buckets.iter().enumerate() {
            if position == query.exact && best.is_some() {
                break;
            }
            let Some(ids) = state.buckets.get(bucket) else {
                continue;
            };
            for id in ids {
                let Some(slot) = state.slots.get(id) else {
                    continue;
                };
                if slot.expires_at <= now {
                    continue;
                }
                let similarity = slot
                    .entry
                    .fingerprint
                    .representative()
                    .cosine_similarity(query.representative);
                if similarity >= query.min_similarity
                    && best.is_none_or(|(_, current)| similarity > current)
                {
                    best = Some((*id, similarity));
                }
            }
        }

        match best {
            Some((id, similarity)) => {
                state.touch(id);
                state.stats.hits += 1;
                let lease = state
                    .slots
                    .get(&id)
                    .map(|slot| CacheLease::new(Arc::clone(&slot.entry)));
                Ok(lease.map(|lease| CacheHit { lease, similarity }))
            }
            None => {
                state.stats.misses += 1;
                Ok(None)
            }
        }
    }

    async fn store(
        &self,
        fingerprint: SemanticFingerprint,
        result: ConversionResult,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut state = self.lock();
        state.purge_expired(now);

        let mut replaced: Vec<u64> = fingerprint
            .buckets()
            .iter()
            .filter_map(|bucket| state.buckets.get(bucket))
            .flatten()
            .copied()
            .filter(|id| {
                state.slots.get(id).is_some_and(|slot| {
                    !slot.is_leased()
                        && slot.entry.fingerprint.similarity(&fingerprint) >= REPLACE_SIMILARITY
                })
            })
            .collect();
        replaced.sort_unstable();
        replaced.dedup();
        for id in replaced {
            state.remove(id);
        }

        let id = state.next_id;
        state.next_id += 1;
        let last_used = state.tick();
        let expires_at = now + self.ttl;
        for bucket in fingerprint.buckets() {
            state.buckets.entry(*bucket).or_default().push(id);
        }
        let entry = Arc::new(CacheEntry::new(
            fingerprint,
            ConversionResult {
                cached: false,
                ..result
            },
            self.ttl,
        ));

        state.slots.insert(
            id,
            Slot {
                entry: Arc::clone(&entry),
                expires_at,
                last_used,
            },
        );
        state.recency.insert(last_used, id);
        state.expiry.insert((expires_at, id));
        state.stats.inserts += 1;

        state.enforce_bucket_limit(&entry.fingerprint);
        drop(entry);
        let capacity = self.capacity;
        state.enforce_capacity(capacity);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.slots.len(),
            ..state.stats
        }
    }
}
