use std::time::Duration;

use docroute::application::ports::{CacheQuery, ResultCache};
use docroute::domain::{BucketId, Embedding, SemanticFingerprint, Tier};
use docroute::infrastructure::cache::{InMemoryResultCache, MAX_BUCKET_ENTRIES};

use crate::helpers::{fingerprint, result};

fn query<'a>(buckets: &'a [BucketId], representative: &'a Embedding) -> CacheQuery<'a> {
    CacheQuery {
        buckets,
        exact: 1,
        representative,
        min_similarity: 0.9,
    }
}

#[tokio::test]
async fn given_stored_entry_when_looking_up_its_bucket_then_returns_lease() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    cache
        .store(fingerprint(1, vec![1.0, 0.0]), result(Tier::Fast, "alpha", 0.9))
        .await
        .unwrap();

    let representative = Embedding::new(vec![1.0, 0.0]);
    let hit = cache
        .lookup(query(&[BucketId::new(1)], &representative))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(hit.lease.result.text, "alpha");
    assert!(!hit.lease.result.cached);
    assert!((hit.similarity - 1.0).abs() < 1e-6);
    assert_eq!(cache.stats().hits, 1);
}

#[tokio::test]
async fn given_entry_in_neighbour_bucket_when_searching_neighbours_then_finds_it() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    cache
        .store(fingerprint(5, vec![1.0, 0.1]), result(Tier::Fast, "near", 0.9))
        .await
        .unwrap();

    let representative = Embedding::new(vec![1.0, 0.0]);
    let hit = cache
        .lookup(query(&[BucketId::new(1), BucketId::new(5)], &representative))
        .await
        .unwrap();

    assert!(hit.is_some());
}

#[tokio::test]
async fn given_dissimilar_entry_when_looking_up_then_misses() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    cache
        .store(fingerprint(1, vec![0.0, 1.0]), result(Tier::Fast, "other", 0.9))
        .await
        .unwrap();

    let representative = Embedding::new(vec![1.0, 0.0]);
    let hit = cache
        .lookup(query(&[BucketId::new(1)], &representative))
        .await
        .unwrap();

    assert!(hit.is_none());
    assert_eq!(cache.stats().misses, 1);
}

#[tokio::test(start_paused = true)]
async fn given_expired_entry_when_looking_up_then_misses_and_counts_expiration() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    cache
        .store(fingerprint(1, vec![1.0, 0.0]), result(Tier::Fast, "stale", 0.9))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(61)).await;
    let representative = Embedding::new(vec![1.0, 0.0]);
    let hit = cache
        .lookup(query(&[BucketId::new(1)], &representative))
        .await
        .unwrap();

    assert!(hit.is_none());
    assert_eq!(cache.stats().expirations, 1);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn given_full_cache_when_storing_then_evicts_least_recently_used() {
    let cache = InMemoryResultCache::new(2, Duration::from_secs(60));
    let a = Embedding::new(vec![1.0, 0.0, 0.0]);
    let b = Embedding::new(vec![0.0, 1.0, 0.0]);
    cache
        .store(fingerprint(1, a.values.clone()), result(Tier::Fast, "a", 0.9))
        .await
        .unwrap();
    cache
        .store(fingerprint(2, b.values.clone()), result(Tier::Fast, "b", 0.9))
        .await
        .unwrap();

    let touched = cache.lookup(query(&[BucketId::new(1)], &a)).await.unwrap();
    drop(touched);
    cache
        .store(fingerprint(3, vec![0.0, 0.0, 1.0]), result(Tier::Fast, "c", 0.9))
        .await
        .unwrap();

    assert!(cache.lookup(query(&[BucketId::new(2)], &b)).await.unwrap().is_none());
    assert!(cache.lookup(query(&[BucketId::new(1)], &a)).await.unwrap().is_some());
    assert_eq!(cache.stats().evictions, 1);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn given_leased_entry_when_capacity_is_exceeded_then_it_survives() {
    let cache = InMemoryResultCache::new(1, Duration::from_secs(60));
    let a = Embedding::new(vec![1.0, 0.0]);
    cache
        .store(fingerprint(1, a.values.clone()), result(Tier::Fast, "a", 0.9))
        .await
        .unwrap();
    let lease = cache.lookup(query(&[BucketId::new(1)], &a)).await.unwrap();

    cache
        .store(fingerprint(2, vec![0.0, 1.0]), result(Tier::Fast, "b", 0.9))
        .await
        .unwrap();

    assert_eq!(lease.unwrap().lease.result.text, "a");
    assert!(cache.lookup(query(&[BucketId::new(1)], &a)).await.unwrap().is_some());
}

#[tokio::test]
async fn given_same_fingerprint_when_storing_again_then_replaces_entry() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    let a = Embedding::new(vec![1.0, 0.0]);
    cache
        .store(fingerprint(1, a.values.clone()), result(Tier::Fast, "old", 0.8))
        .await
        .unwrap();
    cache
        .store(fingerprint(1, a.values.clone()), result(Tier::LayoutAware, "new", 0.9))
        .await
        .unwrap();

    let hit = cache
        .lookup(query(&[BucketId::new(1)], &a))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(hit.lease.result.text, "new");
    assert_eq!(cache.stats().inserts, 2);
}

#[tokio::test(start_paused = true)]
async fn given_one_expired_and_one_live_entry_when_looking_up_then_only_expired_is_dropped() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    let old = Embedding::new(vec![1.0, 0.0]);
    let fresh = Embedding::new(vec![0.0, 1.0]);
    cache
        .store(fingerprint(1, old.values.clone()), result(Tier::Fast, "old", 0.9))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    cache
        .store(fingerprint(2, fresh.values.clone()), result(Tier::Fast, "fresh", 0.9))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(31)).await;
    let hit = cache
        .lookup(query(&[BucketId::new(2)], &fresh))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(hit.lease.result.text, "fresh");
    assert_eq!(cache.stats().expirations, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.bucket_len(BucketId::new(1)), 0);
}

#[tokio::test(start_paused = true)]
async fn given_leased_expired_entry_when_released_then_next_lookup_drops_it() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    let a = Embedding::new(vec![1.0, 0.0]);
    cache
        .store(fingerprint(1, a.values.clone()), result(Tier::Fast, "a", 0.9))
        .await
        .unwrap();
    let lease = cache.lookup(query(&[BucketId::new(1)], &a)).await.unwrap();

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(cache.lookup(query(&[BucketId::new(1)], &a)).await.unwrap().is_none());
    assert_eq!(cache.len(), 1);

    drop(lease);
    assert!(cache.lookup(query(&[BucketId::new(1)], &a)).await.unwrap().is_none());
    assert!(cache.is_empty());
    assert_eq!(cache.stats().expirations, 1);
}

#[tokio::test]
async fn given_full_bucket_when_storing_then_evicts_least_recent_from_that_bucket() {
    let dimensions = MAX_BUCKET_ENTRIES + 1;
    let one_hot = |i: usize| {
        let mut values = vec![0.0; dimensions];
        values[i] = 1.0;
        values
    };
    let cache = InMemoryResultCache::new(1_000, Duration::from_secs(60));
    for i in 0..dimensions {
        cache
            .store(fingerprint(1, one_hot(i)), result(Tier::Fast, "doc", 0.9))
            .await
            .unwrap();
    }

    assert_eq!(cache.bucket_len(BucketId::new(1)), MAX_BUCKET_ENTRIES);
    assert_eq!(cache.stats().evictions, 1);
    let first = Embedding::new(one_hot(0));
    let last = Embedding::new(one_hot(dimensions - 1));
    assert!(cache.lookup(query(&[BucketId::new(1)], &first)).await.unwrap().is_none());
    assert!(cache.lookup(query(&[BucketId::new(1)], &last)).await.unwrap().is_some());
}

#[tokio::test]
async fn given_entry_in_several_tables_when_looking_up_second_table_then_finds_it() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    let a = Embedding::new(vec![1.0, 0.0]);
    let buckets = vec![BucketId::in_table(0, 1), BucketId::in_table(1, 7)];
    let stored = SemanticFingerprint::from_tables(buckets, a.clone()).unwrap();
    cache
        .store(stored, result(Tier::Fast, "tables", 0.9))
        .await
        .unwrap();

    let hit = cache
        .lookup(query(&[BucketId::in_table(1, 7)], &a))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(hit.lease.result.text, "tables");
    assert_eq!(cache.bucket_len(BucketId::in_table(0, 1)), 1);
    assert_eq!(cache.bucket_len(BucketId::in_table(1, 7)), 1);
    assert!(cache.lookup(query(&[BucketId::new(7)], &a)).await.unwrap().is_none());
}

#[tokio::test]
async fn given_hit_in_exact_bucket_when_looking_up_then_neighbours_are_not_read() {
    let cache = InMemoryResultCache::new(10, Duration::from_secs(60));
    let query_vector = Embedding::new(vec![1.0, 0.0]);
    cache
        .store(fingerprint(1, vec![1.0, 0.3]), result(Tier::Fast, "exact", 0.9))
        .await
        .unwrap();
    cache
        .store(fingerprint(3, vec![1.0, 0.0]), result(Tier::Fast, "neighbour", 0.9))
        .await
        .unwrap();

    let hit = cache
        .lookup(query(&[BucketId::new(1), BucketId::new(3)], &query_vector))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(hit.lease.result.text, "exact");
}
