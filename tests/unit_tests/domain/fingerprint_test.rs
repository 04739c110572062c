use docroute::domain::{BucketId, Embedding, SemanticFingerprint};

#[test]
fn given_bucket_when_flipping_bits_then_hamming_distance_tracks_flips() {
    let bucket = BucketId::new(0b1010);

    assert_eq!(bucket.flip(0).as_u64(), 0b1011);
    assert_eq!(bucket.hamming_distance(&bucket.flip(0).flip(3)), 2);
    assert_eq!(bucket.flip(1).flip(1), bucket);
}

#[test]
fn given_bucket_when_displaying_then_renders_fixed_width_hex() {
    assert_eq!(BucketId::new(255).to_string(), "00000000000000ff");
    assert_eq!(BucketId::in_table(3, 255).to_string(), "3:00000000000000ff");
}

#[test]
fn given_buckets_in_different_tables_when_comparing_then_they_differ() {
    let first = BucketId::in_table(0, 5);
    let second = BucketId::in_table(1, 5);

    assert_ne!(first, second);
    assert_eq!(second.flip(0).table(), 1);
    assert_eq!(first.hamming_distance(&second), 0);
}

#[test]
fn given_no_buckets_when_building_fingerprint_then_returns_none() {
    let representative = Embedding::new(vec![1.0, 0.0]);

    assert!(SemanticFingerprint::from_tables(Vec::new(), representative.clone()).is_none());
    let fingerprint = SemanticFingerprint::from_tables(
        vec![BucketId::in_table(0, 1), BucketId::in_table(1, 2)],
        representative,
    )
    .unwrap();
    assert_eq!(fingerprint.bucket(), BucketId::in_table(0, 1));
    assert_eq!(fingerprint.buckets().len(), 2);
}

#[test]
fn given_fingerprints_when_comparing_then_uses_representative_similarity() {
    let a = SemanticFingerprint::new(BucketId::new(1), Embedding::new(vec![1.0, 0.0]));
    let b = SemanticFingerprint::new(BucketId::new(2), Embedding::new(vec![0.0, 1.0]));

    assert!(a.similarity(&b).abs() < 1e-6);
    assert!((a.similarity(&a) - 1.0).abs() < 1e-6);
}
