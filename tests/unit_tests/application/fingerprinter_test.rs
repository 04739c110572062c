use std::collections::HashSet;

use docroute::application::services::{Fingerprinter, LshConfig, MAX_TABLES};
use docroute::domain::Embedding;

fn embedding() -> Embedding {
    Embedding::new((0..32).map(|i| (i as f32 * 0.37).sin()).collect())
}

#[test]
fn given_same_seed_when_fingerprinting_then_bucket_is_stable_across_instances() {
    let a = Fingerprinter::new(LshConfig::default()).fingerprint(&embedding()).unwrap();
    let b = Fingerprinter::new(LshConfig::default()).fingerprint(&embedding()).unwrap();

    assert_eq!(a.bucket(), b.bucket());
    assert!((a.representative().magnitude() - 1.0).abs() < 1e-5);
}

#[test]
fn given_scaled_vector_when_fingerprinting_then_lands_in_same_bucket() {
    let fingerprinter = Fingerprinter::new(LshConfig::default());
    let scaled = Embedding::new(embedding().values.iter().map(|v| v * 7.5).collect());

    assert_eq!(
        fingerprinter.fingerprint(&embedding()).unwrap().bucket(),
        fingerprinter.fingerprint(&scaled).unwrap().bucket()
    );
}

#[test]
fn given_zero_or_empty_vector_when_fingerprinting_then_returns_none() {
    let fingerprinter = Fingerprinter::new(LshConfig::default());

    assert!(fingerprinter.fingerprint(&Embedding::new(vec![0.0; 8])).is_none());
    assert!(fingerprinter.fingerprint(&Embedding::new(Vec::new())).is_none());
}

#[test]
fn given_default_config_when_fingerprinting_then_holds_one_bucket_per_table() {
    let fingerprint = Fingerprinter::new(LshConfig::default())
        .fingerprint(&embedding())
        .unwrap();

    let tables: Vec<u8> = fingerprint.buckets().iter().map(|b| b.table()).collect();
    assert_eq!(tables, vec![0, 1, 2, 3]);
    assert_eq!(fingerprint.bucket(), fingerprint.buckets()[0]);
}

#[test]
fn given_fingerprint_when_listing_candidates_then_starts_at_exact_buckets_with_distinct_neighbours() {
    let fingerprinter = Fingerprinter::new(LshConfig::default());
    let fingerprint = fingerprinter.fingerprint(&embedding()).unwrap();
    let exact = fingerprint.buckets();

    let candidates = fingerprinter.candidate_buckets(&fingerprint);

    assert_eq!(candidates.len(), 40);
    assert_eq!(&candidates[..exact.len()], exact);
    assert!(candidates[exact.len()..].iter().all(|p| {
        let distance = p.hamming_distance(&exact[p.table() as usize]);
        distance == 1 || distance == 2
    }));
    assert!(
        candidates[exact.len()..36]
            .iter()
            .all(|p| p.hamming_distance(&exact[p.table() as usize]) == 1)
    );
    assert_eq!(candidates.iter().collect::<HashSet<_>>().len(), candidates.len());
}

#[test]
fn given_small_candidate_budget_when_listing_candidates_then_truncates_after_exact_buckets() {
    let fingerprinter = Fingerprinter::new(LshConfig {
        max_candidates: 6,
        ..LshConfig::default()
    });
    let fingerprint = fingerprinter.fingerprint(&embedding()).unwrap();

    let candidates = fingerprinter.candidate_buckets(&fingerprint);

    assert_eq!(candidates.len(), 6);
    assert_eq!(&candidates[..4], fingerprint.buckets());
    assert_eq!(candidates[4].table(), 0);
    assert_eq!(candidates[5].table(), 1);
}

#[test]
fn given_two_bit_hash_when_listing_candidates_then_covers_every_bucket_of_every_table() {
    let fingerprinter = Fingerprinter::new(LshConfig {
        bits: 2,
        ..LshConfig::default()
    });
    let fingerprint = fingerprinter.fingerprint(&embedding()).unwrap();

    let candidates = fingerprinter.candidate_buckets(&fingerprint);

    assert_eq!(candidates.iter().collect::<HashSet<_>>().len(), 16);
    for table in 0..4u8 {
        let hashes: HashSet<u64> = candidates
            .iter()
            .filter(|p| p.table() == table)
            .map(|p| p.as_u64())
            .collect();
        assert_eq!(hashes, HashSet::from([0, 1, 2, 3]));
    }
}

#[test]
fn given_out_of_range_bits_when_building_then_clamps() {
    let fingerprinter = Fingerprinter::new(LshConfig {
        bits: 0,
        ..LshConfig::default()
    });

    assert_eq!(fingerprinter.config().bits, 1);
}

#[test]
fn given_out_of_range_tables_when_building_then_clamps() {
    let none = Fingerprinter::new(LshConfig {
        tables: 0,
        ..LshConfig::default()
    });
    let many = Fingerprinter::new(LshConfig {
        tables: 100,
        ..LshConfig::default()
    });

    assert_eq!(none.config().tables, 1);
    assert_eq!(many.config().tables, MAX_TABLES);
    assert_eq!(none.fingerprint(&embedding()).unwrap().buckets().len(), 1);
}
