use std::sync::Arc;

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::domain::{BucketId, Embedding, SemanticFingerprint};

pub const MAX_TABLES: usize = 16;

/// `tables` independent hash tables of `bits` hyperplanes each. A near-duplicate has to
/// land within a bit flip or two in only one of them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LshConfig {
    pub bits: u32,
    pub tables: usize,
    pub seed: u64,
    /// Upper bound on buckets searched per lookup across all tables, exact buckets included.
    pub max_candidates: usize,
}

impl Default for LshConfig {
    fn default() -> Self {
        Self {
            bits: 8,
            tables: 4,
            seed: 0x5eed_d0c5,
            max_candidates: 40,
        }
    }
}

/// Sign-random-projection hashing. Hyperplanes are drawn from a seeded generator per
/// vector dimension, so fingerprints are stable across runs and processes.
pub struct Fingerprinter {
    config: LshConfig,
    hyperplanes: DashMap<usize, Arc<Vec<Vec<f32>>>>,
}

impl Fingerprinter {
    pub fn new(config: LshConfig) -> Self {
        Self {
            config: LshConfig {
                bits: config.bits.clamp(1, 64),
                tables: config.tables.clamp(1, MAX_TABLES),
                ..config
            },
            hyperplanes: DashMap::new(),
        }
    }

    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    pub fn fingerprint(&self, representative: &Embedding) -> Option<SemanticFingerprint> {
        if representative.dimensions() == 0 || representative.is_zero() {
            return None;
        }
        let normalized = representative.normalized();
        let buckets = self
            .table_projections(&normalized)
            .iter()
            .enumerate()
            .map(|(table, projections)| bucket_of(table, projections))
            .collect();
        SemanticFingerprint::from_tables(buckets, normalized)
    }

    /// Buckets to search for `fingerprint`, capped at `max_candidates`: every table's exact
    /// bucket, then single-bit flips in order of rising projection margin (one table after
    /// the other at each rank), then each table's flip of its two lowest-margin bits.
    pub fn candidate_buckets(&self, fingerprint: &SemanticFingerprint) -> Vec<BucketId> {
        let max_candidates = self.config.max_candidates.max(1);
        let exact = fingerprint.buckets();

        let by_margin: Vec<Vec<u32>> = self
            .table_projections(fingerprint.representative())
            .iter()
            .map(|projections| {
                let mut bits: Vec<(u32, f32)> = projections
                    .iter()
                    .enumerate()
                    .map(|(bit, p)| (bit as u32, p.abs()))
                    .collect();
                bits.sort_by(|a, b| a.1.total_cmp(&b.1));
                bits.into_iter().map(|(bit, _)| bit).collect()
            })
            .collect();

        let singles = (0..self.config.bits as usize).flat_map(|rank| {
            exact
                .iter()
                .zip(&by_margin)
                .filter_map(move |(bucket, bits)| bits.get(rank).map(|bit| bucket.flip(*bit)))
        });
        let pairs = exact
            .iter()
            .zip(&by_margin)
            .filter(|(_, bits)| bits.len() >= 2)
            .map(|(bucket, bits)| bucket.flip(bits[0]).flip(bits[1]));

        exact
            .iter()
            .copied()
            .chain(singles)
            .chain(pairs)
            .take(max_candidates)
            .collect()
    }

    /// Projections grouped per table.
    fn table_projections(&self, embedding: &Embedding) -> Vec<Vec<f32>> {
        let planes = self.hyperplanes_for(embedding.dimensions());
        planes
            .chunks(self.config.bits as usize)
            .map(|table| {
                table
                    .iter()
                    .map(|plane| {
                        plane
                            .iter()
                            .zip(&embedding.values)
                            .map(|(a, b)| a * b)
                            .sum()
                    })
                    .collect()
            })
            .collect()
    }

    fn hyperplanes_for(&self, dimensions: usize) -> Arc<Vec<Vec<f32>>> {
        let count = self.config.tables * self.config.bits as usize;
        self.hyperplanes
            .entry(dimensions)
            .or_insert_with(|| {
                let mut rng = StdRng::seed_from_u64(self.config.seed ^ dimensions as u64);
                Arc::new(
                    (0..count)
                        .map(|_| {
                            (0..dimensions)
                                .map(|_| rng.gen_range(-1.0f32..1.0))
                                .collect()
                        })
                        .collect(),
                )
            })
            .clone()
    }
}

fn bucket_of(table: usize, projections: &[f32]) -> BucketId {
    let bits = projections
        .iter()
        .enumerate()
        .filter(|(_, p)| **p >= 0.0)
        .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));
    BucketId::in_table(table as u8, bits)
}
