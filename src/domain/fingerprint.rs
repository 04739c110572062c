use std::fmt;

use super::embedding::Embedding;

/// LSH bucket id within one hash table; bit `i` of the hash is the sign of the projection
/// on that table's hyperplane `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketId {
    table: u8,
    hash: u64,
}

impl BucketId {
    pub fn new(bits: u64) -> Self {
        Self::in_table(0, bits)
    }

    pub fn in_table(table: u8, bits: u64) -> Self {
        Self { table, hash: bits }
    }

    pub fn table(&self) -> u8 {
        self.table
    }

    pub fn as_u64(&self) -> u64 {
        self.hash
    }

    pub fn flip(self, bit: u32) -> Self {
        Self {
            hash: self.hash ^ (1u64 << bit),
            ..self
        }
    }

    pub fn hamming_distance(&self, other: &Self) -> u32 {
        (self.hash ^ other.hash).count_ones()
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table > 0 {
            write!(f, "{}:", self.table)?;
        }
        write!(f, "{:016x}", self.hash)
    }
}

/// One bucket per hash table plus the normalized vector they were computed from. The
/// first bucket keys single-flight coordination.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticFingerprint {
    buckets: Vec<BucketId>,
    representative: Embedding,
}

impl SemanticFingerprint {
    pub fn new(bucket: BucketId, representative: Embedding) -> Self {
        Self {
            buckets: vec![bucket],
            representative,
        }
    }

    /// `None` without any bucket.
    pub fn from_tables(buckets: Vec<BucketId>, representative: Embedding) -> Option<Self> {
        (!buckets.is_empty()).then_some(Self {
            buckets,
            representative,
        })
    }

    pub fn bucket(&self) -> BucketId {
        self.buckets[0]
    }

    pub fn buckets(&self) -> &[BucketId] {
        &self.buckets
    }

    pub fn representative(&self) -> &Embedding {
        &self.representative
    }

    pub fn similarity(&self, other: &Self) -> f32 {
        self.representative.cosine_similarity(&other.representative)
    }
}
