use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::Embedding;

/// Offline embedder based on signed feature hashing of lowercase words and word bigrams.
///
/// Texts sharing vocabulary land close together; unrelated vocabularies are near
/// orthogonal. Output is L2-normalized and identical across runs.
pub struct HashingEmbedder {
    dimension: usize,
    seed: u64,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(8),
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_text(&self, text: &str) -> Result<Embedding, EmbedderError> {
        let words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();
        if words.is_empty() {
            return Err(EmbedderError::EmptyInput);
        }

        let mut values = vec![0.0f32; self.dimension];
        for word in &words {
            self.add_feature(&mut values, word.as_bytes(), 1.0);
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut values, bigram.as_bytes(), 0.5);
        }

        let embedding = Embedding::new(values);
        if embedding.is_zero() {
            return Err(EmbedderError::InvalidResponse(
                "hashed features cancelled out".to_string(),
            ));
        }
        Ok(embedding.normalized())
    }

    fn add_feature(&self, values: &mut [f32], feature: &[u8], weight: f32) {
        let hash = xxh3_64_with_seed(feature, self.seed);
        let index = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        values[index] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.embed_text(text)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}
