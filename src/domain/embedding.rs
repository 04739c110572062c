#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    pub fn magnitude(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }

        let dot_product = self.dot(other);
        let magnitude_a = self.magnitude();
        let magnitude_b = other.magnitude();

        if magnitude_a == 0.0 || magnitude_b == 0.0 {
            return 0.0;
        }

        dot_product / (magnitude_a * magnitude_b)
    }

    /// Cosine distance clamped to `[0, 1]`; anti-correlated vectors count as fully distant.
    pub fn cosine_distance(&self, other: &Self) -> f32 {
        (1.0 - self.cosine_similarity(other)).clamp(0.0, 1.0)
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn normalized(&self) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return self.clone();
        }
        Self::new(self.values.iter().map(|v| v / magnitude).collect())
    }

    /// Component-wise mean of vectors sharing the first vector's dimension.
    /// Returns `None` for an empty slice or when no vector matches.
    pub fn mean(embeddings: &[Embedding]) -> Option<Self> {
        let dimensions = embeddings.first()?.dimensions();
        let mut sum = vec![0.0f32; dimensions];
        let mut count = 0usize;

        for embedding in embeddings.iter().filter(|e| e.dimensions() == dimensions) {
            for (acc, value) in sum.iter_mut().zip(&embedding.values) {
                *acc += value;
            }
            count += 1;
        }

        if count == 0 {
            return None;
        }

        let count = count as f32;
        Some(Self::new(sum.into_iter().map(|v| v / count).collect()))
    }
}
