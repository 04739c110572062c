use serde::Deserialize;

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::{Embedding, RawDocument};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub max_windows: usize,
    pub window_chars: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_windows: 50,
            window_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextWindow {
    pub page_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSample {
    pub windows: Vec<TextWindow>,
    pub sampled: bool,
}

/// Picks at most `max_windows` pages with a fixed stride and truncates each to
/// `window_chars` characters. Blank pages are skipped.
pub fn sample_windows(document: &RawDocument, config: &SamplingConfig) -> WindowSample {
    let page_count = document.page_count();
    let max_windows = config.max_windows.max(1);
    let stride = page_count.div_ceil(max_windows).max(1);

    let windows = document
        .pages()
        .iter()
        .enumerate()
        .step_by(stride)
        .filter_map(|(page_index, page)| {
            let text = page.text.trim();
            (!text.is_empty()).then(|| TextWindow {
                page_index,
                text: truncate_chars(text, config.window_chars),
            })
        })
        .collect();

    WindowSample {
        windows,
        sampled: stride > 1,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Sampled windows together with their embeddings, index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedSample {
    windows: Vec<TextWindow>,
    embeddings: Vec<Embedding>,
    sampled: bool,
}

impl EmbeddedSample {
    /// Embeds every window with a single batch call.
    pub async fn embed(
        sample: WindowSample,
        embedder: &dyn Embedder,
    ) -> Result<Self, EmbedderError> {
        if sample.windows.is_empty() {
            return Ok(Self {
                windows: Vec::new(),
                embeddings: Vec::new(),
                sampled: sample.sampled,
            });
        }

        let texts: Vec<&str> = sample.windows.iter().map(|w| w.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != sample.windows.len() {
            return Err(EmbedderError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                sample.windows.len(),
                embeddings.len()
            )));
        }
        if embeddings.iter().any(Embedding::is_zero) {
            return Err(EmbedderError::InvalidResponse(
                "provider returned a zero vector".to_string(),
            ));
        }

        Ok(Self {
            windows: sample.windows,
            embeddings,
            sampled: sample.sampled,
        })
    }

    pub fn windows(&self) -> &[TextWindow] {
        &self.windows
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    pub fn sampled(&self) -> bool {
        self.sampled
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Cosine similarity of each window to the next one.
    pub fn consecutive_similarities(&self) -> Vec<f32> {
        self.embeddings
            .windows(2)
            .map(|pair| pair[0].cosine_similarity(&pair[1]))
            .collect()
    }

    pub fn pairwise_distances(&self) -> Vec<f32> {
        let mut distances = Vec::new();
        for (i, a) in self.embeddings.iter().enumerate() {
            for b in &self.embeddings[i + 1..] {
                distances.push(a.cosine_distance(b));
            }
        }
        distances
    }

    /// L2-normalized mean of the window embeddings.
    pub fn representative(&self) -> Option<Embedding> {
        let normalized: Vec<Embedding> = self.embeddings.iter().map(Embedding::normalized).collect();
        Embedding::mean(&normalized)
            .filter(|mean| !mean.is_zero())
            .map(|mean| mean.normalized())
    }
}
