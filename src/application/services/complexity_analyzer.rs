use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::domain::{
    ComplexityMetrics, ComplexityScore, ComplexityWeights, ComponentScores, DocumentPattern,
    Embedding, LayoutType, LineProfile, Page, RawDocument,
};

use super::sampling::EmbeddedSample;

const MATH_GLYPHS: &[char] = &[
    '∑', '∫', '∂', '√', '∞', '≤', '≥', '≈', '≠', '±', '×', '÷', '∆', '∇', '∈', '∀', '∃', '⊂',
    '⊆', '∪', '∩', 'π', 'θ', 'λ', 'μ', 'σ', 'α', 'β', 'γ', 'δ', 'ε', 'Ω',
];

/// Largest possible variance of values confined to `[0, 1]`.
const MAX_DISTANCE_VARIANCE: f32 = 0.25;

static LATEX_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:frac|sum|int|sqrt|partial|alpha|beta|gamma|lambda|mathbb|begin\{equation)|\$\$")
        .unwrap()
});

static CODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:fn |def |class |#include|import |public |private |let |const |function |return )|```|[{;]\s*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComplexityAnalyzerConfig {
    pub weights: ComplexityWeights,
    /// Characters per page that count as a fully dense page.
    pub dense_page_chars: f32,
    /// Component standard deviation tolerated before confidence drops.
    pub disagreement_tolerance: f32,
    pub sampling_penalty: f32,
    pub missing_semantic_penalty: f32,
    pub degraded_pattern_penalty: f32,
    pub topic_similarity: f32,
}

impl Default for ComplexityAnalyzerConfig {
    fn default() -> Self {
        Self {
            weights: ComplexityWeights::default(),
            dense_page_chars: 3000.0,
            disagreement_tolerance: 0.15,
            sampling_penalty: 0.1,
            missing_semantic_penalty: 0.1,
            degraded_pattern_penalty: 0.05,
            topic_similarity: 0.7,
        }
    }
}

pub struct ComplexityAnalyzer {
    config: ComplexityAnalyzerConfig,
}

struct SemanticSignal {
    score: f32,
    topic_clusters: usize,
    available: bool,
}

struct VisualSignal {
    score: f32,
    layout: LayoutType,
}

impl ComplexityAnalyzer {
    pub fn new(config: ComplexityAnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn weights(&self) -> &ComplexityWeights {
        &self.config.weights
    }

    /// Scores a document. Missing inputs contribute zero and lower the confidence.
    pub fn analyze(
        &self,
        document: &RawDocument,
        pattern: Option<&DocumentPattern>,
        sample: Option<&EmbeddedSample>,
    ) -> ComplexityScore {
        let page_count = document.page_count();
        let profile = LineProfile::from_pages(document.pages());

        let semantic = self.semantic(sample);
        let visual = visual(document.pages());
        let components = ComponentScores {
            structural: structural(document, &profile),
            semantic: semantic.score,
            visual: visual.score,
            density: self.density(document),
            special: special(document),
        };

        let sampled = sample.is_some_and(EmbeddedSample::sampled);
        let degraded = pattern.is_some_and(DocumentPattern::is_degraded);
        let confidence = self.confidence(&components, sampled, semantic.available, degraded);

        let metrics = ComplexityMetrics {
            page_count,
            table_count: document.table_count(),
            image_count: document.image_count(),
            avg_chars_per_page: if page_count == 0 {
                0.0
            } else {
                document.char_count() as f32 / page_count as f32
            },
            topic_clusters: semantic.topic_clusters,
            section_count: pattern.map_or(0, |p| p.section_boundaries().len() + 1),
            layout: visual.layout,
            sampled,
            semantic_available: semantic.available,
        };

        let score = ComplexityScore::new(components, &self.config.weights, confidence, metrics);
        tracing::debug!(
            overall = score.overall(),
            confidence = score.confidence(),
            structural = components.structural,
            semantic = components.semantic,
            visual = components.visual,
            density = components.density,
            special = components.special,
            "Complexity scored"
        );
        score
    }

    fn semantic(&self, sample: Option<&EmbeddedSample>) -> SemanticSignal {
        let Some(sample) = sample.filter(|s| s.len() >= 2) else {
            return SemanticSignal {
                score: 0.0,
                topic_clusters: sample.map_or(0, EmbeddedSample::len),
                available: false,
            };
        };

        let distances = sample.pairwise_distances();
        let mean = distances.iter().sum::<f32>() / distances.len() as f32;
        let variance =
            distances.iter().map(|d| (d - mean).powi(2)).sum::<f32>() / distances.len() as f32;

        SemanticSignal {
            score: (variance / MAX_DISTANCE_VARIANCE).min(1.0),
            topic_clusters: count_topic_clusters(sample.embeddings(), self.config.topic_similarity),
            available: true,
        }
    }

    fn density(&self, document: &RawDocument) -> f32 {
        let page_count = document.page_count();
        if page_count == 0 {
            return 0.0;
        }

        let lengths: Vec<f32> = document
            .pages()
            .iter()
            .map(|p| p.char_count() as f32)
            .collect();
        let avg = lengths.iter().sum::<f32>() / page_count as f32;
        let variation = if avg > 0.0 {
            standard_deviation(&lengths) / avg
        } else {
            0.0
        };
        let elements_per_page =
            (document.table_count() + document.image_count()) as f32 / page_count as f32;

        0.4 * (avg / self.config.dense_page_chars).min(1.0)
            + 0.3 * (variation / 2.0).min(1.0)
            + 0.3 * (elements_per_page / 2.0).min(1.0)
    }

    fn confidence(
        &self,
        components: &ComponentScores,
        sampled: bool,
        semantic_available: bool,
        degraded: bool,
    ) -> f32 {
        let spread = standard_deviation(&components.as_array());
        let mut confidence = 1.0 - 2.0 * (spread - self.config.disagreement_tolerance).max(0.0);
        if sampled {
            confidence -= self.config.sampling_penalty;
        }
        if !semantic_available {
            confidence -= self.config.missing_semantic_penalty;
        }
        if degraded {
            confidence -= self.config.degraded_pattern_penalty;
        }
        confidence.clamp(0.0, 1.0)
    }
}

fn structural(document: &RawDocument, profile: &LineProfile) -> f32 {
    let page_count = document.page_count();
    if page_count == 0 {
        return 0.0;
    }
    let tables_per_page = document.table_count() as f32 / page_count as f32;

    0.4 * tables_per_page.min(1.0)
        + 0.3 * (profile.list_ratio() / 0.3).min(1.0)
        + 0.3 * (profile.heading_ratio() / 0.15).min(1.0)
}

fn visual(pages: &[Page]) -> VisualSignal {
    if pages.is_empty() {
        return VisualSignal {
            score: 0.0,
            layout: LayoutType::SingleColumn,
        };
    }

    let page_count = pages.len() as f32;
    let images = pages.iter().map(|p| p.images.len()).sum::<usize>() as f32;
    let multi_column = pages.iter().filter(|p| is_multi_column(p)).count() as f32 / page_count;
    let overlapping = pages.iter().filter(|p| has_overlapping_boxes(p)).count() as f32 / page_count;

    let layout = if overlapping > 0.3 {
        LayoutType::Complex
    } else if multi_column >= 0.5 {
        LayoutType::MultiColumn
    } else {
        LayoutType::SingleColumn
    };

    VisualSignal {
        score: 0.4 * (images / page_count).min(1.0) + 0.4 * multi_column + 0.2 * overlapping,
        layout,
    }
}

/// A page has columns when a box confined to the left half sits beside a box confined to
/// the right half.
pub(crate) fn is_multi_column(page: &Page) -> bool {
    let mid = page.width / 2.0;
    let tolerance = page.width * 0.05;
    let narrow: Vec<_> = page
        .layout
        .iter()
        .filter(|b| b.width() < page.width * 0.6)
        .collect();

    narrow.iter().filter(|b| b.x1 <= mid + tolerance).any(|left| {
        narrow
            .iter()
            .filter(|b| b.x0 >= mid - tolerance)
            .any(|right| !std::ptr::eq(*left, *right) && left.overlaps_vertically(right))
    })
}

fn has_overlapping_boxes(page: &Page) -> bool {
    let boxes = &page.layout;
    boxes.iter().enumerate().any(|(i, a)| {
        boxes[i + 1..].iter().any(|b| {
            let smaller = a.area().min(b.area());
            smaller > 0.0 && a.intersection_area(b) > 0.1 * smaller
        })
    })
}

fn special(document: &RawDocument) -> f32 {
    let text = document.full_text();
    if text.trim().is_empty() {
        return 0.0;
    }

    let formula_hits =
        text.chars().filter(|c| MATH_GLYPHS.contains(c)).count() + LATEX_COMMAND.find_iter(&text).count();
    let code_hits = CODE_LINE.find_iter(&text).count();

    0.45 * (formula_hits as f32 / 10.0).min(1.0)
        + 0.35 * script_mix(&text)
        + 0.2 * (code_hits as f32 / 5.0).min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Script {
    Latin,
    Greek,
    Cyrillic,
    Arabic,
    Hebrew,
    Devanagari,
    Cjk,
    Hangul,
    Thai,
    Other,
}

fn script_of(c: char) -> Script {
    match c as u32 {
        0x0041..=0x024F => Script::Latin,
        0x0370..=0x03FF | 0x1F00..=0x1FFF => Script::Greek,
        0x0400..=0x052F => Script::Cyrillic,
        0x0590..=0x05FF => Script::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        0x0E00..=0x0E7F => Script::Thai,
        0x3040..=0x30FF | 0x4E00..=0x9FFF | 0x3400..=0x4DBF => Script::Cjk,
        0xAC00..=0xD7AF | 0x1100..=0x11FF => Script::Hangul,
        _ => Script::Other,
    }
}

/// Share of letters outside the dominant script, saturating at 20%.
fn script_mix(text: &str) -> f32 {
    let mut counts: HashMap<Script, usize> = HashMap::new();
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        *counts.entry(script_of(c)).or_default() += 1;
    }

    let total: usize = counts.values().sum();
    if total < 20 {
        return 0.0;
    }
    let dominant = counts.values().copied().max().unwrap_or(0);
    let secondary_share = 1.0 - dominant as f32 / total as f32;
    (secondary_share / 0.2).min(1.0)
}

/// Greedy single-pass clustering: a vector joins the first cluster whose seed it
/// resembles, otherwise it seeds a new cluster.
fn count_topic_clusters(embeddings: &[Embedding], threshold: f32) -> usize {
    let mut seeds: Vec<&Embedding> = Vec::new();
    for embedding in embeddings {
        if !seeds
            .iter()
            .any(|seed| seed.cosine_similarity(embedding) >= threshold)
        {
            seeds.push(embedding);
        }
    }
    seeds.len()
}

fn standard_deviation(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32).sqrt()
}
