use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityWeights {
    pub structural: f32,
    pub semantic: f32,
    pub visual: f32,
    pub density: f32,
    pub special: f32,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            structural: 0.25,
            semantic: 0.30,
            visual: 0.25,
            density: 0.10,
            special: 0.10,
        }
    }
}

impl ComplexityWeights {
    pub const SUM_TOLERANCE: f32 = 0.01;

    pub fn sum(&self) -> f32 {
        self.structural + self.semantic + self.visual + self.density + self.special
    }

    pub fn is_valid(&self) -> bool {
        let all_non_negative = [
            self.structural,
            self.semantic,
            self.visual,
            self.density,
            self.special,
        ]
        .iter()
        .all(|w| *w >= 0.0);
        all_non_negative && (self.sum() - 1.0).abs() <= Self::SUM_TOLERANCE
    }
}

/// Per-axis signals, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ComponentScores {
    pub structural: f32,
    pub semantic: f32,
    pub visual: f32,
    pub density: f32,
    pub special: f32,
}

impl ComponentScores {
    pub fn as_array(&self) -> [f32; 5] {
        [
            self.structural,
            self.semantic,
            self.visual,
            self.density,
            self.special,
        ]
    }

    fn clamped(self) -> Self {
        Self {
            structural: self.structural.clamp(0.0, 1.0),
            semantic: self.semantic.clamp(0.0, 1.0),
            visual: self.visual.clamp(0.0, 1.0),
            density: self.density.clamp(0.0, 1.0),
            special: self.special.clamp(0.0, 1.0),
        }
    }

    pub fn weighted(&self, weights: &ComplexityWeights) -> f32 {
        self.structural * weights.structural
            + self.semantic * weights.semantic
            + self.visual * weights.visual
            + self.density * weights.density
            + self.special * weights.special
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    #[default]
    SingleColumn,
    MultiColumn,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComplexityMetrics {
    pub page_count: usize,
    pub table_count: usize,
    pub image_count: usize,
    pub avg_chars_per_page: f32,
    pub topic_clusters: usize,
    pub section_count: usize,
    pub layout: LayoutType,
    pub sampled: bool,
    pub semantic_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityScore {
    components: ComponentScores,
    overall: f32,
    confidence: f32,
    metrics: ComplexityMetrics,
}

impl ComplexityScore {
    pub fn new(
        components: ComponentScores,
        weights: &ComplexityWeights,
        confidence: f32,
        metrics: ComplexityMetrics,
    ) -> Self {
        let components = components.clamped();
        Self {
            overall: components.weighted(weights).clamp(0.0, 1.0),
            components,
            confidence: confidence.clamp(0.0, 1.0),
            metrics,
        }
    }

    pub fn components(&self) -> &ComponentScores {
        &self.components
    }

    pub fn structural(&self) -> f32 {
        self.components.structural
    }

    pub fn semantic(&self) -> f32 {
        self.components.semantic
    }

    pub fn visual(&self) -> f32 {
        self.components.visual
    }

    pub fn density(&self) -> f32 {
        self.components.density
    }

    pub fn special(&self) -> f32 {
        self.components.special
    }

    pub fn overall(&self) -> f32 {
        self.overall
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn metrics(&self) -> &ComplexityMetrics {
        &self.metrics
    }
}
