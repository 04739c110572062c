use std::sync::Arc;

use serde::Deserialize;

use crate::application::ports::Embedder;
use crate::domain::{DocumentPattern, FlowType, LineProfile, RawDocument};

use super::sampling::{EmbeddedSample, SamplingConfig, sample_windows};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PatternDetectorConfig {
    /// Consecutive-window similarity below this marks a section boundary.
    pub boundary_threshold: f32,
    pub structured_density: f32,
    pub flowing_density: f32,
}

impl Default for PatternDetectorConfig {
    fn default() -> Self {
        Self {
            boundary_threshold: 0.7,
            structured_density: 0.4,
            flowing_density: 0.1,
        }
    }
}

/// Detected pattern plus the embedded sample it was computed from, so later stages can
/// reuse the vectors instead of calling the provider again.
#[derive(Debug, Clone)]
pub struct PatternReport {
    pub pattern: DocumentPattern,
    pub sample: Option<EmbeddedSample>,
}

pub struct PatternDetector {
    embedder: Arc<dyn Embedder>,
    config: PatternDetectorConfig,
    sampling: SamplingConfig,
}

impl PatternDetector {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        config: PatternDetectorConfig,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            embedder,
            config,
            sampling,
        }
    }

    pub async fn detect(&self, document: &RawDocument) -> PatternReport {
        if document.is_empty() {
            return PatternReport {
                pattern: DocumentPattern::empty(),
                sample: None,
            };
        }

        let profile = LineProfile::from_pages(document.pages());
        let density = profile.marker_density();
        let flow_type = self.classify_flow(density);
        let flow_confidence = self.flow_confidence(flow_type, density);

        let windows = sample_windows(document, &self.sampling);
        let (boundaries, sample, degraded) =
            match EmbeddedSample::embed(windows, self.embedder.as_ref()).await {
                Ok(sample) => (self.semantic_boundaries(&sample), Some(sample), false),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        document_id = %document.id(),
                        "Embedding provider unavailable, falling back to marker density only"
                    );
                    (Vec::new(), None, true)
                }
            };

        let pattern = DocumentPattern::new(
            flow_type,
            profile.markers(),
            boundaries,
            profile.formatting_cues(),
            document.page_count(),
        )
        .with_flow_confidence(flow_confidence);

        tracing::debug!(
            flow_type = %flow_type,
            marker_density = density,
            boundaries = ?pattern.section_boundaries(),
            degraded,
            "Pattern detected"
        );

        PatternReport {
            pattern: if degraded { pattern.degraded() } else { pattern },
            sample,
        }
    }

    pub fn classify_flow(&self, marker_density: f32) -> FlowType {
        if marker_density >= self.config.structured_density {
            FlowType::Structured
        } else if marker_density <= self.config.flowing_density {
            FlowType::Flowing
        } else {
            FlowType::Mixed
        }
    }

    /// How far the density sits inside its band, mapped to `[0.6, 1.0]`.
    fn flow_confidence(&self, flow_type: FlowType, density: f32) -> f32 {
        let upper = self.config.structured_density;
        let lower = self.config.flowing_density;
        let clarity = match flow_type {
            FlowType::Structured => ((density - upper) / 0.3).min(1.0),
            FlowType::Flowing if lower > 0.0 => (lower - density) / lower,
            FlowType::Flowing => 1.0,
            FlowType::Mixed => {
                let half_band = ((upper - lower) / 2.0).max(f32::EPSILON);
                ((density - lower).min(upper - density) / half_band).min(1.0)
            }
        };
        0.6 + 0.4 * clarity.clamp(0.0, 1.0)
    }

    fn semantic_boundaries(&self, sample: &EmbeddedSample) -> Vec<usize> {
        sample
            .consecutive_similarities()
            .iter()
            .enumerate()
            .filter(|(_, similarity)| **similarity < self.config.boundary_threshold)
            .map(|(i, _)| sample.windows()[i + 1].page_index)
            .collect()
    }
}
