use async_trait::async_trait;

use crate::domain::{ComplexityScore, ConversionOutput, EnhancedDocument, FlowType, Tier};

/// Context handed to a converter alongside the document.
#[derive(Debug, Clone, Default)]
pub struct ConversionHints {
    pub flow_type: Option<FlowType>,
    pub section_boundaries: Vec<usize>,
    pub complexity: Option<ComplexityScore>,
    pub previous_attempt: Option<AttemptSummary>,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptSummary {
    pub tier: Tier,
    pub quality_score: Option<f32>,
}

#[async_trait]
pub trait TierConverter: Send + Sync {
    fn tier(&self) -> Tier;

    async fn convert(
        &self,
        document: &EnhancedDocument,
        hints: &ConversionHints,
    ) -> Result<ConversionOutput, ConverterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    #[error("converter unavailable: {0}")]
    Unavailable(String),
    #[error("converter produced invalid output: {0}")]
    InvalidOutput(String),
    #[error("unrecoverable conversion failure: {0}")]
    Unrecoverable(String),
}

impl ConverterError {
    /// Whether a higher tier may still succeed where this one failed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ConverterError::Unrecoverable(_))
    }
}
