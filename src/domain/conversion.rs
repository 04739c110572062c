use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::fingerprint::SemanticFingerprint;
use super::tier::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DegradedSignal,
    RecoverableUnavailable,
    QualityBelowThreshold,
    Timeout,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::DegradedSignal => "degraded_signal",
            IssueKind::RecoverableUnavailable => "recoverable_unavailable",
            IssueKind::QualityBelowThreshold => "quality_below_threshold",
            IssueKind::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineWarning {
    pub kind: IssueKind,
    pub detail: String,
}

impl PipelineWarning {
    pub fn new(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

/// What a tier converter hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    pub text: String,
    pub quality_score: f32,
    pub warnings: Vec<String>,
}

/// What the consumer of the pipeline receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub text: String,
    pub tier_used: Tier,
    pub quality_score: f32,
    pub cached: bool,
    pub warnings: Vec<PipelineWarning>,
}

impl ConversionResult {
    pub fn from_output(tier: Tier, output: ConversionOutput) -> Self {
        Self {
            text: output.text,
            tier_used: tier,
            quality_score: output.quality_score.clamp(0.0, 1.0),
            cached: false,
            warnings: output
                .warnings
                .into_iter()
                .map(|w| PipelineWarning::new(IssueKind::DegradedSignal, w))
                .collect(),
        }
    }

    pub fn as_cached(&self) -> Self {
        Self {
            cached: true,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: SemanticFingerprint,
    pub result: ConversionResult,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(fingerprint: SemanticFingerprint, result: ConversionResult, ttl: Duration) -> Self {
        Self {
            fingerprint,
            result,
            created_at: Utc::now(),
            ttl,
        }
    }
}
