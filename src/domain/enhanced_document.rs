use std::fmt;

use serde::Serialize;

use super::document::RawDocument;
use super::pattern::{DocumentPattern, FlowType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionStrategy {
    PreserveStructure,
    ParagraphFlow,
    Hybrid,
}

impl ReconstructionStrategy {
    pub fn for_flow(flow_type: FlowType) -> Self {
        match flow_type {
            FlowType::Structured => Self::PreserveStructure,
            FlowType::Flowing => Self::ParagraphFlow,
            FlowType::Mixed => Self::Hybrid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreserveStructure => "preserve_structure",
            Self::ParagraphFlow => "paragraph_flow",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ReconstructionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReconstructionDelta {
    pub lines_in: usize,
    pub lines_out: usize,
    pub merged_lines: usize,
    pub page_joins: usize,
}

impl ReconstructionDelta {
    pub fn is_noop(&self) -> bool {
        self.merged_lines == 0 && self.lines_in == self.lines_out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconstruction {
    pub pages: Vec<String>,
    pub text: String,
    pub strategy: ReconstructionStrategy,
    pub confidence: f32,
    pub delta: ReconstructionDelta,
}

/// Raw document plus everything the early pipeline stages learned about it.
#[derive(Debug, Clone)]
pub struct EnhancedDocument {
    pub raw: RawDocument,
    pub pattern: DocumentPattern,
    pub reconstruction: Reconstruction,
}

impl EnhancedDocument {
    pub fn new(raw: RawDocument, pattern: DocumentPattern, reconstruction: Reconstruction) -> Self {
        Self {
            raw,
            pattern,
            reconstruction,
        }
    }

    pub fn text(&self) -> &str {
        &self.reconstruction.text
    }

    pub fn page_texts(&self) -> &[String] {
        &self.reconstruction.pages
    }
}
