use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Structured,
    Flowing,
    Mixed,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Structured => "structured",
            FlowType::Flowing => "flowing",
            FlowType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Bullet,
    Numbered,
    Heading,
    SectionLabel,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FormattingCues {
    pub avg_line_length: f32,
    pub marker_density: f32,
    pub indented_line_ratio: f32,
    pub blank_line_ratio: f32,
    pub list_glyphs: BTreeSet<char>,
}

/// Organization of a document as seen by the pattern detector.
///
/// Built once per pipeline run and only read afterwards. Section boundaries are page
/// indices, strictly increasing and below the page count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPattern {
    flow_type: FlowType,
    paragraph_markers: BTreeSet<MarkerKind>,
    section_boundaries: Vec<usize>,
    formatting_cues: FormattingCues,
    flow_confidence: f32,
    degraded: bool,
}

impl DocumentPattern {
    pub fn new(
        flow_type: FlowType,
        paragraph_markers: BTreeSet<MarkerKind>,
        mut section_boundaries: Vec<usize>,
        formatting_cues: FormattingCues,
        page_count: usize,
    ) -> Self {
        section_boundaries.retain(|page| *page < page_count);
        section_boundaries.sort_unstable();
        section_boundaries.dedup();

        Self {
            flow_type,
            paragraph_markers,
            section_boundaries,
            formatting_cues,
            flow_confidence: 1.0,
            degraded: false,
        }
    }

    /// Pattern for a document with no pages.
    pub fn empty() -> Self {
        Self::new(
            FlowType::Flowing,
            BTreeSet::new(),
            Vec::new(),
            FormattingCues::default(),
            0,
        )
    }

    pub fn with_flow_confidence(mut self, confidence: f32) -> Self {
        self.flow_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow_type
    }

    pub fn paragraph_markers(&self) -> &BTreeSet<MarkerKind> {
        &self.paragraph_markers
    }

    pub fn section_boundaries(&self) -> &[usize] {
        &self.section_boundaries
    }

    pub fn formatting_cues(&self) -> &FormattingCues {
        &self.formatting_cues
    }

    pub fn flow_confidence(&self) -> f32 {
        self.flow_confidence
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn is_section_start(&self, page: usize) -> bool {
        self.section_boundaries.binary_search(&page).is_ok()
    }

    /// True when any boundary falls in `(after, up_to]`.
    pub fn has_boundary_between(&self, after: usize, up_to: usize) -> bool {
        self.section_boundaries
            .iter()
            .any(|page| *page > after && *page <= up_to)
    }
}
