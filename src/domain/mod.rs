mod complexity;
mod conversion;
mod document;
mod document_id;
mod embedding;
mod enhanced_document;
mod fingerprint;
mod line;
mod pattern;
mod pipeline_state;
mod tier;

pub use complexity::{
    ComplexityMetrics, ComplexityScore, ComplexityWeights, ComponentScores, LayoutType,
};
pub use conversion::{
    CacheEntry, ConversionOutput, ConversionResult, IssueKind, PipelineWarning,
};
pub use document::{DocumentKind, DocumentSource, ImageRef, LayoutBox, Page, RawDocument, Table};
pub use document_id::DocumentId;
pub use embedding::Embedding;
pub use enhanced_document::{
    EnhancedDocument, Reconstruction, ReconstructionDelta, ReconstructionStrategy,
};
pub use fingerprint::{BucketId, SemanticFingerprint};
pub use line::{
    LineKind, LineProfile, bullet_glyph, classify_line, ends_with_terminal_punctuation,
    is_wrapped_continuation, starts_lowercase,
};
pub use pattern::{DocumentPattern, FlowType, FormattingCues, MarkerKind};
pub use pipeline_state::{PipelineState, StateTrail};
pub use tier::Tier;
