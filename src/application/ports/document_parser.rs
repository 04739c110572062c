use async_trait::async_trait;

use crate::domain::{DocumentSource, RawDocument};

#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(
        &self,
        data: &[u8],
        source: &DocumentSource,
    ) -> Result<RawDocument, ParserError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("no text found in {0}")]
    NoTextFound(String),
}
