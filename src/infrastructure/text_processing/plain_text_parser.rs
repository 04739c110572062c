use async_trait::async_trait;

use crate::application::ports::{DocumentParser, ParserError};
use crate::domain::{DocumentKind, DocumentSource, Page, RawDocument};

use super::text_sanitizer::sanitize_extracted_text;

const PAGE_BREAK: char = '\u{000C}';

/// UTF-8 text and markdown. Form feeds separate pages.
pub struct PlainTextParser;

#[async_trait]
impl DocumentParser for PlainTextParser {
    #[tracing::instrument(skip(self, data), fields(filename = %source.filename, bytes = data.len()))]
    async fn parse(
        &self,
        data: &[u8],
        source: &DocumentSource,
    ) -> Result<RawDocument, ParserError> {
        match source.kind() {
            Some(DocumentKind::PlainText | DocumentKind::Markup) => {}
            _ => return Err(ParserError::UnsupportedType(source.declared_type.clone())),
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| ParserError::ExtractionFailed(format!("invalid UTF-8: {e}")))?;

        let mut pages: Vec<Page> = text
            .split(PAGE_BREAK)
            .map(sanitize_extracted_text)
            .map(Page::from_text)
            .collect();
        while pages.last().is_some_and(|p| p.text.is_empty()) {
            pages.pop();
        }

        if pages.iter().all(|p| p.text.is_empty()) {
            return Err(ParserError::NoTextFound(source.filename.clone()));
        }

        tracing::debug!(pages = pages.len(), "Parsed plain text document");
        Ok(RawDocument::new(source.filename.clone(), pages))
    }
}
