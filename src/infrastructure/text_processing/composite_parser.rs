use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{DocumentParser, ParserError};
use crate::domain::{DocumentKind, DocumentSource, RawDocument};

/// Routes each document to the parser registered for its kind.
pub struct CompositeParser {
    parsers: HashMap<DocumentKind, Arc<dyn DocumentParser>>,
}

impl CompositeParser {
    pub fn new(parsers: Vec<(DocumentKind, Arc<dyn DocumentParser>)>) -> Self {
        Self {
            parsers: parsers.into_iter().collect(),
        }
    }

    pub fn supports(&self, kind: DocumentKind) -> bool {
        self.parsers.contains_key(&kind)
    }
}

#[async_trait]
impl DocumentParser for CompositeParser {
    async fn parse(
        &self,
        data: &[u8],
        source: &DocumentSource,
    ) -> Result<RawDocument, ParserError> {
        let parser = source
            .kind()
            .and_then(|kind| self.parsers.get(&kind))
            .ok_or_else(|| ParserError::UnsupportedType(source.declared_type.clone()))?;

        parser.parse(data, source).await
    }
}
