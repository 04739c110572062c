mod document_parser;
mod embedder;
mod result_cache;
mod tier_converter;

pub use document_parser::{DocumentParser, ParserError};
pub use embedder::{Embedder, EmbedderError};
pub use result_cache::{CacheError, CacheHit, CacheLease, CacheQuery, CacheStats, ResultCache};
pub use tier_converter::{AttemptSummary, ConversionHints, ConverterError, TierConverter};
