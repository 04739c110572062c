mod composite_parser;
mod plain_text_parser;
mod text_sanitizer;

pub use composite_parser::CompositeParser;
pub use plain_text_parser::PlainTextParser;
pub use text_sanitizer::sanitize_extracted_text;
