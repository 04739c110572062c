pub mod cache;
pub mod converters;
pub mod llm;
pub mod observability;
pub mod text_processing;
