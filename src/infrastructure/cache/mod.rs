mod in_memory_result_cache;

pub use in_memory_result_cache::{InMemoryResultCache, MAX_BUCKET_ENTRIES};
