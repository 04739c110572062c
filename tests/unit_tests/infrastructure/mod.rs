mod embedder_factory_test;
mod generative_converter_test;
mod hashing_embedder_test;
mod in_memory_result_cache_test;
mod layout_aware_converter_test;
mod plain_text_parser_test;
