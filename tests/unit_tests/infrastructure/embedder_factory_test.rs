use docroute::infrastructure::llm::{EmbedderFactory, EmbedderFactoryError};
use docroute::presentation::config::{EmbeddingProvider, EmbeddingsSettings};

#[test]
fn given_hashing_provider_when_creating_then_succeeds() {
    let embedder = EmbedderFactory::from_settings(&EmbeddingsSettings::default());

    assert!(embedder.is_ok());
}

#[test]
fn given_openai_provider_without_key_when_creating_then_returns_missing_key() {
    let embedder = EmbedderFactory::create(
        EmbeddingProvider::OpenAi,
        "text-embedding-3-small".to_string(),
        None,
    );

    assert!(matches!(embedder, Err(EmbedderFactoryError::MissingApiKey)));
}

#[test]
fn given_openai_provider_with_blank_key_when_creating_then_returns_missing_key() {
    let embedder = EmbedderFactory::create(
        EmbeddingProvider::OpenAi,
        "text-embedding-3-small".to_string(),
        Some(String::new()),
    );

    assert!(matches!(embedder, Err(EmbedderFactoryError::MissingApiKey)));
}

#[test]
fn given_openai_provider_with_key_when_creating_then_succeeds() {
    let embedder = EmbedderFactory::create(
        EmbeddingProvider::OpenAi,
        "text-embedding-3-small".to_string(),
        Some("sk-test".to_string()),
    );

    assert!(embedder.is_ok());
}

#[test]
fn given_zero_dimension_when_creating_hashing_embedder_then_rejects_configuration() {
    let settings = EmbeddingsSettings {
        dimension: 0,
        ..EmbeddingsSettings::default()
    };

    let embedder = EmbedderFactory::from_settings(&settings);

    assert!(matches!(
        embedder,
        Err(EmbedderFactoryError::InvalidConfiguration(_))
    ));
}
