use docroute::application::ports::{Embedder, EmbedderError};
use docroute::infrastructure::llm::HashingEmbedder;

use crate::helpers::{ASTRONOMY, COOKING};

#[tokio::test]
async fn given_same_text_when_embedding_twice_then_vectors_are_identical() {
    let embedder = HashingEmbedder::default();

    let a = embedder.embed(ASTRONOMY).await.unwrap();
    let b = HashingEmbedder::default().embed(ASTRONOMY).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(a.dimensions(), HashingEmbedder::DEFAULT_DIMENSION);
    assert!((a.magnitude() - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn given_related_and_unrelated_texts_when_embedding_then_similarity_tracks_vocabulary() {
    let embedder = HashingEmbedder::default();

    let stars = embedder.embed(ASTRONOMY).await.unwrap();
    let more_stars = embedder
        .embed("Astronomers measure redshift across distant galaxies.")
        .await
        .unwrap();
    let food = embedder.embed(COOKING).await.unwrap();

    assert!(stars.cosine_similarity(&more_stars) > stars.cosine_similarity(&food));
    assert!(stars.cosine_similarity(&food) < 0.4);
}

#[tokio::test]
async fn given_text_without_words_when_embedding_then_returns_empty_input() {
    let outcome = HashingEmbedder::default().embed("  ... !!! ").await;

    assert!(matches!(outcome, Err(EmbedderError::EmptyInput)));
}

#[tokio::test]
async fn given_batch_when_embedding_then_returns_one_vector_per_text() {
    let embedder = HashingEmbedder::new(64).with_seed(7);

    let vectors = embedder.embed_batch(&[ASTRONOMY, COOKING]).await.unwrap();

    assert_eq!(vectors.len(), 2);
    assert!(vectors.iter().all(|v| v.dimensions() == 64));
}
