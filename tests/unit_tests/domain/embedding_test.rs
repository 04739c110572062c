use docroute::domain::Embedding;

#[test]
fn given_embedding_when_checking_dimensions_then_returns_correct_size() {
    let embedding = Embedding::new(vec![0.1, 0.2, 0.3]);
    assert_eq!(embedding.dimensions(), 3);
}

#[test]
fn given_identical_vectors_when_computing_similarity_then_returns_one() {
    let a = Embedding::new(vec![1.0, 0.0, 0.0]);
    let b = Embedding::new(vec![1.0, 0.0, 0.0]);

    assert!((a.cosine_similarity(&b) - 1.0).abs() < 0.001);
    assert!(a.cosine_distance(&b) < 0.001);
}

#[test]
fn given_opposite_vectors_when_computing_distance_then_clamps_to_one() {
    let a = Embedding::new(vec![1.0, 0.0]);
    let b = Embedding::new(vec![-1.0, 0.0]);

    assert_eq!(a.cosine_distance(&b), 1.0);
}

#[test]
fn given_mismatched_dimensions_when_computing_similarity_then_returns_zero() {
    let a = Embedding::new(vec![1.0, 0.0]);
    let b = Embedding::new(vec![1.0, 0.0, 0.0]);

    assert_eq!(a.cosine_similarity(&b), 0.0);
}

#[test]
fn given_vector_when_normalizing_then_magnitude_is_one() {
    let normalized = Embedding::new(vec![3.0, 4.0]).normalized();
    assert!((normalized.magnitude() - 1.0).abs() < 1e-6);
    assert!(Embedding::new(vec![0.0, 0.0]).normalized().is_zero());
}

#[test]
fn given_vectors_when_averaging_then_returns_componentwise_mean() {
    let mean = Embedding::mean(&[
        Embedding::new(vec![1.0, 0.0]),
        Embedding::new(vec![0.0, 1.0]),
    ])
    .unwrap();

    assert_eq!(mean.values, vec![0.5, 0.5]);
    assert!(Embedding::mean(&[]).is_none());
}
