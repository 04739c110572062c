use std::sync::Arc;

use crate::application::ports::Embedder;
use crate::presentation::config::{EmbeddingProvider, EmbeddingsSettings};

use super::{HashingEmbedder, OpenAiEmbedder};

pub struct EmbedderFactory;

#[derive(Debug, thiserror::Error)]
pub enum EmbedderFactoryError {
    #[error("missing API key: OpenAI embedder requires DOCROUTE__EMBEDDINGS__API_KEY")]
    MissingApiKey,
    #[error("invalid embedder configuration: {0}")]
    InvalidConfiguration(String),
}

impl EmbedderFactory {
    pub fn create(
        provider: EmbeddingProvider,
        model: String,
        api_key: Option<String>,
    ) -> Result<Arc<dyn Embedder>, EmbedderFactoryError> {
        Self::from_settings(&EmbeddingsSettings {
            provider,
            model,
            api_key,
            ..EmbeddingsSettings::default()
        })
    }

    pub fn from_settings(
        settings: &EmbeddingsSettings,
    ) -> Result<Arc<dyn Embedder>, EmbedderFactoryError> {
        match settings.provider {
            EmbeddingProvider::Hashing => {
                if settings.dimension == 0 {
                    return Err(EmbedderFactoryError::InvalidConfiguration(
                        "hashing embedder dimension must be positive".to_string(),
                    ));
                }
                tracing::info!(dimension = settings.dimension, "Using hashing embedder");
                Ok(Arc::new(HashingEmbedder::new(settings.dimension)))
            }
            EmbeddingProvider::OpenAi => {
                let key = settings
                    .api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .ok_or(EmbedderFactoryError::MissingApiKey)?;
                tracing::info!(
                    model = %settings.model,
                    base_url = %settings.base_url,
                    "Using OpenAI-compatible embedding model"
                );
                Ok(Arc::new(OpenAiEmbedder::with_base_url(
                    &settings.base_url,
                    key,
                    settings.model.clone(),
                )))
            }
        }
    }
}
