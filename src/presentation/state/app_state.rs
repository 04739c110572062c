use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::application::ports::{DocumentParser, Embedder, TierConverter};
use crate::application::services::{
    ComplexityAnalyzer, FingerprintCache, Orchestrator, PatternDetector, TierRouter,
    WorkerHandle, spawn_worker_pool,
};
use crate::domain::DocumentKind;
use crate::infrastructure::cache::InMemoryResultCache;
use crate::infrastructure::converters::{
    LayoutAwareConverter, OpenAiGenerativeConverter, RuleBasedConverter,
};
use crate::infrastructure::llm::{EmbedderFactory, EmbedderFactoryError};
use crate::infrastructure::text_processing::{CompositeParser, PlainTextParser};
use crate::presentation::config::Settings;

/// Everything a front end needs to run documents through the pipeline.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub parser: Arc<dyn DocumentParser>,
    pub settings: Settings,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Embedder(#[from] EmbedderFactoryError),
}

impl AppState {
    pub fn from_settings(settings: Settings) -> Result<Self, BootstrapError> {
        let embedder = EmbedderFactory::from_settings(&settings.embeddings)?;
        Ok(Self::with_embedder(settings, embedder))
    }

    /// Wires the pipeline around an already constructed embedder.
    pub fn with_embedder(settings: Settings, embedder: Arc<dyn Embedder>) -> Self {
        let detector = PatternDetector::new(
            Arc::clone(&embedder),
            settings.pattern,
            settings.sampling,
        );
        let analyzer = ComplexityAnalyzer::new(settings.complexity);
        let router = Arc::new(TierRouter::new(settings.routing, settings.costs));

        let mut converters: Vec<Arc<dyn TierConverter>> = vec![
            Arc::new(RuleBasedConverter),
            Arc::new(LayoutAwareConverter),
        ];
        let generative = &settings.generative;
        if generative.enabled {
            tracing::info!(
                base_url = %generative.base_url,
                model = %generative.model,
                "Generative tier enabled"
            );
            converters.push(Arc::new(OpenAiGenerativeConverter::new(
                &generative.base_url,
                &generative.model,
                generative.api_key.as_deref().unwrap_or_default(),
                generative.max_prompt_tokens,
            )));
        } else {
            tracing::info!("Generative tier disabled, falling back to layout-aware conversion");
        }

        let mut orchestrator =
            Orchestrator::new(detector, analyzer, router, converters, settings.deadlines);

        if settings.cache.enabled {
            let store = Arc::new(InMemoryResultCache::new(
                settings.cache.capacity,
                settings.cache.ttl(),
            ));
            orchestrator = orchestrator.with_cache(Arc::new(FingerprintCache::new(
                embedder,
                store,
                settings.sampling,
                settings.cache.fingerprint_config(),
            )));
        }

        let plain_text: Arc<dyn DocumentParser> = Arc::new(PlainTextParser);
        let parser = Arc::new(CompositeParser::new(vec![
            (DocumentKind::PlainText, Arc::clone(&plain_text)),
            (DocumentKind::Markup, plain_text),
        ]));

        Self {
            orchestrator: Arc::new(orchestrator),
            parser,
            settings,
        }
    }

    pub fn spawn_workers(&self) -> (WorkerHandle, JoinHandle<()>) {
        spawn_worker_pool(
            Arc::clone(&self.orchestrator),
            self.settings.workers.pool_size,
            self.settings.workers.queue_depth,
        )
    }
}
