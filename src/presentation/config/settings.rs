use std::time::Duration;

use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::application::services::{
    ComplexityAnalyzerConfig, FingerprintCacheConfig, LshConfig, MAX_TABLES,
    PatternDetectorConfig, RoutingThresholds, SamplingConfig, TierCostModel, TierDeadlines,
};

use super::Environment;

pub const ENV_PREFIX: &str = "DOCROUTE";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip)]
    pub environment: Environment,
    pub logging: LoggingSettings,
    pub embeddings: EmbeddingsSettings,
    pub sampling: SamplingConfig,
    pub pattern: PatternDetectorConfig,
    pub complexity: ComplexityAnalyzerConfig,
    pub routing: RoutingThresholds,
    pub costs: TierCostModel,
    pub cache: CacheSettings,
    pub deadlines: TierDeadlines,
    pub workers: WorkerSettings,
    pub generative: GenerativeSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingsSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingsSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            model: "text-embedding-3-small".to_string(),
            dimension: 384,
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Hashing,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl_secs: u64,
    pub similarity_threshold: f32,
    pub lsh_bits: u32,
    pub lsh_tables: usize,
    pub lsh_seed: u64,
    pub max_candidates: usize,
    pub backend_timeout_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let fingerprint = FingerprintCacheConfig::default();
        Self {
            enabled: true,
            capacity: 10_000,
            ttl_secs: 24 * 60 * 60,
            similarity_threshold: fingerprint.similarity_threshold,
            lsh_bits: fingerprint.lsh.bits,
            lsh_tables: fingerprint.lsh.tables,
            lsh_seed: fingerprint.lsh.seed,
            max_candidates: fingerprint.lsh.max_candidates,
            backend_timeout_ms: fingerprint.backend_timeout_ms,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn fingerprint_config(&self) -> FingerprintCacheConfig {
        FingerprintCacheConfig {
            similarity_threshold: self.similarity_threshold,
            backend_timeout_ms: self.backend_timeout_ms,
            lsh: LshConfig {
                bits: self.lsh_bits,
                tables: self.lsh_tables,
                seed: self.lsh_seed,
                max_candidates: self.max_candidates,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub pool_size: usize,
    pub queue_depth: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            pool_size: 4,
            queue_depth: 64,
        }
    }
}

/// Chat-completions endpoint for the generative tier. Disabled by default so the
/// binary runs offline; without it the generative tier falls back to layout-aware.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerativeSettings {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_prompt_tokens: usize,
}

impl Default for GenerativeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:1234".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_prompt_tokens: 6000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid APP_ENVIRONMENT: {0}")]
    Environment(String),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Settings {
    /// Defaults, then `config/docroute.<environment>.toml` if present, then `DOCROUTE__*`
    /// environment variables. `.env` is read first.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(SettingsError::Environment)?;

        let configuration = Config::builder()
            .add_source(
                File::with_name(&format!("config/docroute.{}", environment.file_stem()))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Self = configuration.try_deserialize()?;
        settings.environment = environment;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, SettingsError> {
        let settings: Self = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let weights = &self.complexity.weights;
        if !weights.is_valid() {
            return Err(invalid(
                "complexity.weights",
                format!("weights must sum to 1.0, got {:.3}", weights.sum()),
            ));
        }

        let routing = &self.routing;
        let unit_interval = [
            ("routing.layout_aware_at", routing.layout_aware_at),
            ("routing.generative_at", routing.generative_at),
            ("routing.min_confidence", routing.min_confidence),
            ("routing.acceptance_quality", routing.acceptance_quality),
            ("routing.visual_high", routing.visual_high),
            ("routing.semantic_low", routing.semantic_low),
            ("cache.similarity_threshold", self.cache.similarity_threshold),
            ("pattern.boundary_threshold", self.pattern.boundary_threshold),
        ];
        if let Some((key, value)) = unit_interval
            .into_iter()
            .find(|(_, v)| !(0.0..=1.0).contains(v))
        {
            return Err(invalid(key, format!("{value} is outside [0, 1]")));
        }

        if routing.layout_aware_at >= routing.generative_at {
            return Err(invalid(
                "routing.layout_aware_at",
                format!(
                    "must be below routing.generative_at ({} >= {})",
                    routing.layout_aware_at, routing.generative_at
                ),
            ));
        }
        if self.workers.pool_size == 0 {
            return Err(invalid("workers.pool_size", "must be at least 1".to_string()));
        }
        if self.workers.queue_depth == 0 {
            return Err(invalid("workers.queue_depth", "must be at least 1".to_string()));
        }
        if !(1..=64).contains(&self.cache.lsh_bits) {
            return Err(invalid(
                "cache.lsh_bits",
                format!("{} is outside 1..=64", self.cache.lsh_bits),
            ));
        }
        if !(1..=MAX_TABLES).contains(&self.cache.lsh_tables) {
            return Err(invalid(
                "cache.lsh_tables",
                format!("{} is outside 1..={MAX_TABLES}", self.cache.lsh_tables),
            ));
        }
        if self.embeddings.dimension == 0 {
            return Err(invalid("embeddings.dimension", "must be positive".to_string()));
        }
        if self.sampling.max_windows == 0 || self.sampling.window_chars == 0 {
            return Err(invalid("sampling", "window count and size must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { key, reason }
}
