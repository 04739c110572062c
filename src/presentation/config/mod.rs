mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    CacheSettings, EmbeddingProvider, EmbeddingsSettings, GenerativeSettings, LoggingSettings,
    Settings, SettingsError, WorkerSettings,
};
