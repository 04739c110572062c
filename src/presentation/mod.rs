pub mod config;
pub mod state;

pub use config::{EmbeddingProvider, Environment, Settings, SettingsError};
pub use state::{AppState, BootstrapError};
