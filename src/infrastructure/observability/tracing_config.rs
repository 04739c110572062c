/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Settings values, with `LOG_FORMAT=json` forcing JSON output.
    pub fn new(environment: impl Into<String>, json_format: bool, filter: Option<String>) -> Self {
        let forced_json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self {
            environment: environment.into(),
            json_format: json_format || forced_json,
            filter,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new(
            std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
            false,
            None,
        )
    }
}
