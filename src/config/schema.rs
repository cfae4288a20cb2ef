use std::path::PathBuf;

/// Process-wide configuration, constructed once at startup from the
/// environment and passed by reference into each component. Business logic
/// never reads the environment directly.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub store: StoreConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub max_retries: u32,
    pub requests_per_minute: u32,
    pub api_timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash-exp".to_owned(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            max_retries: 5,
            requests_per_minute: 60,
            api_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("callsum.sqlite3"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pause between consecutive items, to pace the external APIs.
    pub delay_seconds: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { delay_seconds: 5 }
    }
}
