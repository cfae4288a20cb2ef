use std::path::PathBuf;

use crate::config::schema::AppConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db_path: Option<PathBuf>,
    pub model: Option<String>,
    pub max_retries: Option<u32>,
    pub batch_delay_seconds: Option<u64>,
}

pub fn load_config(overrides: &CliOverrides) -> AppResult<AppConfig> {
    let mut config = AppConfig::default();

    apply_env_overrides(&mut config);
    apply_cli_overrides(&mut config, overrides);

    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(value) = env_var("CALLSUM_API_KEY").or_else(|| env_var("GEMINI_API_KEY")) {
        config.model.api_key = value;
    }
    if let Some(value) = env_var("CALLSUM_MODEL") {
        config.model.model = value;
    }
    if let Some(value) = env_var("CALLSUM_API_BASE") {
        config.model.api_base = value;
    }
    if let Some(value) = env_var("CALLSUM_MAX_RETRIES") {
        if let Ok(parsed) = value.parse::<u32>() {
            config.model.max_retries = parsed;
        }
    }
    if let Some(value) = env_var("CALLSUM_REQUESTS_PER_MINUTE") {
        if let Ok(parsed) = value.parse::<u32>() {
            config.model.requests_per_minute = parsed;
        }
    }
    if let Some(value) = env_var("CALLSUM_API_TIMEOUT_SECONDS") {
        if let Ok(parsed) = value.parse::<u64>() {
            config.model.api_timeout_seconds = parsed;
        }
    }
    if let Some(value) = env_var("CALLSUM_DB_PATH") {
        config.store.db_path = PathBuf::from(value);
    }
    if let Some(value) = env_var("CALLSUM_BATCH_DELAY_SECONDS") {
        if let Ok(parsed) = value.parse::<u64>() {
            config.batch.delay_seconds = parsed;
        }
    }
}

fn apply_cli_overrides(config: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(value) = &overrides.db_path {
        config.store.db_path = value.clone();
    }
    if let Some(value) = &overrides.model {
        config.model.model = value.clone();
    }
    if let Some(value) = overrides.max_retries {
        config.model.max_retries = value;
    }
    if let Some(value) = overrides.batch_delay_seconds {
        config.batch.delay_seconds = value;
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn validate(config: &AppConfig) -> AppResult<()> {
    if config.model.api_key.trim().is_empty() {
        return Err(AppError::Config(
            "model api key is required (CALLSUM_API_KEY or GEMINI_API_KEY)".to_owned(),
        ));
    }
    if config.model.model.trim().is_empty() {
        return Err(AppError::Config("model identifier must not be empty".to_owned()));
    }
    if config.model.max_retries == 0 {
        return Err(AppError::Config("max_retries must be > 0".to_owned()));
    }
    if config.model.requests_per_minute == 0 {
        return Err(AppError::Config("requests_per_minute must be > 0".to_owned()));
    }
    if config.store.db_path.as_os_str().is_empty() {
        return Err(AppError::Config("store db path must not be empty".to_owned()));
    }
    Ok(())
}
