use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("model api error: {0}")]
    ModelApi(String),

    #[error("model returned empty response")]
    EmptyResponse,

    #[error("model response is not valid json: {0}")]
    Parse(String),

    #[error("model response violates summary schema: {0}")]
    Schema(String),
}

impl AppError {
    /// Model-output failures are retried inside the summarizer and exhaust
    /// to `None`; everything else propagates from the final attempt.
    pub fn is_model_output_failure(&self) -> bool {
        matches!(
            self,
            AppError::EmptyResponse | AppError::Parse(_) | AppError::Schema(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
