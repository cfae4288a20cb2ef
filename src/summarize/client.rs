use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// Text-in/text-out boundary to the generative model. The summarizer is
/// generic over this so tests can script replies.
pub trait ModelApi {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> AppResult<String>;
}

/// Production client for the Gemini `generateContent` REST endpoint.
pub struct GeminiHttp {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl GeminiHttp {
    pub fn new(config: &ModelConfig) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_global(Some(Duration::from_secs(config.api_timeout_seconds)))
                .build(),
        );
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );

        Self {
            agent,
            endpoint,
            api_key: config.api_key.clone(),
        }
    }
}

impl ModelApi for GeminiHttp {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> AppResult<String> {
        let body = build_request_body(prompt, params);

        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .send_json(&body)
            .map_err(|error| AppError::ModelApi(format!("generateContent request: {error}")))?;

        let payload: Value = response
            .body_mut()
            .read_json()
            .map_err(|error| AppError::ModelApi(format!("generateContent response: {error}")))?;

        let text = extract_candidate_text(&payload);
        debug!(chars = text.len(), "model reply received");
        Ok(text)
    }
}

fn build_request_body(prompt: &str, params: &GenerationParams) -> Value {
    json!({
        "contents": [{"parts": [{"text": prompt}]}],
        "generationConfig": {
            "temperature": params.temperature,
            "maxOutputTokens": params.max_output_tokens,
        },
    })
}

/// Concatenates the text parts of the first candidate. A reply with no
/// candidates (safety block, quota) yields an empty string, which the
/// summarizer treats as an empty response.
fn extract_candidate_text(payload: &Value) -> String {
    let Some(parts) = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    else {
        return String::new();
    };

    let mut buffer = String::new();
    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            buffer.push_str(text);
        }
    }
    buffer
}
