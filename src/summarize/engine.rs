use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::ModelConfig;
use crate::error::{AppError, AppResult};
use crate::summarize::client::{GenerationParams, ModelApi};
use crate::summarize::prompt::{build_prompt, extract_json_span, PROBE_PROMPT};
use crate::summarize::summary::Summary;

const GENERATION: GenerationParams = GenerationParams {
    temperature: 0.1,
    max_output_tokens: 4096,
};

const BACKOFF_CAP_SECONDS: u64 = 60;

/// Timed-pause seam. The pipeline blocks its single worker on purpose;
/// tests swap this out to capture the schedule instead of waiting.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Turns raw transcript text into validated canonical summary text through
/// the model, with a rate-limit floor before every call and capped
/// exponential backoff between failed attempts.
pub struct Summarizer<M, S> {
    model: M,
    sleeper: S,
    max_retries: u32,
    rate_limit_floor: Duration,
}

impl<M: ModelApi, S: Sleeper> Summarizer<M, S> {
    pub fn new(model: M, sleeper: S, config: &ModelConfig) -> Self {
        Self {
            model,
            sleeper,
            max_retries: config.max_retries,
            rate_limit_floor: Duration::from_secs_f64(
                60.0 / f64::from(config.requests_per_minute),
            ),
        }
    }

    /// `Ok(Some(text))` on success, `Ok(None)` when the input is empty or
    /// every attempt failed on model output (empty reply, bad JSON, bad
    /// schema). Transport failures on the final attempt propagate as `Err`.
    pub fn summarize(&self, text: &str, item_id: i64) -> AppResult<Option<String>> {
        if text.trim().is_empty() {
            warn!(item_id, "empty transcript, nothing to summarize");
            return Ok(None);
        }

        let prompt = build_prompt(text);

        for attempt in 1..=self.max_retries {
            info!(item_id, attempt, "generating summary");
            self.sleeper.sleep(self.rate_limit_floor);

            match self.attempt(&prompt) {
                Ok(canonical) => {
                    info!(item_id, attempt, "summary generated");
                    return Ok(Some(canonical));
                }
                Err(failure) => {
                    error!(item_id, attempt, %failure, "summary attempt failed");
                    if attempt == self.max_retries {
                        if failure.is_model_output_failure() {
                            error!(
                                item_id,
                                attempts = self.max_retries,
                                "summary generation exhausted all attempts"
                            );
                            return Ok(None);
                        }
                        return Err(failure);
                    }
                    let backoff = Duration::from_secs(backoff_seconds(attempt));
                    info!(item_id, seconds = backoff.as_secs(), "waiting before next attempt");
                    self.sleeper.sleep(backoff);
                }
            }
        }

        Ok(None)
    }

    fn attempt(&self, prompt: &str) -> AppResult<String> {
        let reply = self.model.generate(prompt, &GENERATION)?;
        if reply.trim().is_empty() {
            return Err(AppError::EmptyResponse);
        }

        let span = extract_json_span(&reply);
        let payload: Value =
            serde_json::from_str(&span).map_err(|error| AppError::Parse(error.to_string()))?;

        let summary = Summary::from_value(&payload)?;
        summary.to_canonical_text()
    }

    /// External health probe, not on the hot path. Never errors.
    pub fn test_connection(&self) -> bool {
        match self.model.generate(PROBE_PROMPT, &GENERATION) {
            Ok(reply) => reply.trim().eq_ignore_ascii_case("OK"),
            Err(failure) => {
                error!(%failure, "connectivity probe failed");
                false
            }
        }
    }
}

fn backoff_seconds(attempt: u32) -> u64 {
    BACKOFF_CAP_SECONDS.min(2u64.saturating_pow(attempt))
}
