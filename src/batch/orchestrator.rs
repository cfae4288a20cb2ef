use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::batch::report::{RunStats, SingleResult};
use crate::config::BatchConfig;
use crate::error::AppResult;
use crate::store::{ItemStore, PendingItem};
use crate::summarize::{ModelApi, Sleeper, Summarizer};

/// Trimmed transcripts shorter than this are too short to be meaningful
/// input and are skipped without calling the model.
pub const MIN_TRANSCRIPT_CHARS: usize = 10;

/// Diagnostic written through the error sentinel when the model exhausts
/// every attempt without a valid summary. Kept verbatim from the system
/// this service replaced; operator tooling matches on it.
pub const EXHAUSTED_DIAGNOSTIC: &str = "Fallo generación resumen";

/// Failure that escaped per-item isolation and aborted the run. Carries
/// the partially-finalized statistics for everything processed before it.
#[derive(Debug, Error)]
#[error("critical batch failure: {source}")]
pub struct CriticalRunError {
    pub stats: RunStats,
    #[source]
    pub source: crate::error::AppError,
}

/// Drives pending items through the summarizer one at a time, persisting
/// success or failure back through the store. Strictly sequential: the
/// only suspension points are the timed pauses.
pub struct BatchOrchestrator<St, M, S> {
    store: St,
    summarizer: Summarizer<M, S>,
    sleeper: S,
    item_delay: Duration,
}

impl<St: ItemStore, M: ModelApi, S: Sleeper> BatchOrchestrator<St, M, S> {
    pub fn new(store: St, summarizer: Summarizer<M, S>, sleeper: S, batch: &BatchConfig) -> Self {
        Self {
            store,
            summarizer,
            sleeper,
            item_delay: Duration::from_secs(batch.delay_seconds),
        }
    }

    /// Processes every pending item found at the start of the run (a
    /// snapshot: rows added afterwards wait for the next run). Per-item
    /// failures are recorded and never abort the run; a failure outside
    /// per-item isolation finalizes timing and aborts. The store
    /// connection is released on every exit path.
    pub fn process_all_pending(mut self) -> Result<RunStats, CriticalRunError> {
        let started = Instant::now();
        let mut stats = RunStats::start();
        info!("starting batch summarization run");

        let outcome = self.run_batch(&mut stats);
        stats.finalize(started.elapsed());
        self.store.close();

        match outcome {
            Ok(()) => {
                info!("\n{}", stats.render_text());
                Ok(stats)
            }
            Err(source) => {
                error!(%source, "critical failure, aborting run");
                Err(CriticalRunError { stats, source })
            }
        }
    }

    fn run_batch(&self, stats: &mut RunStats) -> AppResult<()> {
        let items = self.store.fetch_pending()?;
        stats.total_found = items.len() as u64;

        if items.is_empty() {
            info!("no pending consultations to process");
            return Ok(());
        }

        let last_index = items.len() - 1;
        for (index, item) in items.iter().enumerate() {
            info!(
                item_id = item.id,
                position = index + 1,
                total = items.len(),
                "processing consultation"
            );
            self.process_item(item, stats);

            if index < last_index {
                self.sleeper.sleep(self.item_delay);
            }
        }

        Ok(())
    }

    fn process_item(&self, item: &PendingItem, stats: &mut RunStats) {
        if item.raw_text.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
            warn!(item_id = item.id, "transcript too short, skipping");
            stats.skipped += 1;
            return;
        }

        match self.summarizer.summarize(&item.raw_text, item.id) {
            Ok(Some(canonical)) => match self.store.write_success(item.id, &canonical) {
                Ok(true) => {
                    info!(item_id = item.id, "consultation processed");
                    stats.succeeded += 1;
                }
                Ok(false) => {
                    let message = format!("summary update matched no row for item {}", item.id);
                    error!(item_id = item.id, "{message}");
                    stats.record_error(item.id, message);
                }
                Err(store_error) => {
                    let message =
                        format!("failed to store summary for item {}: {store_error}", item.id);
                    error!(item_id = item.id, "{message}");
                    self.store.write_failure(item.id, &store_error.to_string());
                    stats.record_error(item.id, message);
                }
            },
            Ok(None) => {
                let message = format!("model produced no valid summary for item {}", item.id);
                error!(item_id = item.id, "{message}");
                self.store.write_failure(item.id, EXHAUSTED_DIAGNOSTIC);
                stats.record_error(item.id, message);
            }
            Err(failure) => {
                let message = format!("error processing item {}: {failure}", item.id);
                error!(item_id = item.id, "{message}");
                self.store.write_failure(item.id, &failure.to_string());
                stats.record_error(item.id, message);
            }
        }
    }

    /// Processes exactly one item by id. Store lookup failures propagate;
    /// everything after that comes back as a success/error result object.
    pub fn process_one(mut self, item_id: i64) -> AppResult<SingleResult> {
        let outcome = self.run_one(item_id);
        self.store.close();
        outcome
    }

    fn run_one(&self, item_id: i64) -> AppResult<SingleResult> {
        info!(item_id, "processing single consultation");

        let Some(item) = self.store.fetch_item(item_id)? else {
            return Ok(SingleResult::failure(
                item_id,
                format!("consultation {item_id} not found or not enabled for transcription"),
            ));
        };

        match self.summarizer.summarize(&item.raw_text, item.id) {
            Ok(Some(canonical)) => {
                if self.store.write_success(item.id, &canonical)? {
                    Ok(SingleResult::success(
                        item_id,
                        "summary generated and stored",
                    ))
                } else {
                    Ok(SingleResult::failure(
                        item_id,
                        format!("summary update matched no row for item {item_id}"),
                    ))
                }
            }
            Ok(None) => Ok(SingleResult::failure(
                item_id,
                format!("could not generate a valid summary for item {item_id}"),
            )),
            Err(failure) => Ok(SingleResult::failure(item_id, failure.to_string())),
        }
    }
}
