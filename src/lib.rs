pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;
pub mod summarize;
#[cfg(test)]
mod test_support;

use clap::Parser;
use serde_json::json;

use crate::batch::BatchOrchestrator;
use crate::cli::{Cli, Command};
use crate::config::{load_config, AppConfig};
use crate::error::AppResult;
use crate::store::{ItemStore, SqliteGateway};
use crate::summarize::{GeminiHttp, Summarizer, ThreadSleeper};

trait CommandExecutor {
    fn run(&self, config: &AppConfig, json: bool) -> AppResult<()>;
    fn one(&self, config: &AppConfig, item_id: i64, json: bool) -> AppResult<()>;
    fn stats(&self, config: &AppConfig, json: bool) -> AppResult<()>;
    fn probe(&self, config: &AppConfig, json: bool) -> AppResult<()>;
}

struct DefaultCommandExecutor;

fn build_orchestrator(
    config: &AppConfig,
) -> AppResult<BatchOrchestrator<SqliteGateway, GeminiHttp, ThreadSleeper>> {
    let gateway = SqliteGateway::open(&config.store.db_path)?;
    gateway.ensure_schema()?;

    let model = GeminiHttp::new(&config.model);
    let summarizer = Summarizer::new(model, ThreadSleeper, &config.model);
    Ok(BatchOrchestrator::new(
        gateway,
        summarizer,
        ThreadSleeper,
        &config.batch,
    ))
}

impl CommandExecutor for DefaultCommandExecutor {
    fn run(&self, config: &AppConfig, json: bool) -> AppResult<()> {
        match build_orchestrator(config)?.process_all_pending() {
            Ok(stats) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!("{}", stats.render_text());
                }
                Ok(())
            }
            Err(critical) => {
                // Partial stats still go to the caller before the failure
                // propagates.
                if json {
                    println!("{}", serde_json::to_string_pretty(&critical.stats)?);
                } else {
                    println!("{}", critical.stats.render_text());
                }
                Err(critical.source)
            }
        }
    }

    fn one(&self, config: &AppConfig, item_id: i64, json: bool) -> AppResult<()> {
        let result = build_orchestrator(config)?.process_one(item_id)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            let label = if result.success { "ok" } else { "error" };
            println!("item {}: {label} - {}", result.item_id, result.message);
        }
        Ok(())
    }

    fn stats(&self, config: &AppConfig, json: bool) -> AppResult<()> {
        let mut gateway = SqliteGateway::open(&config.store.db_path)?;
        gateway.ensure_schema()?;
        let outcome = gateway.stats();
        gateway.close();
        let stats = outcome?;

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("total:     {}", stats.total);
            println!("processed: {}", stats.processed);
            println!("pending:   {}", stats.pending);
            println!("errored:   {}", stats.errored);
        }
        Ok(())
    }

    fn probe(&self, config: &AppConfig, json: bool) -> AppResult<()> {
        let model = GeminiHttp::new(&config.model);
        let summarizer = Summarizer::new(model, ThreadSleeper, &config.model);
        let connected = summarizer.test_connection();

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "model_connected": connected,
                    "model": config.model.model,
                }))?
            );
        } else {
            let label = if connected { "ok" } else { "failed" };
            println!("model connectivity ({}): {label}", config.model.model);
        }
        Ok(())
    }
}

fn execute_command<E: CommandExecutor>(
    command: Command,
    config: &AppConfig,
    executor: &E,
) -> AppResult<()> {
    match command {
        Command::Run { json } => executor.run(config, json),
        Command::One { id, json } => executor.one(config, id, json),
        Command::Stats { json } => executor.stats(config, json),
        Command::Probe { json } => executor.probe(config, json),
    }
}

pub fn run() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_level(true)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.to_overrides())?;

    execute_command(cli.command, &config, &DefaultCommandExecutor)
}
