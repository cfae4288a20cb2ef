use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::CliOverrides;

#[derive(Debug, Parser)]
#[command(name = "callsum")]
#[command(about = "Batch summarizer for stored call transcripts")]
pub struct Cli {
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub max_retries: Option<u32>,

    #[arg(long)]
    pub batch_delay_seconds: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Run {
        #[arg(long)]
        json: bool,
    },
    One {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    Stats {
        #[arg(long)]
        json: bool,
    },
    Probe {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            db_path: self.db_path.clone(),
            model: self.model.clone(),
            max_retries: self.max_retries,
            batch_delay_seconds: self.batch_delay_seconds,
        }
    }
}
