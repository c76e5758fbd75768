//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use grip_core::Hand;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(name = "grip", version, about = "Critical force assessment for hangboard training")]
pub struct Cli {
    /// Path to config TOML (a missing file means built-in defaults)
    #[arg(long, value_name = "FILE", default_value = "etc/grip.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum HandArg {
    Left,
    Right,
}

impl From<HandArg> for Hand {
    fn from(h: HandArg) -> Self {
        match h {
            HandArg::Left => Hand::Left,
            HandArg::Right => Hand::Right,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a critical force assessment against the simulator or a recorded trace
    Assess {
        /// Hand being tested
        #[arg(long, value_enum)]
        hand: HandArg,
        /// Athlete bodyweight in kg (for relative critical force)
        #[arg(long, value_name = "KG")]
        bodyweight: f64,
        /// Replay a recorded force trace (CSV with headers t_ms,force_kg) instead of simulating
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
        /// Override runner.tick_ms: wall-clock length of one protocol second
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
        /// Do not write the result to the assessment store
        #[arg(long, action = ArgAction::SetTrue)]
        no_save: bool,
    },
    /// Measure the single highest pull of one hand over a fixed window
    MaxForce {
        /// Hand being tested
        #[arg(long, value_enum)]
        hand: HandArg,
        /// Measurement window in protocol seconds
        #[arg(long, value_name = "SECS", default_value_t = 10)]
        secs: u32,
        /// Replay a recorded force trace (CSV with headers t_ms,force_kg) instead of simulating
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
        /// Override runner.tick_ms: wall-clock length of one protocol second
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
        /// Do not write the result to the store
        #[arg(long, action = ArgAction::SetTrue)]
        no_save: bool,
    },
    /// List saved assessments (or max force tests), oldest first
    History {
        /// Only this hand
        #[arg(long, value_enum)]
        hand: Option<HandArg>,
        /// List max force tests instead of critical force assessments
        #[arg(long, action = ArgAction::SetTrue)]
        max_force: bool,
    },
    /// Show one saved assessment (with its per-cycle averages) or max force test
    Show {
        #[arg(long)]
        id: uuid::Uuid,
    },
    /// Delete a saved assessment or max force test
    Delete {
        #[arg(long)]
        id: uuid::Uuid,
    },
    /// Export every saved assessment and max force test to a backup file
    Export {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Merge a backup file into the store, skipping assessments already present
    Import {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Re-derive critical force and W′ of a saved assessment with the current protocol.cf_window
    Recompute {
        #[arg(long)]
        id: uuid::Uuid,
    },
    /// Quick health check (config, store and simulator)
    SelfCheck,
}
