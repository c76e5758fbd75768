mod assess;
mod cli;
mod error_fmt;
mod max_force;
mod records;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use grip_core::{AssessmentRepository, Engine, JsonFileRepository};
use grip_traits::ForceSource;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::assess::{AssessArgs, run_assess};
use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE, json_mode};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::max_force::{MaxForceArgs, run_max_force};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }

    let code = match run(&cli) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            if json_mode() {
                println!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match &cli.cmd {
        Commands::Assess {
            hand,
            bodyweight,
            trace,
            tick_ms,
            no_save,
        } => {
            let args = AssessArgs {
                hand: (*hand).into(),
                bodyweight: *bodyweight,
                trace: trace.as_deref(),
                tick_ms: *tick_ms,
                no_save: *no_save,
            };
            run_assess(&cfg, &args, &interrupt_flag()).map(|_| ())
        }
        Commands::MaxForce {
            hand,
            secs,
            trace,
            tick_ms,
            no_save,
        } => {
            let args = MaxForceArgs {
                hand: (*hand).into(),
                secs: *secs,
                trace: trace.as_deref(),
                tick_ms: *tick_ms,
                no_save: *no_save,
            };
            run_max_force(&cfg, &args, &interrupt_flag()).map(|_| ())
        }
        Commands::History { hand, max_force } => {
            records::run_history(&cfg, hand.map(Into::into), *max_force)
        }
        Commands::Show { id } => records::run_show(&cfg, *id),
        Commands::Delete { id } => records::run_delete(&cfg, *id),
        Commands::Export { out } => records::run_export(&cfg, out),
        Commands::Import { file } => records::run_import(&cfg, file),
        Commands::Recompute { id } => records::run_recompute(&cfg, *id),
        Commands::SelfCheck => self_check(&cfg),
    }
}

/// Flag raised by Ctrl-C.
fn interrupt_flag() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
    shutdown
}

/// Read and validate the TOML config. A missing file yields the defaults.
fn load_config(path: &Path) -> eyre::Result<grip_config::Config> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(text) => grip_config::load_toml(&text)
            .wrap_err_with(|| format!("parse config {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => grip_config::Config::default(),
        Err(e) => {
            return Err(eyre::Report::new(grip_core::GripError::Io(e.to_string()))
                .wrap_err(format!("read config {}", path.display())));
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &grip_config::Logging) -> eyre::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))
}

fn self_check(cfg: &grip_config::Config) -> eyre::Result<()> {
    let protocol = grip_core::ProtocolCfg::from(&cfg.protocol);
    let mut engine = Engine::new(protocol)?;
    engine.start();

    let path = cfg.storage.path_or_default();
    let stored = JsonFileRepository::open(&path)?.list()?.len();

    let profile = grip_hardware::SimProfile::for_protocol(
        cfg.protocol.work_secs,
        cfg.protocol.rest_secs,
        Duration::from_secs(1),
    );
    let mut sim = grip_hardware::SimulatedForceSource::new(
        profile,
        grip_traits::clock::MonotonicClock::new(),
    );
    let reading = sim
        .read(Duration::from_millis(cfg.runner.read_timeout_ms))
        .map_err(|e| eyre::Report::new(grip_core::hw_error::map_source_error(&*e)))?;
    engine.submit(reading, chrono::Utc::now());

    if json_mode() {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "protocol_cycles": cfg.protocol.total_cycles,
                "store": path,
                "stored_assessments": stored,
                "simulator_reading": reading,
            })
        );
    } else {
        println!("config ok ({} cycles)", cfg.protocol.total_cycles);
        println!("store ok ({}, {stored} assessments)", path.display());
        println!("simulator ok ({reading:.1} kg)");
        println!("OK");
    }
    Ok(())
}
