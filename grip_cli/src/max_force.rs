//! Max force test: sample the source for a fixed protocol window and keep the peak.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use grip_core::sampler::Fanout;
use grip_core::{AssessmentRepository, Hand, JsonFileRepository, MaxForceRecord, Sample};
use grip_traits::clock::MonotonicClock;
use grip_traits::{Clock, ScaledClock};
use serde_json::json;

use crate::assess::{Disposition, build_source, spawn_sampler};
use crate::cli::json_mode;

pub struct MaxForceArgs<'a> {
    pub hand: Hand,
    /// Measurement window in protocol seconds
    pub secs: u32,
    pub trace: Option<&'a Path>,
    pub tick_ms: Option<u64>,
    pub no_save: bool,
}

pub fn run_max_force(
    cfg: &grip_config::Config,
    args: &MaxForceArgs<'_>,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<Disposition> {
    if args.secs == 0 {
        eyre::bail!("secs must be at least 1");
    }
    let tick = Duration::from_millis(args.tick_ms.unwrap_or(cfg.runner.tick_ms).max(1));
    let clock = ScaledClock::new(MonotonicClock::new(), tick);
    let source = build_source(cfg, args.trace, &clock)?;

    let mut fanout = Fanout::new();
    let readings = fanout.subscribe();
    let sampler = spawn_sampler(cfg, source, &clock, fanout);

    let deadline = clock.now() + Duration::from_secs(u64::from(args.secs));
    let poll = (tick / 4).clamp(Duration::from_millis(1), Duration::from_millis(100));
    tracing::info!(hand = %args.hand, secs = args.secs, "max force test running");

    let mut samples = Vec::new();
    let mut peak = 0.0_f64;
    while clock.now() < deadline {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!("interrupt received, stopping max force test");
            break;
        }
        match readings.recv_timeout(poll) {
            Ok(r) if r.force.is_finite() => {
                let force = r.force.max(0.0);
                peak = peak.max(force);
                samples.push(Sample::new(force, r.timestamp));
                if !json_mode() {
                    eprint!("\r  {force:>6.1} kg   max {peak:>6.1} kg");
                }
            }
            Ok(r) => tracing::warn!(force = r.force, "dropping non-finite force reading"),
            Err(e) if e.is_disconnected() => {
                tracing::debug!("force source ended before the window closed");
                break;
            }
            Err(_) => {}
        }
    }
    drop(sampler);
    if !json_mode() && !samples.is_empty() {
        eprintln!();
    }

    if samples.is_empty() {
        print_cancelled();
        return Ok(Disposition::Cancelled);
    }

    let record = MaxForceRecord::from_samples(args.hand, &samples);
    let disposition = if args.no_save {
        Disposition::Kept
    } else {
        let path = cfg.storage.path_or_default();
        let mut repo = JsonFileRepository::open(&path)?;
        repo.save_max_force(record.clone())
            .wrap_err_with(|| format!("save max force test to {}", path.display()))?;
        Disposition::Saved
    };
    print_result(&record, samples.len(), disposition);
    Ok(disposition)
}

fn print_cancelled() {
    if json_mode() {
        println!(
            "{}",
            json!({ "status": Disposition::Cancelled.as_str(), "samples": 0 })
        );
    } else {
        println!("Max force test cancelled: no readings arrived; nothing saved.");
    }
}

fn print_result(record: &MaxForceRecord, samples: usize, disposition: Disposition) {
    if json_mode() {
        println!(
            "{}",
            json!({
                "status": disposition.as_str(),
                "id": record.id,
                "hand": record.hand,
                "max_force": record.max_force,
                "samples": samples,
            })
        );
        return;
    }
    println!("Max force test {} ({} hand)", disposition.as_str(), record.hand);
    println!("  id:         {}", record.id);
    println!("  max force:  {:.2} kg", record.max_force);
    println!("  samples:    {samples}");
}
