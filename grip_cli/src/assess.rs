//! Assessment execution: source assembly, sampling, the runner loop and the save decision.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use grip_core::config::{RunParams, SamplingMode};
use grip_core::sampler::{Fanout, Sampler};
use grip_core::{
    AssessmentOutcome, AssessmentRecord, AssessmentRepository, Hand, JsonFileRepository, Phase,
    Signal,
};
use grip_hardware::{SimProfile, SimulatedForceSource, TraceForceSource};
use grip_traits::clock::MonotonicClock;
use grip_traits::{ForceSource, ScaledClock};
use serde_json::json;

use crate::cli::json_mode;

/// What happened to a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Saved,
    /// Usable result, saving disabled with --no-save
    Kept,
    /// Stopped before enough cycles were closed
    Cancelled,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Saved => "saved",
            Disposition::Kept => "completed",
            Disposition::Cancelled => "cancelled",
        }
    }
}

/// A run is worth keeping if it completed, or was cut short after enough cycles.
pub fn is_usable(outcome: &AssessmentOutcome, early_finish_min_cycles: u32) -> bool {
    !outcome.finished_early || outcome.completed_cycles >= early_finish_min_cycles
}

pub struct AssessArgs<'a> {
    pub hand: Hand,
    pub bodyweight: f64,
    pub trace: Option<&'a Path>,
    pub tick_ms: Option<u64>,
    pub no_save: bool,
}

/// Clock measuring protocol time: one protocol second lasts `tick` of real time.
pub type ProtocolClock = ScaledClock<MonotonicClock>;

/// Simulator (or `trace`) reading its timing from `clock`.
pub(crate) fn build_source(
    cfg: &grip_config::Config,
    trace: Option<&Path>,
    clock: &ProtocolClock,
) -> eyre::Result<Box<dyn ForceSource + Send>> {
    if let Some(path) = trace {
        let rows = grip_config::load_trace_csv(path)?;
        tracing::info!(path = %path.display(), rows = rows.len(), "replaying force trace");
        let points = rows.into_iter().map(|r| (r.t_ms, r.force_kg));
        return Ok(Box::new(TraceForceSource::from_ms(points, clock.clone())));
    }
    let p = &cfg.protocol;
    let s = &cfg.sim;
    let profile = SimProfile {
        peak_kg: s.peak_kg,
        critical_kg: s.critical_kg,
        fatigue_cycles: s.fatigue_cycles,
        noise_kg: s.noise_kg,
        seed: s.seed,
        ..SimProfile::for_protocol(p.work_secs, p.rest_secs, Duration::from_secs(1))
    };
    tracing::info!(peak_kg = s.peak_kg, critical_kg = s.critical_kg, "simulating athlete");
    Ok(Box::new(SimulatedForceSource::new(profile, clock.clone())))
}

/// Start sampling `source` into `fanout` the way `[runner]` asks for.
pub(crate) fn spawn_sampler(
    cfg: &grip_config::Config,
    source: Box<dyn ForceSource + Send>,
    clock: &ProtocolClock,
    fanout: Fanout,
) -> Sampler {
    let timeout = Duration::from_millis(cfg.runner.read_timeout_ms);
    match SamplingMode::from(&cfg.runner) {
        SamplingMode::Paced(rate) => Sampler::spawn(source, rate, timeout, clock.clone(), fanout),
        SamplingMode::Event => Sampler::spawn_event(source, timeout, clock.clone(), fanout),
    }
}

pub fn run_assess(
    cfg: &grip_config::Config,
    args: &AssessArgs<'_>,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<Disposition> {
    if !(args.bodyweight.is_finite() && args.bodyweight > 0.0) {
        eyre::bail!("bodyweight must be a positive number of kg");
    }

    let mut params = RunParams::from(cfg);
    if let Some(ms) = args.tick_ms {
        params.tick = Duration::from_millis(ms.max(1));
    }
    let protocol = params.protocol.clone();
    let clock = ScaledClock::new(MonotonicClock::new(), params.tick);
    let source = build_source(cfg, args.trace, &clock)?;

    let mut fanout = Fanout::new();
    let engine_rx = fanout.subscribe();
    let display_rx = fanout.subscribe_lossy(1);

    let handle = grip_core::runner::spawn(params.clone(), engine_rx)?;
    let sampler = spawn_sampler(cfg, source, &clock, fanout);

    tracing::info!(hand = %args.hand, tick_ms = params.tick.as_millis(), "assessment running");
    let poll = (params.tick / 4).clamp(Duration::from_millis(1), Duration::from_millis(100));
    let mut last_phase = Phase::Idle;
    let mut cancel_requested = false;
    let mut live_line = false;
    while !handle.is_finished() {
        if shutdown.load(Ordering::Relaxed) && !cancel_requested {
            tracing::warn!("interrupt received, finishing early");
            handle.finish_early();
            cancel_requested = true;
        }
        for sig in handle.signals().try_iter() {
            report_signal(sig);
        }
        let snap = handle.snapshot();
        if snap.phase != last_phase {
            if live_line {
                eprintln!();
                live_line = false;
            }
            report_phase(&snap);
            last_phase = snap.phase;
        }
        if let Some(r) = display_rx.try_iter().last()
            && last_phase == Phase::Working
            && !json_mode()
        {
            eprint!("\r  {:>6.1} kg", r.force);
            live_line = true;
        }
        std::thread::sleep(poll);
    }

    if live_line {
        eprintln!();
    }
    let outcome = handle.wait()?;
    drop(sampler);
    tracing::debug!(readings = outcome.all_samples.len(), "runner joined");

    if !is_usable(&outcome, protocol.early_finish_min_cycles) {
        print_cancelled(&outcome, protocol.early_finish_min_cycles);
        return Ok(Disposition::Cancelled);
    }

    let record = AssessmentRecord::from_outcome(outcome, args.hand, args.bodyweight, protocol.cf_window);
    let disposition = if args.no_save {
        Disposition::Kept
    } else {
        let path = cfg.storage.path_or_default();
        let mut repo = JsonFileRepository::open(&path)?;
        repo.save(record.clone())
            .wrap_err_with(|| format!("save assessment to {}", path.display()))?;
        Disposition::Saved
    };
    print_result(&record, disposition);
    Ok(disposition)
}

fn report_signal(sig: Signal) {
    if json_mode() {
        return;
    }
    match sig {
        Signal::EndWarning => eprintln!("  ... ending soon"),
        Signal::CycleStart => eprintln!("  >>> pull!"),
    }
}

fn report_phase(snap: &grip_core::EngineSnapshot) {
    if json_mode() {
        return;
    }
    match snap.phase {
        Phase::WaitingForForce => eprintln!(
            "cycle {}/{}: waiting for force",
            snap.cycle_index + 1,
            snap.total_cycles
        ),
        Phase::Working => eprintln!("cycle {}/{}: work", snap.cycle_index + 1, snap.total_cycles),
        Phase::Resting => eprintln!(
            "cycle {}/{}: rest (running CF {:.1} kg)",
            snap.cycle_index + 1,
            snap.total_cycles,
            snap.critical_force
        ),
        Phase::Idle | Phase::Finished => {}
    }
}

fn print_cancelled(outcome: &AssessmentOutcome, min_cycles: u32) {
    if json_mode() {
        println!(
            "{}",
            json!({
                "status": Disposition::Cancelled.as_str(),
                "completed_cycles": outcome.completed_cycles,
                "required_cycles": min_cycles,
            })
        );
    } else {
        println!(
            "Assessment cancelled after {} of at least {} cycles; nothing saved.",
            outcome.completed_cycles, min_cycles
        );
    }
}

fn print_result(record: &AssessmentRecord, disposition: Disposition) {
    if json_mode() {
        println!(
            "{}",
            json!({
                "status": disposition.as_str(),
                "id": record.id,
                "hand": record.hand,
                "completed_cycles": record.completed_cycles,
                "critical_force": record.critical_force,
                "w_prime": record.w_prime,
                "relative_critical_force": record.relative_critical_force(),
                "peak_force": record.peak_force(),
            })
        );
        return;
    }
    println!("Assessment {} ({} hand)", disposition.as_str(), record.hand);
    println!("  id:               {}", record.id);
    println!("  cycles:           {}", record.completed_cycles);
    println!("  critical force:   {:.2} kg", record.critical_force);
    if let Some(rel) = record.relative_critical_force() {
        println!("                    {:.1} % bodyweight", rel * 100.0);
    }
    println!("  W′:               {:.1} kg·s", record.w_prime);
    println!("  peak force:       {:.2} kg", record.peak_force());
}
