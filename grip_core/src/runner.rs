//! Actor thread that owns the `Engine` for one assessment.
//!
//! Samples, protocol ticks and control requests arrive on three channels and
//! are handled one at a time by a single `select!` loop, so a sample can
//! never interleave with a tick. After every event the runner publishes an
//! `EngineSnapshot` behind an `RwLock`; readers see the state either before or
//! after an event, never in between.
//!
//! The tick channel exists only while the engine is `Working` or `Resting`.
//! It is re-armed on each entry into one of those phases (first tick one
//! period later) and replaced by `never()` otherwise, so nothing is scheduled
//! once the engine is `Finished`.
use crossbeam_channel as xch;
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::RunParams;
use crate::engine::{Engine, EngineSnapshot};
use crate::error::{GripError, Result};
use crate::record::AssessmentOutcome;
use crate::sampler::ForceReading;
use crate::status::{Phase, Signal};

/// Requests from the UI side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    FinishEarly,
}

enum Event {
    Sample(ForceReading),
    SourceGone,
    Tick,
    Control(Control),
    ControlGone,
}

/// Handle to a running assessment.
pub struct AssessmentHandle {
    control: xch::Sender<Control>,
    signals: xch::Receiver<Signal>,
    snapshot: Arc<RwLock<EngineSnapshot>>,
    join_handle: Option<JoinHandle<Option<AssessmentOutcome>>>,
}

impl AssessmentHandle {
    /// Latest published engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot
            .read()
            .map(|g| g.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Ask the runner to finish now. Ignored if the assessment already ended.
    pub fn finish_early(&self) {
        let _ = self.control.send(Control::FinishEarly);
    }

    /// Fire-and-forget cues (end warning, cycle start) for the audio/visual side.
    pub fn signals(&self) -> &xch::Receiver<Signal> {
        &self.signals
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    /// Block until the engine reaches `Finished` and return its outcome.
    pub fn wait(mut self) -> Result<AssessmentOutcome> {
        let handle = self
            .join_handle
            .take()
            .ok_or_else(|| eyre::Report::new(GripError::State("runner already joined".into())))?;
        match handle.join() {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => Err(eyre::Report::new(GripError::State(
                "runner stopped before the assessment finished".into(),
            ))),
            Err(_) => Err(eyre::Report::new(GripError::State(
                "runner thread panicked".into(),
            ))),
        }
    }
}

impl Drop for AssessmentHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.control.send(Control::FinishEarly);
            if handle.join().is_err() {
                tracing::warn!("runner thread panicked during shutdown");
            }
        }
    }
}

/// Start an assessment on its own thread, consuming readings from `samples`.
///
/// The engine is started immediately (phase `WaitingForForce`). If `samples`
/// disconnects the protocol keeps running on the clock and finishes early at
/// the next `WaitingForForce`, since nothing can trigger another cycle.
pub fn spawn(params: RunParams, samples: xch::Receiver<ForceReading>) -> Result<AssessmentHandle> {
    let mut engine = Engine::new(params.protocol)?;
    engine.start();

    let snapshot = Arc::new(RwLock::new(engine.snapshot()));
    let snapshot_clone = snapshot.clone();
    let (control_tx, control_rx) = xch::unbounded();
    let (signal_tx, signal_rx) = xch::unbounded();
    let period = params.tick;

    let join_handle = std::thread::spawn(move || {
        run_loop(engine, period, samples, &control_rx, &signal_tx, &snapshot_clone)
    });

    Ok(AssessmentHandle {
        control: control_tx,
        signals: signal_rx,
        snapshot,
        join_handle: Some(join_handle),
    })
}

fn run_loop(
    mut engine: Engine,
    period: Duration,
    mut samples: xch::Receiver<ForceReading>,
    control: &xch::Receiver<Control>,
    signals: &xch::Sender<Signal>,
    snapshot: &RwLock<EngineSnapshot>,
) -> Option<AssessmentOutcome> {
    let mut control = control.clone();
    let mut ticker: xch::Receiver<Instant> = xch::never();
    let mut source_gone = false;

    while engine.phase() != Phase::Finished {
        let before = engine.phase();
        let event = xch::select! {
            recv(samples) -> msg => msg.map_or(Event::SourceGone, Event::Sample),
            recv(ticker) -> _ => Event::Tick,
            recv(control) -> msg => msg.map_or(Event::ControlGone, Event::Control),
        };

        match event {
            Event::Sample(r) => engine.submit(r.force, r.timestamp),
            Event::Tick => {
                if let Some(sig) = engine.tick() {
                    tracing::debug!(?sig, "signal");
                    let _ = signals.try_send(sig);
                }
            }
            Event::Control(Control::FinishEarly) => {
                engine.finish_early();
            }
            Event::SourceGone => {
                tracing::warn!(phase = %engine.phase(), "force source disconnected");
                samples = xch::never();
                source_gone = true;
            }
            Event::ControlGone => {
                control = xch::never();
            }
        }

        if source_gone && engine.phase() == Phase::WaitingForForce {
            engine.finish_early();
        }

        let after = engine.phase();
        if after != before {
            ticker = if after.is_timed() {
                xch::tick(period)
            } else {
                xch::never()
            };
        }

        if let Ok(mut g) = snapshot.write() {
            *g = engine.snapshot();
        }
    }

    engine.outcome()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolCfg;

    fn quick_params() -> RunParams {
        RunParams {
            protocol: ProtocolCfg {
                work_secs: 2,
                rest_secs: 1,
                total_cycles: 2,
                end_warning_secs: 1,
                early_finish_min_cycles: 1,
                ..ProtocolCfg::default()
            },
            tick: Duration::from_millis(5),
        }
    }

    #[test]
    fn disconnected_source_finishes_early() {
        let (tx, rx) = xch::unbounded::<ForceReading>();
        drop(tx);
        let handle = spawn(quick_params(), rx).unwrap();
        let outcome = handle.wait().unwrap();
        assert!(outcome.finished_early);
        assert_eq!(outcome.completed_cycles, 0);
    }

    #[test]
    fn invalid_protocol_is_rejected_before_spawning() {
        let (_tx, rx) = xch::unbounded::<ForceReading>();
        let mut params = quick_params();
        params.protocol.rest_secs = 0;
        assert!(spawn(params, rx).is_err());
    }
}
