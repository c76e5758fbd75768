//! The assessment state machine.
//!
//! `Engine` is mutated only by `submit` (a force sample arrived) and `tick`
//! (one protocol second elapsed). It never blocks, never sleeps and never
//! fails; calls that make no sense in the current phase are no-ops. Timing is
//! the caller's job: see `runner` for the thread that serializes both event
//! streams and drives the one-second tick.
//!
//! Phase graph:
//!
//! ```text
//! Idle -> WaitingForForce -> Working -> Resting -> WaitingForForce ... -> Finished
//! ```
//!
//! `finish_early` jumps from any active phase straight to `Finished`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ProtocolCfg;
use crate::error::Result;
use crate::metrics;
use crate::record::{AssessmentOutcome, Cycle, Sample};
use crate::status::{Phase, Signal};

/// Consistent copy of the display-relevant engine state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub phase: Phase,
    /// 0-based, advanced when a rest phase ends
    pub cycle_index: u32,
    pub total_cycles: u32,
    /// Whole seconds left in the current timed phase
    pub time_remaining: u32,
    pub last_force: f64,
    pub completed_cycles: u32,
    /// Running critical force over the cycles closed so far
    pub critical_force: f64,
    pub can_finish_early: bool,
}

#[derive(Debug, Clone)]
pub struct Engine {
    cfg: ProtocolCfg,
    phase: Phase,
    cycle_index: u32,
    time_remaining: u32,
    buffer: Vec<Sample>,
    cycles: Vec<Cycle>,
    history: Vec<Sample>,
    last_force: f64,
    finished_early: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_cfg(ProtocolCfg::default())
    }
}

impl Engine {
    /// Create an idle engine, rejecting protocols it cannot run.
    pub fn new(cfg: ProtocolCfg) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::with_cfg(cfg))
    }

    fn with_cfg(cfg: ProtocolCfg) -> Self {
        Self {
            cfg,
            phase: Phase::Idle,
            cycle_index: 0,
            time_remaining: 0,
            buffer: Vec::new(),
            cycles: Vec::new(),
            history: Vec::new(),
            last_force: 0.0,
            finished_early: false,
        }
    }

    pub fn protocol(&self) -> &ProtocolCfg {
        &self.cfg
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn last_force(&self) -> f64 {
        self.last_force
    }

    /// Closed cycles, oldest first.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Every sample recorded since `start`.
    pub fn samples(&self) -> &[Sample] {
        &self.history
    }

    /// Samples of the work phase in progress.
    pub fn current_buffer(&self) -> &[Sample] {
        &self.buffer
    }

    pub fn completed_cycles(&self) -> u32 {
        u32::try_from(self.cycles.len()).unwrap_or(u32::MAX)
    }

    /// Whether enough cycles are closed for an early finish to produce a usable result.
    pub fn can_finish_early(&self) -> bool {
        self.completed_cycles() >= self.cfg.early_finish_min_cycles
    }

    /// Begin (or restart) an assessment. Only valid from `Idle` or `Finished`;
    /// returns false and changes nothing otherwise.
    pub fn start(&mut self) -> bool {
        if !matches!(self.phase, Phase::Idle | Phase::Finished) {
            tracing::debug!(phase = %self.phase, "start ignored: assessment in progress");
            return false;
        }
        self.cycle_index = 0;
        self.time_remaining = 0;
        self.buffer.clear();
        self.cycles.clear();
        self.history.clear();
        self.finished_early = false;
        self.phase = Phase::WaitingForForce;
        tracing::info!(
            total_cycles = self.cfg.total_cycles,
            work_secs = self.cfg.work_secs,
            rest_secs = self.cfg.rest_secs,
            "assessment started"
        );
        true
    }

    /// Feed one force reading (kg).
    ///
    /// Negative readings are clamped to 0. Non-finite readings are dropped.
    pub fn submit(&mut self, force: f64, timestamp: DateTime<Utc>) {
        if !force.is_finite() {
            tracing::warn!(force, "dropping non-finite force reading");
            return;
        }
        let force = force.max(0.0);
        self.last_force = force;
        if !self.phase.is_active() {
            return;
        }

        let sample = Sample::new(force, timestamp);
        match self.phase {
            Phase::WaitingForForce if force >= self.cfg.force_threshold_kg => {
                self.phase = Phase::Working;
                self.time_remaining = self.cfg.work_secs;
                self.buffer.clear();
                self.buffer.push(sample.clone());
                tracing::debug!(
                    cycle = self.completed_cycles() + 1,
                    force,
                    "threshold crossed, work phase started"
                );
            }
            Phase::Working => self.buffer.push(sample.clone()),
            _ => {}
        }
        self.history.push(sample);
    }

    /// Advance the phase timer by one protocol second.
    pub fn tick(&mut self) -> Option<Signal> {
        match self.phase {
            Phase::Working => {
                self.time_remaining = self.time_remaining.saturating_sub(1);
                if self.time_remaining == 0 {
                    self.close_cycle();
                    self.phase = Phase::Resting;
                    self.time_remaining = self.cfg.rest_secs;
                    None
                } else if self.cfg.end_warning_secs > 0
                    && self.time_remaining == self.cfg.end_warning_secs
                {
                    Some(Signal::EndWarning)
                } else {
                    None
                }
            }
            Phase::Resting => {
                self.time_remaining = self.time_remaining.saturating_sub(1);
                if self.time_remaining > 0 {
                    return None;
                }
                self.cycle_index += 1;
                if self.cycle_index >= self.cfg.total_cycles {
                    self.phase = Phase::Finished;
                    tracing::info!(
                        completed = self.completed_cycles(),
                        "assessment finished"
                    );
                    None
                } else {
                    self.phase = Phase::WaitingForForce;
                    Some(Signal::CycleStart)
                }
            }
            _ => None,
        }
    }

    /// Stop the assessment now. The partially filled work buffer is discarded.
    /// Returns false if there was nothing to stop.
    pub fn finish_early(&mut self) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.time_remaining = 0;
        self.phase = Phase::Finished;
        self.finished_early = true;
        tracing::info!(
            completed = self.completed_cycles(),
            dropped_samples = dropped,
            "assessment finished early"
        );
        true
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            cycle_index: self.cycle_index,
            total_cycles: self.cfg.total_cycles,
            time_remaining: self.time_remaining,
            last_force: self.last_force,
            completed_cycles: self.completed_cycles(),
            critical_force: metrics::critical_force_over(&self.cycles, self.cfg.cf_window),
            can_finish_early: self.can_finish_early(),
        }
    }

    /// Terminal data; `None` until the engine is `Finished`.
    pub fn outcome(&self) -> Option<AssessmentOutcome> {
        (self.phase == Phase::Finished).then(|| AssessmentOutcome {
            cycles: self.cycles.clone(),
            completed_cycles: self.completed_cycles(),
            all_samples: self.history.clone(),
            last_force: self.last_force,
            finished_early: self.finished_early,
        })
    }

    fn close_cycle(&mut self) {
        let number = self.completed_cycles() + 1;
        let cycle = Cycle::new(number, std::mem::take(&mut self.buffer));
        tracing::debug!(
            cycle = number,
            samples = cycle.samples.len(),
            average = cycle.average_force,
            "cycle closed"
        );
        self.cycles.push(cycle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn new_rejects_invalid_protocol() {
        for total_cycles in [0, 25] {
            let cfg = ProtocolCfg {
                total_cycles,
                ..ProtocolCfg::default()
            };
            assert!(Engine::new(cfg).is_err(), "total_cycles = {total_cycles}");
        }
    }

    #[test]
    fn idle_samples_only_update_last_force() {
        let mut e = Engine::default();
        e.submit(9.0, at(0));
        assert_eq!(e.phase(), Phase::Idle);
        assert!(e.samples().is_empty());
        assert!((e.last_force() - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn start_is_noop_while_active() {
        let mut e = Engine::default();
        assert!(e.start());
        e.submit(10.0, at(0));
        assert!(!e.start());
        assert_eq!(e.phase(), Phase::Working);
        assert_eq!(e.samples().len(), 1);
    }

    #[test]
    fn negative_force_is_clamped_and_nan_dropped() {
        let mut e = Engine::default();
        e.start();
        e.submit(-1.5, at(0));
        e.submit(f64::NAN, at(10));
        assert_eq!(e.samples().len(), 1);
        assert_eq!(e.samples()[0].force, 0.0);
    }

    #[test]
    fn end_warning_fires_once_at_three_seconds_left() {
        let mut e = Engine::default();
        e.start();
        e.submit(10.0, at(0));
        let signals: Vec<_> = (0..7).map(|_| e.tick()).collect();
        assert_eq!(
            signals,
            vec![None, None, None, Some(Signal::EndWarning), None, None, None]
        );
        assert_eq!(e.phase(), Phase::Resting);
        assert_eq!(e.time_remaining(), 3);
    }

    #[test]
    fn tick_outside_timed_phases_is_noop() {
        let mut e = Engine::default();
        assert_eq!(e.tick(), None);
        e.start();
        assert_eq!(e.tick(), None);
        assert_eq!(e.phase(), Phase::WaitingForForce);
        assert_eq!(e.time_remaining(), 0);
    }

    #[test]
    fn outcome_only_when_finished() {
        let mut e = Engine::default();
        e.start();
        assert!(e.outcome().is_none());
        assert!(e.finish_early());
        let out = e.outcome().unwrap();
        assert!(out.finished_early);
        assert_eq!(out.completed_cycles, 0);
        assert!(!e.finish_early());
    }

    #[test]
    fn restart_after_finish_clears_state() {
        let mut e = Engine::default();
        e.start();
        e.submit(10.0, at(0));
        for _ in 0..7 {
            e.tick();
        }
        e.finish_early();
        assert_eq!(e.completed_cycles(), 1);
        assert!(e.start());
        assert_eq!(e.completed_cycles(), 0);
        assert!(e.samples().is_empty());
        assert_eq!(e.phase(), Phase::WaitingForForce);
    }
}
