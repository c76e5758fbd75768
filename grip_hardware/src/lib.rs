//! Force sources for the assessment tool.
//!
//! No radio transport lives here: the live scale is an external collaborator.
//! This crate provides the two sources the CLI and tests need, both driven by
//! a `grip_traits::Clock` so they run deterministically under `TestClock`:
//!
//! - `SimulatedForceSource`: a synthetic athlete who pulls, rests and fatigues
//!   towards a critical force.
//! - `TraceForceSource`: replays a recorded `(t_ms, force_kg)` trace on its clock.
//!
//! Both read time only through the clock, so behind a `ScaledClock` a pull of
//! 7 s or a trace row at `t_ms = 7000` lands 7 protocol seconds in whatever
//! the tick length.
pub mod error;
pub mod util;

use std::time::{Duration, Instant};

use grip_traits::{Clock, ForceSource};

use crate::error::HwError;
use crate::util::{XorShift32, wait_until_due};

/// Shape of a simulated assessment.
#[derive(Debug, Clone)]
pub struct SimProfile {
    /// Idle time before the first pull
    pub lead_in: Duration,
    /// Length of each pull
    pub pull: Duration,
    /// Time off the board after each pull
    pub rest: Duration,
    /// Extra delay before reacting to the next start cue
    pub reaction: Duration,
    pub peak_kg: f64,
    pub critical_kg: f64,
    /// Fatigue time constant in pulls
    pub fatigue_cycles: f64,
    pub noise_kg: f64,
    pub seed: u32,
    /// Stop producing readings after this many pulls (None = never)
    pub max_pulls: Option<u32>,
}

impl SimProfile {
    /// Profile matching a protocol of `work_secs`/`rest_secs`, where one protocol
    /// second lasts `tick`.
    pub fn for_protocol(work_secs: u32, rest_secs: u32, tick: Duration) -> Self {
        Self {
            lead_in: tick,
            pull: tick * work_secs,
            rest: tick * rest_secs,
            reaction: tick.mul_f64(0.3),
            peak_kg: 40.0,
            critical_kg: 18.0,
            fatigue_cycles: 6.0,
            noise_kg: 0.5,
            seed: 0x5eed,
            max_pulls: None,
        }
    }

    fn period(&self) -> Duration {
        self.pull + self.rest + self.reaction
    }

    /// Noise-free force of pull number `k` (0-based).
    pub fn pull_force(&self, k: u32) -> f64 {
        let tau = self.fatigue_cycles.max(f64::MIN_POSITIVE);
        let decay = (-(f64::from(k)) / tau).exp();
        self.critical_kg + (self.peak_kg - self.critical_kg) * decay
    }
}

/// Synthetic athlete following a `SimProfile`.
pub struct SimulatedForceSource<C: Clock> {
    profile: SimProfile,
    clock: C,
    started: Option<Instant>,
    rng: XorShift32,
}

impl<C: Clock> SimulatedForceSource<C> {
    pub fn new(profile: SimProfile, clock: C) -> Self {
        let rng = XorShift32::new(profile.seed);
        Self {
            profile,
            clock,
            started: None,
            rng,
        }
    }

    /// Noise-free force at `elapsed` since the first read, or None once `max_pulls` are done.
    fn force_at(&self, elapsed: Duration) -> Option<f64> {
        let p = &self.profile;
        if elapsed < p.lead_in {
            return Some(0.0);
        }
        let t = elapsed - p.lead_in;
        let period = p.period().as_secs_f64().max(f64::MIN_POSITIVE);
        let k_f = (t.as_secs_f64() / period).floor();
        let k = if k_f >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            k_f as u32
        };
        if let Some(max) = p.max_pulls
            && k >= max
        {
            return None;
        }
        let within = t.as_secs_f64() - k_f * period;
        if within < p.pull.as_secs_f64() {
            Some(p.pull_force(k))
        } else {
            Some(0.0)
        }
    }
}

impl<C: Clock> ForceSource for SimulatedForceSource<C> {
    fn read(&mut self, _timeout: Duration) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let now = self.clock.now();
        let started = *self.started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started);
        let Some(base) = self.force_at(elapsed) else {
            return Err(Box::new(HwError::Exhausted));
        };
        let noise = (self.rng.next_f64() - 0.5) * self.profile.noise_kg;
        let force = (base + noise).max(0.0);
        tracing::trace!(force, "simulated reading");
        Ok(force)
    }
}

/// Replays `(offset, force_kg)` points, pacing them on the clock relative to the first read.
pub struct TraceForceSource<C: Clock> {
    points: Vec<(Duration, f64)>,
    idx: usize,
    clock: C,
    started: Option<Instant>,
}

impl<C: Clock> TraceForceSource<C> {
    /// Build from `(t_ms, force_kg)` pairs. Times are taken relative to the first pair.
    pub fn from_ms(points: impl IntoIterator<Item = (u64, f64)>, clock: C) -> Self {
        let raw: Vec<(u64, f64)> = points.into_iter().collect();
        let t0 = raw.first().map(|p| p.0).unwrap_or(0);
        let points = raw
            .into_iter()
            .map(|(t, f)| (Duration::from_millis(t.saturating_sub(t0)), f))
            .collect();
        Self {
            points,
            idx: 0,
            clock,
            started: None,
        }
    }

    /// Points not yet replayed.
    pub fn remaining(&self) -> usize {
        self.points.len().saturating_sub(self.idx)
    }
}

impl<C: Clock> ForceSource for TraceForceSource<C> {
    fn read(&mut self, timeout: Duration) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let Some(&(offset, force)) = self.points.get(self.idx) else {
            return Err(Box::new(HwError::Exhausted));
        };
        let started = *self.started.get_or_insert_with(|| self.clock.now());
        wait_until_due(&self.clock, started + offset, timeout)?;
        self.idx += 1;
        Ok(force)
    }
}
