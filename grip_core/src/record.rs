//! Samples, cycles and the persisted assessment record.
//!
//! Records keep every sample (not just summaries) so critical force and W′
//! can be re-derived later with `AssessmentRecord::recompute`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics;

/// One force reading in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    pub force: f64,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(force: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            force,
            timestamp,
        }
    }
}

/// A closed work phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Uuid,
    /// 1-based
    pub cycle_number: u32,
    pub samples: Vec<Sample>,
    pub average_force: f64,
}

impl Cycle {
    pub fn new(cycle_number: u32, samples: Vec<Sample>) -> Self {
        let average_force = metrics::cycle_average(&samples);
        Self {
            id: Uuid::new_v4(),
            cycle_number,
            samples,
            average_force,
        }
    }

    pub fn peak_force(&self) -> f64 {
        metrics::peak_force(&self.samples)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal data of a finished engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentOutcome {
    pub cycles: Vec<Cycle>,
    pub completed_cycles: u32,
    pub all_samples: Vec<Sample>,
    pub last_force: f64,
    /// True when the protocol was cut short by `finish_early`.
    pub finished_early: bool,
}

/// A saved critical force assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub hand: Hand,
    /// Athlete bodyweight (kg)
    pub bodyweight: f64,
    /// kg
    pub critical_force: f64,
    /// kg·s
    pub w_prime: f64,
    pub cycles: Vec<Cycle>,
    pub completed_cycles: u32,
    pub all_samples: Vec<Sample>,
}

impl AssessmentRecord {
    /// Build a record from a finished engine's outcome, deriving critical force over the
    /// last `cf_window` cycles and W′ over every sample.
    pub fn from_outcome(
        outcome: AssessmentOutcome,
        hand: Hand,
        bodyweight: f64,
        cf_window: usize,
    ) -> Self {
        let critical_force = metrics::critical_force_over(&outcome.cycles, cf_window);
        let w_prime = metrics::w_prime(&outcome.all_samples, critical_force);
        tracing::info!(
            %hand,
            completed = outcome.completed_cycles,
            critical_force,
            w_prime,
            "assessment record built"
        );
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            hand,
            bodyweight,
            critical_force,
            w_prime,
            cycles: outcome.cycles,
            completed_cycles: outcome.completed_cycles,
            all_samples: outcome.all_samples,
        }
    }

    /// Re-derive critical force and W′ from the stored cycles and samples.
    pub fn recompute(&mut self, cf_window: usize) {
        self.critical_force = metrics::critical_force_over(&self.cycles, cf_window);
        self.w_prime = metrics::w_prime(&self.all_samples, self.critical_force);
    }

    /// Critical force as a fraction of bodyweight, if bodyweight is known.
    pub fn relative_critical_force(&self) -> Option<f64> {
        (self.bodyweight.is_finite() && self.bodyweight > 0.0)
            .then(|| self.critical_force / self.bodyweight)
    }

    /// Highest single reading of the whole assessment.
    pub fn peak_force(&self) -> f64 {
        metrics::peak_force(&self.all_samples)
    }
}

/// A saved max force test: the single highest pull of one hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxForceRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub hand: Hand,
    /// kg
    pub max_force: f64,
}

impl MaxForceRecord {
    pub fn new(hand: Hand, max_force: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            hand,
            max_force,
        }
    }

    /// Record the peak of a measured sample stream (0 when empty).
    pub fn from_samples(hand: Hand, samples: &[Sample]) -> Self {
        let max_force = metrics::peak_force(samples);
        tracing::info!(%hand, max_force, samples = samples.len(), "max force record built");
        Self::new(hand, max_force)
    }
}
