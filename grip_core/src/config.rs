//! Runtime configuration for the assessment engine and runner.
//!
//! These are separate from the TOML-deserialized config in `grip_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

use crate::error::{BuildError, Result};

/// Default force (kg) that counts as "starting to pull".
pub const FORCE_THRESHOLD_KG: f64 = 5.0;
/// Default work phase length in protocol seconds.
pub const WORK_SECS: u32 = 7;
/// Default rest phase length in protocol seconds.
pub const REST_SECS: u32 = 3;
/// Default (and longest) protocol length in work/rest cycles.
pub const TOTAL_CYCLES: u32 = 24;
/// Seconds left in a work phase when the end warning fires.
pub const END_WARNING_SECS: u32 = 3;
/// Trailing cycles averaged into the critical force.
pub const CF_WINDOW: usize = 6;
/// Completed cycles after which an early finish still yields a usable result.
pub const EARLY_FINISH_MIN_CYCLES: u32 = 16;

/// Protocol parameters consumed by `Engine`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolCfg {
    pub force_threshold_kg: f64,
    pub work_secs: u32,
    pub rest_secs: u32,
    pub total_cycles: u32,
    /// 0 disables the end warning.
    pub end_warning_secs: u32,
    pub cf_window: usize,
    pub early_finish_min_cycles: u32,
}

impl Default for ProtocolCfg {
    fn default() -> Self {
        Self {
            force_threshold_kg: FORCE_THRESHOLD_KG,
            work_secs: WORK_SECS,
            rest_secs: REST_SECS,
            total_cycles: TOTAL_CYCLES,
            end_warning_secs: END_WARNING_SECS,
            cf_window: CF_WINDOW,
            early_finish_min_cycles: EARLY_FINISH_MIN_CYCLES,
        }
    }
}

impl ProtocolCfg {
    /// Reject parameters the state machine cannot run.
    pub fn validate(&self) -> Result<()> {
        if !(self.force_threshold_kg.is_finite() && self.force_threshold_kg > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "force_threshold_kg must be > 0",
            )));
        }
        if self.work_secs == 0 || self.rest_secs == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "work_secs and rest_secs must be >= 1",
            )));
        }
        if self.total_cycles == 0 || self.total_cycles > TOTAL_CYCLES {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "total_cycles must be between 1 and 24",
            )));
        }
        if self.end_warning_secs >= self.work_secs {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "end_warning_secs must be < work_secs",
            )));
        }
        if self.cf_window == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "cf_window must be >= 1",
            )));
        }
        Ok(())
    }
}

/// How the sampler pulls readings from the force source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Rate-paced sampling at the given Hz
    Paced(u32),
    /// Block on the source; forward readings as they arrive
    Event,
}

/// Parameters for `runner::run`.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub protocol: ProtocolCfg,
    /// Wall-clock length of one protocol second
    pub tick: Duration,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            protocol: ProtocolCfg::default(),
            tick: Duration::from_secs(1),
        }
    }
}
