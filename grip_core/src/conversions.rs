//! `From` implementations bridging `grip_config` types to `grip_core` types.

use std::time::Duration;

use crate::config::{ProtocolCfg, RunParams, SamplingMode};

impl From<&grip_config::ProtocolCfg> for ProtocolCfg {
    fn from(c: &grip_config::ProtocolCfg) -> Self {
        Self {
            force_threshold_kg: c.force_threshold_kg,
            work_secs: c.work_secs,
            rest_secs: c.rest_secs,
            total_cycles: c.total_cycles,
            end_warning_secs: c.end_warning_secs,
            cf_window: c.cf_window,
            early_finish_min_cycles: c.early_finish_min_cycles,
        }
    }
}

impl From<&grip_config::RunnerCfg> for SamplingMode {
    fn from(c: &grip_config::RunnerCfg) -> Self {
        match c.mode {
            grip_config::SamplingMode::Paced => SamplingMode::Paced(c.sample_rate_hz),
            grip_config::SamplingMode::Event => SamplingMode::Event,
        }
    }
}

impl From<&grip_config::Config> for RunParams {
    fn from(c: &grip_config::Config) -> Self {
        Self {
            protocol: ProtocolCfg::from(&c.protocol),
            tick: Duration::from_millis(c.runner.tick_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_default_params() {
        let cfg = grip_config::Config::default();
        let params = RunParams::from(&cfg);
        assert_eq!(params.protocol, ProtocolCfg::default());
        assert_eq!(params.tick, Duration::from_secs(1));
        assert_eq!(SamplingMode::from(&cfg.runner), SamplingMode::Paced(10));
    }
}
