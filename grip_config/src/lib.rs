#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and force-trace parsing for the assessment tool.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional; an empty document yields the standard
//!   24 x (7 s work / 3 s rest) protocol.
//! - The trace CSV loader enforces headers and strictly increasing time so a
//!   recorded session can be replayed as a force source.
use serde::Deserialize;
use std::path::PathBuf;

/// Force trace CSV schema.
///
/// Expected headers:
/// t_ms,force_kg
///
/// Example:
/// t_ms,force_kg
/// 0,0.4
/// 100,12.5
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TraceRow {
    pub t_ms: u64,
    pub force_kg: f64,
}

/// Longest protocol a config may ask for, in cycles.
pub const MAX_CYCLES: u32 = 24;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProtocolCfg {
    /// Force (kg) that starts a work phase while waiting
    pub force_threshold_kg: f64,
    pub work_secs: u32,
    pub rest_secs: u32,
    /// Number of work/rest cycles in a full assessment
    pub total_cycles: u32,
    /// Seconds left in a work phase when the end warning fires (0 disables)
    pub end_warning_secs: u32,
    /// How many trailing cycles feed the critical force estimate
    pub cf_window: usize,
    /// Completed cycles required before an early finish is kept
    pub early_finish_min_cycles: u32,
}

impl Default for ProtocolCfg {
    fn default() -> Self {
        Self {
            force_threshold_kg: 5.0,
            work_secs: 7,
            rest_secs: 3,
            total_cycles: 24,
            end_warning_secs: 3,
            cf_window: 6,
            early_finish_min_cycles: 16,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Poll the source at `sample_rate_hz`
    #[default]
    Paced,
    /// Block on the source and forward readings as they arrive
    Event,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    /// Length of one protocol "second" in ms. 1000 for real sessions; lower to fast-forward a simulation.
    pub tick_ms: u64,
    pub mode: SamplingMode,
    pub sample_rate_hz: u32,
    /// Per-read source timeout, in protocol ms (scaled with `tick_ms` like every other source timing)
    pub read_timeout_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            mode: SamplingMode::Paced,
            sample_rate_hz: 10,
            read_timeout_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    /// Force of the first pull (kg)
    pub peak_kg: f64,
    /// Force the simulated athlete fatigues towards (kg)
    pub critical_kg: f64,
    /// Fatigue time constant, in cycles
    pub fatigue_cycles: f64,
    /// Peak-to-peak noise amplitude (kg)
    pub noise_kg: f64,
    pub seed: u32,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            peak_kg: 40.0,
            critical_kg: 18.0,
            fatigue_cycles: 6.0,
            noise_kg: 0.5,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageCfg {
    /// JSON file holding saved assessments. Default: `grip_assessments.json`.
    pub path: Option<PathBuf>,
}

impl StorageCfg {
    pub fn path_or_default(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from("grip_assessments.json"))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub protocol: ProtocolCfg,
    pub runner: RunnerCfg,
    pub sim: SimCfg,
    pub storage: StorageCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Check that trace rows are replayable: at least one row, finite non-negative
/// forces, strictly increasing time.
pub fn validate_trace(rows: &[TraceRow]) -> eyre::Result<()> {
    if rows.is_empty() {
        eyre::bail!("trace must contain at least one row");
    }
    for (i, row) in rows.iter().enumerate() {
        if !row.force_kg.is_finite() {
            eyre::bail!("trace row {} has a non-finite force", i + 2);
        }
        if row.force_kg < 0.0 {
            eyre::bail!("trace row {} has a negative force", i + 2);
        }
        if i > 0 && row.t_ms <= rows[i - 1].t_ms {
            eyre::bail!(
                "trace t_ms must be strictly increasing (rows {} and {})",
                i + 1,
                i + 2
            );
        }
    }
    Ok(())
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["t_ms", "force_kg"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 't_ms,force_kg', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_trace(&rows)?;
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Protocol
        let p = &self.protocol;
        if !(p.force_threshold_kg.is_finite() && p.force_threshold_kg > 0.0) {
            eyre::bail!("protocol.force_threshold_kg must be > 0");
        }
        if p.work_secs == 0 {
            eyre::bail!("protocol.work_secs must be >= 1");
        }
        if p.rest_secs == 0 {
            eyre::bail!("protocol.rest_secs must be >= 1");
        }
        if p.total_cycles == 0 {
            eyre::bail!("protocol.total_cycles must be >= 1");
        }
        if p.total_cycles > MAX_CYCLES {
            eyre::bail!("protocol.total_cycles must be <= {MAX_CYCLES}");
        }
        if p.end_warning_secs >= p.work_secs {
            eyre::bail!("protocol.end_warning_secs must be < protocol.work_secs");
        }
        if p.cf_window == 0 {
            eyre::bail!("protocol.cf_window must be >= 1");
        }
        if p.early_finish_min_cycles > p.total_cycles {
            eyre::bail!("protocol.early_finish_min_cycles must be <= protocol.total_cycles");
        }

        // Runner
        if self.runner.tick_ms == 0 {
            eyre::bail!("runner.tick_ms must be >= 1");
        }
        if self.runner.sample_rate_hz == 0 {
            eyre::bail!("runner.sample_rate_hz must be > 0");
        }
        if self.runner.read_timeout_ms == 0 {
            eyre::bail!("runner.read_timeout_ms must be >= 1");
        }

        // Simulator
        let s = &self.sim;
        if !(s.peak_kg.is_finite() && s.peak_kg >= 0.0) {
            eyre::bail!("sim.peak_kg must be >= 0");
        }
        if !(s.critical_kg.is_finite() && s.critical_kg >= 0.0) {
            eyre::bail!("sim.critical_kg must be >= 0");
        }
        if s.critical_kg > s.peak_kg {
            eyre::bail!("sim.critical_kg must be <= sim.peak_kg");
        }
        if !(s.fatigue_cycles.is_finite() && s.fatigue_cycles > 0.0) {
            eyre::bail!("sim.fatigue_cycles must be > 0");
        }
        if !(s.noise_kg.is_finite() && s.noise_kg >= 0.0) {
            eyre::bail!("sim.noise_kg must be >= 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of: never, daily, hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_standard_protocol() {
        let cfg = load_toml("").expect("empty toml parses");
        assert_eq!(cfg.protocol.total_cycles, 24);
        assert_eq!(cfg.protocol.work_secs, 7);
        assert_eq!(cfg.protocol.rest_secs, 3);
        assert!((cfg.protocol.force_threshold_kg - 5.0).abs() < f64::EPSILON);
        assert_eq!(cfg.runner.tick_ms, 1000);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn storage_path_defaults() {
        let cfg = Config::default();
        assert_eq!(
            cfg.storage.path_or_default(),
            PathBuf::from("grip_assessments.json")
        );
    }
}
