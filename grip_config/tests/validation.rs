use grip_config::{SamplingMode, load_toml};
use rstest::rstest;

#[test]
fn rejects_zero_work_secs() {
    let toml = r#"
[protocol]
force_threshold_kg = 5.0
work_secs = 0
rest_secs = 3
end_warning_secs = 0

[runner]
tick_ms = 1000
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject work_secs=0");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("protocol.work_secs must be >= 1")
    );
}

#[test]
fn accepts_partial_config_with_defaults() {
    let toml = r#"
[protocol]
total_cycles = 12

[runner]
tick_ms = 50
mode = "event"

[storage]
path = "/tmp/grip.json"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.protocol.total_cycles, 12);
    assert_eq!(cfg.protocol.work_secs, 7);
    assert_eq!(cfg.runner.mode, SamplingMode::Event);
    assert_eq!(cfg.runner.sample_rate_hz, 10);
}

#[rstest]
#[case("[protocol]\nforce_threshold_kg = 0.0", "force_threshold_kg must be > 0")]
#[case("[protocol]\nrest_secs = 0", "rest_secs must be >= 1")]
#[case("[protocol]\ntotal_cycles = 0\nearly_finish_min_cycles = 0", "total_cycles must be >= 1")]
#[case("[protocol]\nend_warning_secs = 7", "end_warning_secs must be < protocol.work_secs")]
#[case("[protocol]\ntotal_cycles = 25", "total_cycles must be <= 24")]
#[case("[protocol]\ncf_window = 0", "cf_window must be >= 1")]
#[case("[protocol]\nearly_finish_min_cycles = 30", "early_finish_min_cycles must be <=")]
#[case("[runner]\ntick_ms = 0", "tick_ms must be >= 1")]
#[case("[runner]\nsample_rate_hz = 0", "sample_rate_hz must be > 0")]
#[case("[sim]\ncritical_kg = 50.0\npeak_kg = 40.0", "critical_kg must be <= sim.peak_kg")]
#[case("[sim]\nfatigue_cycles = 0.0", "fatigue_cycles must be > 0")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "expected {needle:?} in {msg:?}");
}

#[test]
fn unknown_sampling_mode_is_a_parse_error() {
    let toml = "[runner]\nmode = \"burst\"";
    assert!(load_toml(toml).is_err());
}
