#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<grip_config::Config>(data)
        && cfg.validate().is_ok()
    {
        // A validated protocol must always build an engine
        let protocol = grip_core::ProtocolCfg::from(&cfg.protocol);
        assert!(grip_core::Engine::new(protocol).is_ok());
    }
});
