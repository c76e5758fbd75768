#![no_main]
use chrono::{Duration, TimeZone, Utc};
use grip_core::metrics::w_prime;
use grip_core::{Engine, Sample};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (f64, Vec<(u32, f64, bool)>)| {
    let (cf, events) = input;
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    // Feed the engine arbitrary samples and ticks; bookkeeping must stay bounded.
    let mut engine = Engine::default();
    engine.start();
    for &(ms, force, tick) in &events {
        if tick {
            engine.tick();
        } else {
            engine.submit(force.clamp(-1e6, 1e6), t0 + Duration::milliseconds(i64::from(ms)));
        }
        assert!(engine.completed_cycles() <= 24);
    }

    let samples: Vec<Sample> = engine.samples().to_vec();
    if cf.is_finite() && cf.abs() < 1e6 {
        assert!(w_prime(&samples, cf) >= 0.0);
    }
});
