use std::time::{Duration, Instant};

use grip_traits::Clock;

use crate::error::{HwError, Result};

/// Sleep on `clock` until `due`, unless that is further away than `timeout`,
/// in which case sleep for `timeout` and report `HwError::Timeout`.
pub fn wait_until_due<C: Clock + ?Sized>(clock: &C, due: Instant, timeout: Duration) -> Result<()> {
    let wait = due.saturating_duration_since(clock.now());
    if wait > timeout {
        clock.sleep(timeout);
        return Err(HwError::Timeout);
    }
    clock.sleep(wait);
    Ok(())
}

/// Tiny xorshift PRNG returning values in [0, 1). Deterministic per seed.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_f64(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    }
}
