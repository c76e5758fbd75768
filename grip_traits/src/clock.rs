use std::thread;
use std::time::{Duration, Instant, SystemTime};

/// Clock abstraction for protocol timing and sample timestamps.
///
/// - now(): returns a monotonic Instant
/// - wall_now(): wall-clock time used to stamp force samples
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - ms_since(): helper to compute elapsed milliseconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Wall-clock time. Defaults to the system clock.
    fn wall_now(&self) -> SystemTime {
        SystemTime::now()
    }

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Protocol-time view of another clock.
///
/// One protocol second lasts `tick` on the inner clock, so a fast-forwarded
/// run (tick < 1 s) still reports readings, sleeps and timeouts in protocol
/// seconds. `now()` and `wall_now()` advance at `1 s / tick` times the inner
/// rate from the moment the adapter is built; `sleep(d)` sleeps `d` protocol
/// time. Clones share the same origin.
#[derive(Debug, Clone)]
pub struct ScaledClock<C: Clock> {
    inner: C,
    tick_ns: u128,
    origin: Instant,
    wall_origin: SystemTime,
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn scale(d: Duration, num: u128, den: u128) -> Duration {
    let ns = d.as_nanos().saturating_mul(num) / den.max(1);
    let secs = u64::try_from(ns / NANOS_PER_SEC).unwrap_or(u64::MAX);
    let sub = u32::try_from(ns % NANOS_PER_SEC).unwrap_or(0);
    Duration::new(secs, sub)
}

impl<C: Clock> ScaledClock<C> {
    pub fn new(inner: C, tick: Duration) -> Self {
        let tick_ns = tick.as_nanos().max(1);
        let origin = inner.now();
        let wall_origin = inner.wall_now();
        Self {
            inner,
            tick_ns,
            origin,
            wall_origin,
        }
    }

    /// Inner-clock duration to protocol duration.
    pub fn to_protocol(&self, real: Duration) -> Duration {
        scale(real, NANOS_PER_SEC, self.tick_ns)
    }

    /// Protocol duration to inner-clock duration.
    pub fn to_real(&self, protocol: Duration) -> Duration {
        scale(protocol, self.tick_ns, NANOS_PER_SEC)
    }

    fn elapsed(&self) -> Duration {
        self.to_protocol(self.inner.now().saturating_duration_since(self.origin))
    }
}

impl<C: Clock> Clock for ScaledClock<C> {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn wall_now(&self) -> SystemTime {
        self.wall_origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.inner.sleep(self.to_real(d));
    }
}

pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Deterministic clock whose time only moves when advanced.
    ///
    /// now() = origin + offset, wall_now() = wall_origin + offset.
    /// sleep(d) advances internal time by d without actually sleeping.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        wall_origin: SystemTime,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                wall_origin: SystemTime::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Start the wall clock at a fixed point (handy for reproducible timestamps).
        pub fn with_wall_origin(wall_origin: SystemTime) -> Self {
            Self {
                wall_origin,
                ..Self::new()
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Set the absolute offset relative to origin.
        pub fn set_offset(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = d;
            }
        }

        fn offset(&self) -> Duration {
            self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.offset()
        }

        fn wall_now(&self) -> SystemTime {
            self.wall_origin + self.offset()
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

}
