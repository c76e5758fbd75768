//! Background force sampling.
//!
//! Spawns a thread that owns the `ForceSource`, stamps every reading with the
//! clock's wall time and publishes it through a `Fanout` to each registered
//! sink (the runner, a live display, a recorder). Paced and event-driven
//! variants are provided.
//!
//! Pass a `grip_traits::ScaledClock` when protocol seconds are not real
//! seconds: the pacing period and the timestamps are then protocol time, so
//! metrics integrated over the timestamps do not depend on the tick.
//!
//! Each `Sampler` spawns exactly one thread, shut down and joined when the
//! `Sampler` is dropped. The thread also exits on its own once the source
//! reports it is closed or every sink has gone away; either way the sinks
//! observe a disconnected channel.
use chrono::{DateTime, Utc};
use crossbeam_channel as xch;
use grip_traits::ForceSource;
use grip_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::hw_error::map_source_error;

/// One timestamped reading as delivered to sinks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceReading {
    /// kg
    pub force: f64,
    pub timestamp: DateTime<Utc>,
}

struct Sink {
    tx: xch::Sender<ForceReading>,
    /// Lossy sinks drop readings when full instead of blocking the sampler.
    lossy: bool,
}

/// Delivers one upstream reading to every registered sink.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Sink>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink that receives every reading.
    pub fn subscribe(&mut self) -> xch::Receiver<ForceReading> {
        let (tx, rx) = xch::unbounded();
        self.sinks.push(Sink { tx, lossy: false });
        rx
    }

    /// Register a bounded sink that skips readings while it is full (live displays).
    pub fn subscribe_lossy(&mut self, capacity: usize) -> xch::Receiver<ForceReading> {
        let (tx, rx) = xch::bounded(capacity.max(1));
        self.sinks.push(Sink { tx, lossy: true });
        rx
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send `reading` to every sink, forgetting the ones whose receiver is gone.
    /// Returns the number of sinks still connected.
    pub fn publish(&mut self, reading: ForceReading) -> usize {
        self.sinks.retain(|sink| {
            let res = if sink.lossy {
                match sink.tx.try_send(reading) {
                    Ok(()) | Err(xch::TrySendError::Full(_)) => Ok(()),
                    Err(xch::TrySendError::Disconnected(_)) => Err(()),
                }
            } else {
                sink.tx.send(reading).map_err(|_| ())
            };
            res.is_ok()
        });
        self.sinks.len()
    }
}

pub struct Sampler {
    readings: Arc<AtomicU64>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Rate-paced sampler: read, publish, then sleep one period of `hz`.
    pub fn spawn<S, C>(source: S, hz: u32, timeout: Duration, clock: C, fanout: Fanout) -> Self
    where
        S: ForceSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let period = Duration::from_micros(crate::util::period_us(hz));
        Self::start(source, Some(period), timeout, clock, fanout)
    }

    /// Event-driven sampler: rely on the source's own timing and add no sleeps.
    /// `source.read(timeout)` should block until a reading arrives or the timeout expires.
    pub fn spawn_event<S, C>(source: S, timeout: Duration, clock: C, fanout: Fanout) -> Self
    where
        S: ForceSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        Self::start(source, None, timeout, clock, fanout)
    }

    fn start<S, C>(
        mut source: S,
        period: Option<Duration>,
        timeout: Duration,
        clock: C,
        mut fanout: Fanout,
    ) -> Self
    where
        S: ForceSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let readings = Arc::new(AtomicU64::new(0));
        let readings_clone = readings.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("Sampler thread received shutdown signal");
                    break;
                }

                match source.read(timeout) {
                    Ok(force) => {
                        let reading = ForceReading {
                            force,
                            timestamp: DateTime::<Utc>::from(clock.wall_now()),
                        };
                        if fanout.publish(reading) == 0 {
                            tracing::debug!("All sampler sinks disconnected, exiting thread");
                            break;
                        }
                        readings_clone.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        let err = map_source_error(&*e);
                        if err.is_terminal() {
                            tracing::info!(error = %err, "force source ended");
                            break;
                        }
                        tracing::trace!(error = %err, "skipping failed read");
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                if let Some(p) = period {
                    clock.sleep(p);
                }
            }
            tracing::trace!("Sampler thread exiting cleanly");
        });

        Self {
            readings,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Readings published so far.
    pub fn readings(&self) -> u64 {
        self.readings.load(Ordering::Relaxed)
    }

    /// True once the thread has exited (source ended, sinks gone, or shutdown).
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(std::thread::JoinHandle::is_finished)
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // A blocked read returns within the source timeout, then the flag is seen.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("Sampler thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "Sampler thread panicked during shutdown");
                }
            }
        }
    }
}
