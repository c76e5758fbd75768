//! Test and helper force sources for grip_core

use std::collections::VecDeque;
use std::time::Duration;

/// A source that is already closed; the sampler exits on the first read.
pub struct NoopSource;

impl grip_traits::ForceSource for NoopSource {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop source closed")))
    }
}

/// Yields a fixed script of readings, then reports itself exhausted.
///
/// `None` entries produce a transient timeout, which the sampler skips.
pub struct ScriptedSource {
    script: VecDeque<Option<f64>>,
}

impl ScriptedSource {
    pub fn new(forces: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: forces.into_iter().map(Some).collect(),
        }
    }

    pub fn with_gaps(script: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl grip_traits::ForceSource for ScriptedSource {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        match self.script.pop_front() {
            Some(Some(f)) => Ok(f),
            Some(None) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "scripted read timeout",
            ))),
            None => Err(Box::new(std::io::Error::other("scripted source exhausted"))),
        }
    }
}
