//! Critical force and W′ derivation over finished assessment data.
//!
//! All functions are total: degenerate inputs (no cycles, fewer than two
//! samples) return 0 instead of failing.

use crate::config::CF_WINDOW;
use crate::record::{Cycle, Sample};
use crate::util::secs_between;

/// Mean force of a sample set, 0 if empty.
pub fn cycle_average(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| s.force).sum();
    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    sum / n
}

/// Highest force in a sample set, 0 if empty.
pub fn peak_force(samples: &[Sample]) -> f64 {
    samples.iter().map(|s| s.force).fold(0.0, f64::max)
}

/// Critical force over the last six closed cycles.
pub fn critical_force(cycles: &[Cycle]) -> f64 {
    critical_force_over(cycles, CF_WINDOW)
}

/// Mean of `average_force` over the trailing `window` cycles (all of them if
/// fewer exist). A window of 0 is treated as 1.
pub fn critical_force_over(cycles: &[Cycle], window: usize) -> f64 {
    if cycles.is_empty() {
        return 0.0;
    }
    let take = window.max(1).min(cycles.len());
    let tail = &cycles[cycles.len() - take..];
    let sum: f64 = tail.iter().map(|c| c.average_force).sum();
    #[allow(clippy::cast_precision_loss)]
    let n = take as f64;
    (sum / n).max(0.0)
}

/// Work capacity above `critical_force`, in kg·s.
///
/// Samples are ordered by timestamp before integrating, so callers may pass
/// the history as recorded. The integrand is `max(0, force - critical_force)`
/// and each pair contributes a trapezoid.
pub fn w_prime(samples: &[Sample], critical_force: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mut ordered: Vec<&Sample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let above = |s: &Sample| (s.force - critical_force).max(0.0);
    ordered
        .windows(2)
        .map(|pair| {
            let dt = secs_between(pair[0].timestamp, pair[1].timestamp);
            0.5 * (above(pair[0]) + above(pair[1])) * dt
        })
        .sum()
}
