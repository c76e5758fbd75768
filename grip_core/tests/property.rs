use chrono::{DateTime, Duration, TimeZone, Utc};
use grip_core::metrics::{critical_force, w_prime};
use grip_core::{Cycle, Engine, Phase, Sample};
use proptest::prelude::*;

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::milliseconds(ms)
}

prop_compose! {
    fn samples_strategy()(
        points in prop::collection::vec((0i64..600_000, 0.0f64..120.0), 0..200),
    ) -> Vec<Sample> {
        points.into_iter().map(|(ms, f)| Sample::new(f, at(ms))).collect()
    }
}

proptest! {
    #[test]
    fn w_prime_is_never_negative(samples in samples_strategy(), cf in 0.0f64..150.0) {
        prop_assert!(w_prime(&samples, cf) >= 0.0);
    }

    #[test]
    fn w_prime_is_zero_when_nothing_exceeds_cf(samples in samples_strategy()) {
        let cf = samples.iter().map(|s| s.force).fold(0.0, f64::max);
        prop_assert_eq!(w_prime(&samples, cf), 0.0);
    }

    #[test]
    fn critical_force_is_bounded_by_last_six(avgs in prop::collection::vec(0.0f64..100.0, 1..40)) {
        let cycles: Vec<Cycle> = avgs
            .iter()
            .enumerate()
            .map(|(i, &a)| Cycle {
                id: uuid::Uuid::new_v4(),
                cycle_number: u32::try_from(i + 1).unwrap(),
                samples: Vec::new(),
                average_force: a,
            })
            .collect();
        let tail = &avgs[avgs.len().saturating_sub(6)..];
        let lo = tail.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let cf = critical_force(&cycles);
        prop_assert!(cf >= lo - 1e-9 && cf <= hi + 1e-9);
    }

    /// Random interleavings of samples and ticks never break the cycle bookkeeping.
    #[test]
    fn engine_bookkeeping_holds(events in prop::collection::vec(prop::option::of(0.0f64..20.0), 0..800)) {
        let mut e = Engine::default();
        e.start();
        let mut t = 0;
        for ev in events {
            let closed_before = e.cycles().len();
            let phase_before = e.phase();
            match ev {
                Some(f) => e.submit(f, at(t)),
                None => { e.tick(); }
            }
            t += 100;
            let closed_after = e.cycles().len();
            prop_assert!(closed_after == closed_before || closed_after == closed_before + 1);
            if closed_after > closed_before {
                prop_assert_eq!(phase_before, Phase::Working);
                prop_assert_eq!(e.phase(), Phase::Resting);
                let c = e.cycles().last().unwrap();
                prop_assert_eq!(c.cycle_number as usize, closed_after);
                let mean = if c.samples.is_empty() {
                    0.0
                } else {
                    c.samples.iter().map(|s| s.force).sum::<f64>() / c.samples.len() as f64
                };
                prop_assert!((c.average_force - mean).abs() < 1e-9);
            }
            prop_assert!(e.completed_cycles() <= 24);
        }
    }
}
