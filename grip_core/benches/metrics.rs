use chrono::{Duration, TimeZone, Utc};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use grip_core::metrics::{critical_force, w_prime};
use grip_core::{Cycle, Sample};

// Synthetic 24-cycle session sampled at 10 Hz: 7 s pulls decaying towards 18 kg, 3 s rests
fn synth_session(seed: u32) -> (Vec<Cycle>, Vec<Sample>) {
    let mut state = seed.max(1);
    let mut noise = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (f64::from(x) / (f64::from(u32::MAX) + 1.0)) - 0.5
    };
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut all = Vec::new();
    let mut cycles = Vec::new();
    let mut ms = 0i64;
    for k in 0..24u32 {
        let level = 18.0 + 22.0 * (-f64::from(k) / 6.0).exp();
        let mut pull = Vec::new();
        for _ in 0..70 {
            let s = Sample::new(level + noise(), t0 + Duration::milliseconds(ms));
            pull.push(s.clone());
            all.push(s);
            ms += 100;
        }
        for _ in 0..30 {
            all.push(Sample::new(noise().abs(), t0 + Duration::milliseconds(ms)));
            ms += 100;
        }
        cycles.push(Cycle::new(k + 1, pull));
    }
    (cycles, all)
}

pub fn bench_metrics(c: &mut Criterion) {
    let mut g = c.benchmark_group("metrics");
    // BENCH_SAMPLE_SIZE=10 cargo bench -p grip_core --bench metrics
    if let Some(n) = std::env::var("BENCH_SAMPLE_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        g.sample_size(n.max(10));
    } else {
        g.sample_size(50);
    }

    let (cycles, samples) = synth_session(0x5eed);
    g.bench_function("critical_force_24", |b| {
        b.iter(|| black_box(critical_force(black_box(&cycles))));
    });
    let cf = critical_force(&cycles);
    g.bench_function("w_prime_session", |b| {
        b.iter(|| black_box(w_prime(black_box(&samples), cf)));
    });
    g.bench_function("w_prime_shuffled", |b| {
        b.iter_batched(
            || {
                let mut s = samples.clone();
                s.reverse();
                s
            },
            |s| black_box(w_prime(&s, cf)),
            BatchSize::SmallInput,
        );
    });
    g.finish();
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
