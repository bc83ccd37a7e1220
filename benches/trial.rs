use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fast_bernoulli_sampler::BernoulliSampler;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const EVENTS: usize = 10_000;

fn bench_trial(c: &mut Criterion) {
    let mut group = c.benchmark_group("trial");

    for &probability in &[0.5, 0.01, 0.0001] {
        group.bench_function(format!("skip_count_p{}", probability), |b| {
            let mut sampler =
                BernoulliSampler::with_rng(probability, ChaCha8Rng::seed_from_u64(7)).unwrap();
            b.iter(|| {
                let mut sampled = 0;
                for _ in 0..EVENTS {
                    if sampler.trial() {
                        sampled += 1;
                    }
                }
                black_box(sampled)
            })
        });

        // Baseline: one uniform draw per event.
        group.bench_function(format!("per_event_draw_p{}", probability), |b| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            b.iter(|| {
                let mut sampled = 0;
                for _ in 0..EVENTS {
                    if rng.gen::<f64>() < black_box(probability) {
                        sampled += 1;
                    }
                }
                black_box(sampled)
            })
        });
    }
    group.finish();
}

fn bench_multi_trial(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_trial");

    let sizes = [16u32, 4096, 1 << 20];
    for &size in &sizes {
        group.bench_function(format!("bytes_{}", size), |b| {
            let mut sampler =
                BernoulliSampler::with_rng(1.0 / 8192.0, ChaCha8Rng::seed_from_u64(9)).unwrap();
            b.iter(|| black_box(sampler.multi_trial(black_box(size))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_trial, bench_multi_trial);
criterion_main!(benches);
