//! Benchmarks for the per-tick hot path
//!
//! Run with: cargo bench --bench estimator

use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use server_optimizer::config::OptimizerConfig;
use server_optimizer::metrics::Metrics;
use server_optimizer::monitor::tps::TpsEstimator;
use server_optimizer::optimizer::ServerOptimizer;
use server_optimizer::sim::{SimConfig, SimEvent, SimulatedHost};

/// Estimator with a full window of jittered tick durations
fn filled_estimator() -> TpsEstimator {
    let mut estimator = TpsEstimator::new(Instant::now());
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        estimator.record_duration(Duration::from_micros(rng.gen_range(45_000..80_000)));
    }
    estimator
}

/// Benchmark TPS calculation over the full window
fn bench_calculate_tps(c: &mut Criterion) {
    let estimator = filled_estimator();

    c.bench_function("calculate_tps", |b| {
        b.iter(|| black_box(estimator.calculate_tps()))
    });
}

/// Benchmark one recorded tick followed by a history sample
fn bench_record_and_sample(c: &mut Criterion) {
    let mut estimator = filled_estimator();
    let mut now = Instant::now();

    c.bench_function("record_and_sample", |b| {
        b.iter(|| {
            now += Duration::from_millis(50);
            estimator.record_tick(now);
            black_box(estimator.sample())
        })
    });
}

/// Benchmark p95 tick time, which sorts the window
fn bench_p95(c: &mut Criterion) {
    let estimator = filled_estimator();

    c.bench_function("p95_tick_duration", |b| {
        b.iter(|| black_box(estimator.p95_tick_duration()))
    });
}

/// Benchmark a full optimizer tick at various player counts
fn bench_optimizer_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer_tick");
    group.sample_size(50);

    for players in [0usize, 50, 150] {
        let host = SimulatedHost::new(SimConfig {
            max_players: players,
            join_chance: 1.0,
            quit_chance: 0.0,
            spike_chance: 0.0,
            seed: Some(42),
            ..SimConfig::default()
        });
        let metrics = Arc::new(Metrics::new());
        let mut optimizer = ServerOptimizer::new(OptimizerConfig::default(), host, metrics);
        optimizer.init();

        // Fill the server and the estimator window
        for _ in 0..(players + 200) {
            let events = optimizer.host().step();
            for event in events {
                if let SimEvent::Joined(player) = event {
                    optimizer.on_player_join(player.as_ref());
                }
            }
            optimizer.tick();
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("players", players), &players, |b, _| {
            b.iter(|| {
                optimizer.host().step();
                optimizer.tick();
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_calculate_tps,
    bench_record_and_sample,
    bench_p95,
    bench_optimizer_tick,
);
criterion_main!(benches);
