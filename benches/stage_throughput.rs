//! Stage Throughput Benchmarks
//!
//! Measures baseline performance of the channel engine:
//! - Single `run_wait` round trip through a two-stage pipeline
//! - Sustained throughput under fire-and-forget `run`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

// Layer 1: Standard library imports
use std::hint::black_box;
use std::time::Duration;

// Layer 2: Third-party crate imports
use criterion::{criterion_group, criterion_main, Criterion};

// Layer 3: Internal module imports
use papaline::{pipeline, plain, stage, Args, StageOptions};

fn inc_double_pipeline() -> std::sync::Arc<papaline::Pipeline<i64>> {
    let inc = stage(
        |args: Args<i64>| async move { Ok::<_, std::convert::Infallible>(plain(args[0] + 1)) },
        StageOptions::default().with_name("inc"),
    );
    let double = stage(
        |args: Args<i64>| async move { Ok::<_, std::convert::Infallible>(plain(args[0] * 2)) },
        StageOptions::default().with_name("double"),
    );
    pipeline(vec![inc, double], None)
}

fn run_wait_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let p = rt.block_on(async { inc_double_pipeline() });

    c.bench_function("run_wait_round_trip", |b| {
        b.to_async(&rt).iter(|| async {
            let result = p.run_wait(vec![1]).await.unwrap();
            black_box(result);
        });
    });

    rt.block_on(p.stop());
}

fn sustained_run_throughput(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let p = rt.block_on(async { inc_double_pipeline() });

    c.bench_function("sustained_run_throughput", |b| {
        b.to_async(&rt).iter(|| async {
            for i in 0..100 {
                p.run(vec![i]).await;
            }
        });
    });

    rt.block_on(p.stop());
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(2))
        .without_plots()
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = run_wait_round_trip, sustained_run_throughput
}

criterion_main!(benches);
