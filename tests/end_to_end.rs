//! End-to-end scenarios exercising the public API as a black box: the five
//! concrete pipelines described alongside the invariants, plus the
//! backpressure and sliding-discipline properties that need multiple
//! stages wired together to observe.

#![allow(clippy::unwrap_used)]

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use papaline::{
    abort, fork, join, pipeline, plain, pool_pipeline, stage, Args, Control, PipelineError,
    PoolConfig, RejectionPolicy, StageOptions, WorkerPool,
};

fn inc_stage() -> papaline::Stage<i64> {
    stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(plain(args[0] + 1)) },
        StageOptions::default().with_name("inc"),
    )
}

fn double_stage() -> papaline::Stage<i64> {
    stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(plain(args[0] * 2)) },
        StageOptions::default().with_name("double"),
    )
}

#[tokio::test]
async fn inc_then_double_is_eight() {
    let p = pipeline(vec![inc_stage(), double_stage()], None);
    let result = p.run_wait(vec![3]).await.unwrap();
    assert_eq!(result, vec![8]);
    p.stop().await;
}

#[tokio::test]
async fn fan_out_then_identity_then_join_collects_all_branches() {
    let splitter = stage(
        |args: Args<i64>| async move {
            let n = args[0];
            Ok::<_, Infallible>(fork((1..=n).collect()))
        },
        StageOptions::default().with_name("splitter"),
    );
    let identity = stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(Control::Plain(args)) },
        StageOptions::default().with_name("identity"),
    );
    let joiner = stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(join(args[0])) },
        StageOptions::default().with_name("joiner"),
    );

    let p = pipeline(vec![splitter, identity, joiner], None);
    let mut result = p.run_wait(vec![3]).await.unwrap();
    result.sort_unstable();
    assert_eq!(result, vec![1, 2, 3]);
    p.stop().await;
}

#[tokio::test]
async fn abort_returns_its_value_without_invoking_later_stages() {
    let never_called = Arc::new(AtomicUsize::new(0));
    let never_called2 = Arc::clone(&never_called);

    let aborting = stage(
        |_args: Args<i64>| async move { Ok::<_, Infallible>(abort(vec![-1])) },
        StageOptions::default().with_name("aborter"),
    );
    let never = stage(
        move |args: Args<i64>| {
            never_called2.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, Infallible>(plain(args[0])) }
        },
        StageOptions::default().with_name("never-called"),
    );

    let p = pipeline(vec![aborting, never], None);
    let result = p.run_wait(vec![999]).await.unwrap();
    assert_eq!(result, vec![-1]);
    assert_eq!(never_called.load(Ordering::SeqCst), 0);
    p.stop().await;
}

#[tokio::test]
async fn thrown_error_re_raises_and_notifies_handler_once() {
    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    let handler_calls = Arc::new(std::sync::Mutex::new(Vec::new()));
    let handler_calls2 = Arc::clone(&handler_calls);
    let handler: papaline::ErrorHandler<i64> =
        Arc::new(move |err| handler_calls2.lock().unwrap().push(err));

    let boomer = stage(
        |_args: Args<i64>| async move { Err::<Control<i64>, Boom>(Boom) },
        StageOptions::default().with_name("boomer"),
    );
    let p = pipeline(vec![boomer], Some(handler));
    let result = p.run_wait(vec![1]).await;
    assert!(matches!(result, Err(PipelineError::Stage(_))));
    if let Err(PipelineError::Stage(err)) = result {
        assert_eq!(err.source.to_string(), "boom");
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    let calls = handler_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].stage_name, "boomer");
    assert_eq!(calls[0].input_args, vec![1]);
    p.stop().await;
}

#[tokio::test]
async fn pool_engine_discard_oldest_keeps_accepted_invocations_correct() {
    let pool = WorkerPool::new(PoolConfig {
        workers: 1,
        queue_capacity: 8,
        rejection_policy: RejectionPolicy::DiscardOldest,
    });
    let pp = pool_pipeline(vec![inc_stage(), double_stage()], Arc::clone(&pool), None);

    let mut accepted = Vec::new();
    for i in 0..8 {
        accepted.push(pp.run_wait(vec![i]).await);
    }
    for (i, result) in accepted.into_iter().enumerate() {
        assert_eq!(result.unwrap(), vec![(i as i64 + 1) * 2]);
    }

    pool.shutdown();
    pool.join();
}

#[tokio::test]
async fn backpressure_bounds_in_flight_items_to_stage_capacity() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let in_flight2 = Arc::clone(&in_flight);
    let peak2 = Arc::clone(&peak);

    let slow = stage(
        move |args: Args<i64>| {
            let in_flight = Arc::clone(&in_flight2);
            let peak = Arc::clone(&peak2);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, Infallible>(plain(args[0]))
            }
        },
        StageOptions::default()
            .with_name("slow")
            .with_capacity(1)
            .with_discipline(papaline::Discipline::Block),
    );

    let p = pipeline(vec![slow], None);
    for i in 0..5 {
        p.run(vec![i]).await;
    }
    tokio::time::sleep(Duration::from_millis(150)).await;

    // One producer, one stage, one in-flight work task: never more than 3
    // items are live at once under capacity-1 block discipline.
    assert!(peak.load(Ordering::SeqCst) <= 3);
    p.stop().await;
}

#[tokio::test]
async fn sliding_discipline_keeps_only_the_most_recent_enqueues() {
    let release = Arc::new(tokio::sync::Notify::new());
    let release2 = Arc::clone(&release);
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen2 = Arc::clone(&seen);

    // The first context to arrive parks the single work task on `release`,
    // giving time for five more enqueues to contend for the capacity-2
    // sliding queue behind it before anything is drained.
    let stalling = stage(
        move |args: Args<i64>| {
            let release = Arc::clone(&release2);
            let seen = Arc::clone(&seen2);
            async move {
                if args[0] == 0 {
                    release.notified().await;
                }
                seen.lock().unwrap().push(args[0]);
                Ok::<_, Infallible>(plain(args[0]))
            }
        },
        StageOptions::default()
            .with_name("stalling")
            .with_capacity(2)
            .with_discipline(papaline::Discipline::Sliding)
            .with_inline(true),
    );

    let p = pipeline(vec![stalling], None);
    p.run(vec![0]).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    for i in 1..=5 {
        p.run(vec![i]).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    release.notify_waiters();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let seen = seen.lock().unwrap();
    // The first (gating) item plus whichever two survived the sliding
    // eviction while it was stalled.
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], 0);
    assert_eq!(&seen[1..], &[4, 5]);
    p.stop().await;
}
