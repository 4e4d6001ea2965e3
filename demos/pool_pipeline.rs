//! Pool Pipeline - Fixed Worker Threads with a Bounded Submission Queue
//!
//! Demonstrates the pool engine: a shared `WorkerPool` of named OS threads
//! servicing a bounded submission queue, with each accepted invocation
//! walking the whole stage list inline on one worker.
//!
//! Run with: cargo run --example pool_pipeline

use papaline::{plain, pool_pipeline, stage, Args, PoolConfig, RejectionPolicy, StageOptions, WorkerPool};
use std::convert::Infallible;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Pool Pipeline Example ===\n");

    println!("1. Starting a pool of 2 worker threads...");
    let pool = WorkerPool::new(PoolConfig {
        workers: 2,
        queue_capacity: 4,
        rejection_policy: RejectionPolicy::DiscardOldest,
    });

    let inc = stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(plain(args[0] + 1)) },
        StageOptions::default().with_name("inc"),
    );
    let double = stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(plain(args[0] * 2)) },
        StageOptions::default().with_name("double"),
    );
    let pp = pool_pipeline(vec![inc, double], Arc::clone(&pool), None);

    println!("2. Submitting 5 invocations...");
    for i in 0..5 {
        let result = pp.run_wait(vec![i]).await?;
        println!("   double(inc({i})) = {result:?}");
    }

    println!("\n3. Shutting down the pool...");
    pool.shutdown();
    pool.join();

    println!("\n=== Example Complete ===");
    Ok(())
}
