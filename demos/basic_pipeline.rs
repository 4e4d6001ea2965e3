//! Basic Pipeline - Linear Stage Composition
//!
//! Demonstrates the smallest useful pipeline: two stages connected by
//! bounded queues, invoked synchronously with `run_wait`.
//!
//! Run with: cargo run --example basic_pipeline

use papaline::{pipeline, plain, stage, Args, StageOptions};
use std::convert::Infallible;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Basic Pipeline Example ===\n");

    let inc = stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(plain(args[0] + 1)) },
        StageOptions::default().with_name("inc"),
    );
    let double = stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(plain(args[0] * 2)) },
        StageOptions::default().with_name("double"),
    );

    println!("1. Starting pipeline [inc, double]...");
    let p = pipeline(vec![inc, double], None);

    println!("2. Submitting 3 and waiting for the result...");
    let result = p.run_wait(vec![3]).await?;
    println!("   double(inc(3)) = {result:?}\n");

    println!("3. Stopping pipeline...");
    p.stop().await;

    println!("\n=== Example Complete ===");
    Ok(())
}
