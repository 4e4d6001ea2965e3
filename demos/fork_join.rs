//! Fork/Join - Fan-out and Fan-in Across a Pipeline
//!
//! A splitter stage fans one input out into independent branches; a joiner
//! stage downstream collects every branch's result back into one vector,
//! regardless of how fast each branch completes.
//!
//! Run with: cargo run --example fork_join

use papaline::{fork, join, pipeline, Args};
use std::convert::Infallible;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Fork/Join Example ===\n");

    let splitter = papaline::stage(
        |args: Args<i64>| async move {
            let n = args[0];
            println!("   splitting into {n} branches");
            Ok::<_, Infallible>(fork((1..=n).collect()))
        },
        papaline::StageOptions::default().with_name("splitter"),
    );

    // Branches complete out of order on purpose, to show that join
    // reassembles the full multiset regardless of arrival order.
    let variable_delay = papaline::stage(
        |args: Args<i64>| async move {
            let branch = args[0];
            tokio::time::sleep(Duration::from_millis((branch % 3) as u64 * 10)).await;
            Ok::<_, Infallible>(papaline::plain(branch))
        },
        papaline::StageOptions::default().with_name("variable-delay"),
    );

    let joiner = papaline::stage(
        |args: Args<i64>| async move { Ok::<_, Infallible>(join(args[0])) },
        papaline::StageOptions::default().with_name("joiner"),
    );

    println!("1. Starting pipeline [splitter, variable-delay, joiner]...");
    let p = pipeline(vec![splitter, variable_delay, joiner], None);

    println!("2. Submitting 5...");
    let mut result = p.run_wait(vec![5]).await?;
    result.sort_unstable();
    println!("   joined branches (sorted) = {result:?}\n");

    p.stop().await;
    println!("=== Example Complete ===");
    Ok(())
}
