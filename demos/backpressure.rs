//! Backpressure - Overflow Disciplines Under Load
//!
//! Pushes a burst of items into a slow, capacity-1 `Block` stage and a
//! capacity-2 `Sliding` stage side by side, to show how each discipline
//! handles sustained producers differently.
//!
//! Run with: cargo run --example backpressure

use papaline::{pipeline, plain, stage, Args, Discipline, StageOptions};
use std::convert::Infallible;
use std::time::Duration;

async fn slow_echo(args: Args<i64>) -> Result<papaline::Control<i64>, Infallible> {
    tokio::time::sleep(Duration::from_millis(10)).await;
    Ok(plain(args[0]))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Backpressure Example ===\n");

    println!("1. Block discipline, capacity 1: producer waits for space...");
    let blocking = stage(
        slow_echo,
        StageOptions::default()
            .with_name("blocking-echo")
            .with_capacity(1)
            .with_discipline(Discipline::Block),
    );
    let p = pipeline(vec![blocking], None);
    let start = std::time::Instant::now();
    for i in 0..5 {
        p.run(vec![i]).await;
    }
    println!("   5 submissions took {:?} (each waits its turn)\n", start.elapsed());
    p.stop().await;

    println!("2. Sliding discipline, capacity 2: producer never waits, oldest is evicted...");
    let sliding = stage(
        slow_echo,
        StageOptions::default()
            .with_name("sliding-echo")
            .with_capacity(2)
            .with_discipline(Discipline::Sliding),
    );
    let p = pipeline(vec![sliding], None);
    let start = std::time::Instant::now();
    for i in 0..5 {
        p.run(vec![i]).await;
    }
    println!("   5 submissions took {:?} (none of them wait)\n", start.elapsed());
    p.stop().await;

    println!("=== Example Complete ===");
    Ok(())
}
