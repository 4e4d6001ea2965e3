//! # papaline - staged dataflow pipeline runtime
//!
//! A linear sequence of user-defined stages connected by bounded queues,
//! run by one of two dual engines: a cooperative channel engine (one
//! `tokio` task per stage) or a fixed-size worker pool of OS threads (one
//! invocation runs inline on a single worker). Both engines share the same
//! stage, context and error model.
//!
//! # Quick Start
//!
//! ```rust
//! use papaline::{pipeline, stage, Args, StageOptions};
//! use std::convert::Infallible;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), papaline::PipelineError<i64>> {
//!     let inc = stage(
//!         |args: Args<i64>| async move { Ok::<_, Infallible>(papaline::plain(args[0] + 1)) },
//!         StageOptions::default().with_name("inc"),
//!     );
//!     let double = stage(
//!         |args: Args<i64>| async move { Ok::<_, Infallible>(papaline::plain(args[0] * 2)) },
//!         StageOptions::default().with_name("double"),
//!     );
//!
//!     let p = pipeline(vec![inc, double], None);
//!     let result = p.run_wait(vec![3]).await?;
//!     assert_eq!(result, vec![8]);
//!     p.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Core Model
//!
//! - **Stage**: a declared transform plus queue options; instantiated once
//!   per running pipeline into a [`RealizedStage`].
//! - **Context**: the envelope (`args`, optional reply/error sinks, fork
//!   bookkeeping) that travels between stages.
//! - **Control**: what a transform returns — `Plain`, `Fork`, `Join` or
//!   `Abort` — replacing runtime metadata tagging with a static sum type.
//! - **BoundedQueue**: the backpressure primitive underneath every stage,
//!   with `Block`, `Sliding` and `Dropping` overflow disciplines.
//!
//! # Module Organization
//!
//! - [`error`] - `StageError`/`PipelineError` and the crate's `Result` alias
//! - [`queue`] - `BoundedQueue`, overflow disciplines, priority select
//! - [`context`] - `Context`, `Control`, reply/error sinks
//! - [`config`] - `StageOptions`, `PoolConfig`, `RejectionPolicy`
//! - [`stage`] - `Stage`, `Transform`, `RealizedStage`, `run_stage`
//! - [`pipeline`] - the channel engine and the pool engine
//!
//! # Engines
//!
//! Use [`pipeline`] (the channel engine) for full fork/join support and
//! per-stage concurrency. Use [`pool_pipeline`] (the pool engine) when work
//! should run on a fixed number of OS threads with a bounded submission
//! queue and no fan-out; fork/join inside a pool-backed stage is a reported
//! runtime error rather than a silent coercion.

pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod pipeline;
pub mod queue;
pub mod stage;

pub use config::{
    PoolConfig, RejectionPolicy, StageOptions, DEFAULT_POOL_QUEUE_CAPACITY, DEFAULT_POOL_WORKERS,
    DEFAULT_STAGE_CAPACITY,
};
pub use context::{abort, fork, join, plain, Args, Context, Control, ErrorSlot, ReplySlot};
pub use error::{PipelineError, PipelineResult, StageError};
pub use ids::PipelineId;
pub use pipeline::{
    pipeline, pipeline_as_stage, pool_pipeline, ErrorHandler, Pipeline, PoolPipeline, WaitOutcome,
    WorkerPool,
};
pub use queue::{select2, select3, BoundedQueue, Discipline, QueueError, Selected2, Selected3};
pub use stage::{copy_stage, run_stage, stage, RealizedStage, Stage, StageOutcome, Transform};
