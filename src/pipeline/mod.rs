//! The two pipeline engines sharing one stage/context model: the channel
//! engine (one cooperative task per stage) and the pool engine (one task
//! per invocation on a shared bounded worker pool).

pub mod channel;
pub mod pool;

pub use channel::{pipeline, pipeline_as_stage, ErrorHandler, Pipeline, WaitOutcome};
pub use pool::{pool_pipeline, PoolPipeline, WorkerPool};
