//! Error types for stages, pipelines and the worker pool.

// Layer 1: Standard library imports
use std::fmt::Debug;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::context::Args;

/// The failure of a single stage transform.
///
/// Carries the stage name and the input arguments the transform was
/// invoked with, wrapping the underlying failure with enough context to
/// diagnose which stage and which input caused it.
#[derive(Debug, Error)]
#[error("stage `{stage_name}` failed on input {input_args:?}: {source}")]
pub struct StageError<V: Debug> {
    /// Name of the stage whose transform raised the error.
    pub stage_name: String,
    /// The argument tuple the transform was called with.
    pub input_args: Args<V>,
    /// The underlying failure.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl<V: Debug> StageError<V> {
    /// Wrap an arbitrary error with stage context.
    pub fn new(
        stage_name: impl Into<String>,
        input_args: Args<V>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            input_args,
            source: Box::new(source),
        }
    }
}

/// Errors surfaced to callers of the public API.
#[derive(Debug, Error)]
pub enum PipelineError<V: Debug> {
    /// A stage transform raised a non-abort error; re-raised verbatim to a
    /// synchronous waiter, which always surfaces the first error
    /// encountered. Shared via `Arc` because the same failure may also
    /// have been delivered to the pipeline's error handler and recorded on
    /// the context.
    #[error("stage error: {0}")]
    Stage(Arc<StageError<V>>),

    /// The waiter observed the pipeline's `done` signal before a reply
    /// arrived.
    #[error("pipeline closed before a reply was produced")]
    Closed,

    /// A stage inside a pool-backed pipeline returned `Control::Fork` or
    /// `Control::Join`; the pool engine has no fan-out support and reports
    /// this rather than silently coercing it to a plain value.
    #[error("fork/join is not supported by the pool engine (stage `{stage_name}`)")]
    ForkJoinUnsupportedInPool {
        /// Name of the offending stage.
        stage_name: String,
    },

    /// The pool's submission queue rejected the invocation under the
    /// `Block`-with-deadline or a closed-pool condition.
    #[error("pool rejected the invocation: {0}")]
    PoolRejected(String),

    /// A `StageOptions` or `PoolConfig` value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate's public surface.
pub type PipelineResult<V, T> = Result<T, PipelineError<V>>;
