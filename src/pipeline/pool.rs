//! The pool pipeline engine: a fixed-size pool of named OS worker threads
//! sharing one bounded submission queue, each walking an entire pipeline
//! invocation sequentially inline.

// Layer 1: Standard library imports
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// Layer 2: Third-party crate imports
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;

// Layer 3: Internal module imports
use crate::config::PoolConfig;
use crate::config::RejectionPolicy;
use crate::context::{Args, Control};
use crate::error::{PipelineError, StageError};
use crate::pipeline::channel::{ErrorHandler, WaitOutcome};
use crate::queue::{BoundedQueue, Discipline, QueueError};
use crate::stage::{Stage, TransformError};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send + 'static>;

static NEXT_WORKER_ID: AtomicUsize = AtomicUsize::new(0);

fn discipline_for(policy: RejectionPolicy) -> Discipline {
    match policy {
        RejectionPolicy::DiscardOldest => Discipline::Sliding,
        RejectionPolicy::DiscardNewest => Discipline::Dropping,
        RejectionPolicy::Block => Discipline::Block,
    }
}

/// A fixed-size pool of background worker threads with a bounded
/// submission queue. Not exclusive to one pipeline: several
/// [`PoolPipeline`]s may share a `WorkerPool`.
pub struct WorkerPool {
    submission: Arc<BoundedQueue<Job>>,
    config: PoolConfig,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `config.workers` background threads named
    /// `papaline-pool-<n>` (monotonic counter), each servicing the shared
    /// bounded submission queue.
    pub fn new(config: PoolConfig) -> Arc<Self> {
        assert!(config.workers >= 1, "pool worker count must be a positive integer");
        assert!(
            config.queue_capacity >= 1,
            "pool queue capacity must be a positive integer"
        );

        let submission = Arc::new(BoundedQueue::new(
            config.queue_capacity,
            discipline_for(config.rejection_policy),
        ));

        let mut workers = Vec::with_capacity(config.workers);
        for _ in 0..config.workers {
            let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
            let submission = Arc::clone(&submission);
            let name = format!("papaline-pool-{id}");
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(submission))
                .unwrap_or_else(|e| panic!("failed to spawn worker thread `{name}`: {e}"));
            workers.push(handle);
        }

        Arc::new(Self {
            submission,
            config,
            workers: Mutex::new(workers),
        })
    }

    /// Close the submission queue; every worker thread exits once it is
    /// drained. The pool's lifecycle is owned by its creator, not by any
    /// `PoolPipeline` that submits to it.
    pub fn shutdown(&self) {
        self.submission.close();
    }

    /// Block until every worker thread has exited. Call after
    /// [`shutdown`](Self::shutdown).
    pub fn join(&self) {
        for worker in self.workers.lock().drain(..) {
            let _ = worker.join();
        }
    }

    async fn submit(&self, job: Job) -> Result<(), QueueError> {
        self.submission.put(job).await
    }
}

/// Each worker thread gets its own single-threaded tokio runtime so stage
/// transforms that await runtime-backed primitives (timers, IO) have a live
/// reactor to poll against, not just a bare future executor.
fn worker_loop(submission: Arc<BoundedQueue<Job>>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| panic!("failed to build worker thread tokio runtime: {e}"));

    loop {
        let job = rt.block_on(submission.take());
        match job {
            Some(job) => rt.block_on(job()),
            None => break,
        }
    }
}

/// Run one invocation's stages sequentially inline on the worker thread:
/// no per-stage queues, no fork/join support.
async fn execute_pool_stages<V>(
    stages: &[Stage<V>],
    error_handler: &Option<ErrorHandler<V>>,
    mut args: Args<V>,
) -> Result<Args<V>, PipelineError<V>>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    for s in stages {
        let name = s
            .options
            .name
            .clone()
            .unwrap_or_else(|| "<anonymous>".to_string());
        match s.transform.call(args.clone()).await {
            Ok(Control::Plain(next_args)) => args = next_args,
            Ok(Control::Abort(final_args)) => return Ok(final_args),
            Ok(Control::Fork(_)) | Ok(Control::Join(_)) => {
                return Err(PipelineError::ForkJoinUnsupportedInPool { stage_name: name });
            }
            Err(TransformError(source)) => {
                let err = Arc::new(StageError {
                    stage_name: name,
                    input_args: args.clone(),
                    source,
                });
                if let Some(handler) = error_handler {
                    handler(Arc::clone(&err));
                }
                return Err(PipelineError::Stage(err));
            }
        }
    }
    Ok(args)
}

/// A pipeline backed by a shared [`WorkerPool`] instead of per-stage
/// channel tasks.
pub struct PoolPipeline<V: Debug + Send + Sync + 'static> {
    stages: Vec<Stage<V>>,
    pool: Arc<WorkerPool>,
    error_handler: Option<ErrorHandler<V>>,
}

/// Construct a pool-backed pipeline over an existing (possibly shared)
/// worker pool.
pub fn pool_pipeline<V>(
    stages: Vec<Stage<V>>,
    pool: Arc<WorkerPool>,
    error_handler: Option<ErrorHandler<V>>,
) -> PoolPipeline<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    PoolPipeline {
        stages,
        pool,
        error_handler,
    }
}

impl<V> PoolPipeline<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    /// Fire-and-forget invocation.
    pub async fn run(&self, args: Args<V>) {
        let stages = self.stages.clone();
        let handler = self.error_handler.clone();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let _ = execute_pool_stages(&stages, &handler, args).await;
            })
        });
        if self.pool.submit(job).await.is_err() {
            tracing::warn!("run() submitted to a closed pool; invocation dropped");
        }
    }

    /// Submit `args` and block (cooperatively) on the final result.
    pub async fn run_wait(&self, args: Args<V>) -> Result<Args<V>, PipelineError<V>> {
        let (tx, rx) = oneshot::channel();
        let stages = self.stages.clone();
        let handler = self.error_handler.clone();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let result = execute_pool_stages(&stages, &handler, args).await;
                let _ = tx.send(result);
            })
        });
        self.pool
            .submit(job)
            .await
            .map_err(|_| PipelineError::PoolRejected("submission queue is closed".to_string()))?;

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::PoolRejected(
                "invocation was evicted from the submission queue before it ran".to_string(),
            )),
        }
    }

    /// As [`PoolPipeline::run_wait`], but unblocks on `timeout` with
    /// `sentinel`.
    pub async fn run_wait_timeout(
        &self,
        timeout: Duration,
        sentinel: V,
        args: Args<V>,
    ) -> Result<WaitOutcome<V>, PipelineError<V>> {
        let (tx, rx) = oneshot::channel();
        let stages = self.stages.clone();
        let handler = self.error_handler.clone();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let result = execute_pool_stages(&stages, &handler, args).await;
                let _ = tx.send(result);
            })
        });
        self.pool
            .submit(job)
            .await
            .map_err(|_| PipelineError::PoolRejected("submission queue is closed".to_string()))?;

        tokio::select! {
            biased;
            result = rx => match result {
                Ok(r) => r.map(WaitOutcome::Completed),
                Err(_) => Err(PipelineError::PoolRejected(
                    "invocation was evicted from the submission queue before it ran".to_string(),
                )),
            },
            _ = tokio::time::sleep(timeout) => Ok(WaitOutcome::TimedOut(sentinel)),
        }
    }

    /// No-op: the pool's lifecycle is owned by its creator, not by this
    /// pipeline.
    pub fn stop(&self) {
        tracing::debug!("PoolPipeline::stop is a no-op; the worker pool outlives this pipeline");
    }

    /// The pool configuration this pipeline submits work under.
    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool.config
    }
}
