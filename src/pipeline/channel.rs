//! The channel pipeline engine: one long-lived reader task per stage, one
//! short-lived work task per arriving context, wired head-to-tail through
//! each realized stage's own bounded queue.

// Layer 1: Standard library imports
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex as SyncMutex;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::config::StageOptions;
use crate::context::{Args, Context, Control, ErrorSlot, ReplySlot};
use crate::error::{PipelineError, StageError};
use crate::ids::PipelineId;
use crate::queue::{select2, BoundedQueue, Discipline, Selected2};
use crate::stage::{run_stage, stage, RealizedStage, Stage, StageOutcome};

/// Callback invoked with every stage failure a pipeline observes, whether
/// or not the failing context also had its own error sink. Invoked exactly
/// once per failure, with a wrapper carrying `stage_name` and `input_args`.
pub type ErrorHandler<V> = Arc<dyn Fn(Arc<StageError<V>>) + Send + Sync>;

/// An ordered composition of stages with shared shutdown and error policy.
pub struct Pipeline<V: Debug + Send + Sync + 'static> {
    id: PipelineId,
    stages: Vec<Arc<RealizedStage<V>>>,
    done: Arc<BoundedQueue<()>>,
    error_handler: Option<ErrorHandler<V>>,
    readers: SyncMutex<Option<Vec<JoinHandle<()>>>>,
}

/// Construct and start a channel pipeline: realize every stage and spawn
/// one reader task per stage.
pub fn pipeline<V>(stages: Vec<Stage<V>>, error_handler: Option<ErrorHandler<V>>) -> Arc<Pipeline<V>>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    let realized: Vec<Arc<RealizedStage<V>>> =
        stages.iter().map(|s| Arc::new(s.realize())).collect();
    let done = Arc::new(BoundedQueue::new(1, Discipline::Dropping));
    let id = PipelineId::new();

    let pipeline = Arc::new(Pipeline {
        id,
        stages: realized,
        done,
        error_handler,
        readers: SyncMutex::new(None),
    });

    tracing::debug!(pipeline = %id, stages = pipeline.stages.len(), "pipeline starting");
    let mut handles = Vec::with_capacity(pipeline.stages.len());
    for index in 0..pipeline.stages.len() {
        handles.push(spawn_reader(Arc::clone(&pipeline), index));
    }
    *pipeline.readers.lock() = Some(handles);

    pipeline
}

fn spawn_reader<V>(pipeline: Arc<Pipeline<V>>, index: usize) -> JoinHandle<()>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    let pipeline_id = pipeline.id;
    tokio::spawn(async move {
        let stage = Arc::clone(&pipeline.stages[index]);
        let next = pipeline.stages.get(index + 1).cloned();
        loop {
            match select2(&pipeline.done, &stage.queue).await {
                Selected2::First(_) => {
                    tracing::info!(pipeline = %pipeline_id, stage = %stage.display_name(), "done signal observed, closing input queue");
                    stage.queue.close();
                    break;
                }
                Selected2::Second(None) => break,
                Selected2::Second(Some(ctx)) => {
                    let stage = Arc::clone(&stage);
                    let next = next.clone();
                    let error_handler = pipeline.error_handler.clone();
                    let work = run_and_dispatch(stage.clone(), next, error_handler, ctx);
                    if stage.inline {
                        work.await;
                    } else {
                        tokio::spawn(work);
                    }
                }
            }
        }
    })
}

async fn run_and_dispatch<V>(
    stage: Arc<RealizedStage<V>>,
    next: Option<Arc<RealizedStage<V>>>,
    error_handler: Option<ErrorHandler<V>>,
    ctx: Context<V>,
) where
    V: Clone + Debug + Send + Sync + 'static,
{
    let (ctx, outcome) = run_stage(&stage, ctx).await;
    match outcome {
        StageOutcome::Completed(control) => dispatch(ctx, control, next.as_deref()).await,
        StageOutcome::Errored => {
            // The error sink, if any, was already notified inside
            // `run_stage`. The error handler always sees every failure
            // regardless.
            if let Some(handler) = &error_handler {
                if let Some(ex) = ctx.ex.clone() {
                    handler(ex);
                }
            }
            if ctx.error.is_none() {
                tracing::warn!(
                    stage = %stage.display_name(),
                    "stage error with no error sink attached; dropping context",
                );
            }
        }
    }
}

/// Route a completed stage's output according to the `Control` it returned.
async fn dispatch<V>(ctx: Context<V>, control: Control<V>, next: Option<&RealizedStage<V>>)
where
    V: Clone + Debug + Send + Sync + 'static,
{
    match control {
        Control::Abort(args) => {
            if let Some(wait) = &ctx.wait {
                wait.reply(args);
            }
        }
        Control::Fork(items) => {
            let width = items.len();
            let accumulator = Arc::new(SyncMutex::new(Vec::with_capacity(width)));
            for item in items {
                let mut child = ctx.clone();
                child.forks.push(width);
                child.fork_rets.push(Arc::clone(&accumulator));
                child.args = vec![item];
                forward(child, next).await;
            }
        }
        Control::Join(value) => {
            let mut ctx = ctx;
            let top = ctx.forks.last().copied().zip(ctx.fork_rets.last().cloned());
            match top {
                Some((width, accumulator)) => {
                    let completed = {
                        let mut guard = accumulator.lock();
                        guard.push(value);
                        guard.len() == width
                    };
                    if completed {
                        let collected = accumulator.lock().clone();
                        ctx.forks.pop();
                        ctx.fork_rets.pop();
                        ctx.args = collected;
                        forward(ctx, next).await;
                    }
                    // Otherwise this traversal completes; the joined
                    // context advances only once all siblings land.
                }
                None => {
                    tracing::warn!("join with no outstanding fork; dropping context");
                }
            }
        }
        Control::Plain(args) => {
            let mut ctx = ctx;
            ctx.args = args;
            forward(ctx, next).await;
        }
    }
}

async fn forward<V>(ctx: Context<V>, next: Option<&RealizedStage<V>>)
where
    V: Clone + Debug + Send + Sync + 'static,
{
    match next {
        Some(stage) => {
            // A closed downstream queue means `stop` raced this context;
            // drop it rather than panic.
            let _ = stage.queue.put(ctx).await;
        }
        None => {
            if let Some(wait) = ctx.wait.as_ref() {
                wait.reply(ctx.args);
            }
        }
    }
}

/// Outcome of [`Pipeline::run_wait_timeout`]: either the pipeline produced
/// a result before the deadline, or the deadline won — in which case the
/// caller's sentinel is returned as-is, never raised.
pub enum WaitOutcome<V> {
    /// The pipeline produced a final argument tuple in time.
    Completed(Args<V>),
    /// The deadline elapsed first; holds the caller-supplied sentinel.
    TimedOut(V),
}

impl<V> Pipeline<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    /// Fire-and-forget invocation: no reply or error sink is attached.
    pub async fn run(&self, args: Args<V>) {
        let ctx = Context::new(args);
        if self.stages[0].queue.put(ctx).await.is_err() {
            tracing::warn!("run() on a closed pipeline; invocation dropped");
        }
    }

    /// Submit `args` and block (cooperatively) on the final result.
    pub async fn run_wait(&self, args: Args<V>) -> Result<Args<V>, PipelineError<V>> {
        let (wait, mut reply_rx) = ReplySlot::new();
        let (error, mut error_rx) = ErrorSlot::new();
        let ctx = Context::with_sinks(args, wait, error);
        if self.stages[0].queue.put(ctx).await.is_err() {
            return Err(PipelineError::Closed);
        }

        tokio::select! {
            biased;
            _ = self.done.closed() => Err(PipelineError::Closed),
            Ok(err) = &mut error_rx => Err(PipelineError::Stage(err)),
            Ok(args) = &mut reply_rx => Ok(args),
            else => Err(PipelineError::Closed),
        }
    }

    /// As [`Pipeline::run_wait`], but unblocks on `timeout` with
    /// `sentinel` rather than waiting indefinitely. The in-flight work is
    /// not cancelled — it runs to completion in the background.
    pub async fn run_wait_timeout(
        &self,
        timeout: Duration,
        sentinel: V,
        args: Args<V>,
    ) -> Result<WaitOutcome<V>, PipelineError<V>> {
        let (wait, mut reply_rx) = ReplySlot::new();
        let (error, mut error_rx) = ErrorSlot::new();
        let ctx = Context::with_sinks(args, wait, error);
        if self.stages[0].queue.put(ctx).await.is_err() {
            return Err(PipelineError::Closed);
        }

        tokio::select! {
            biased;
            _ = self.done.closed() => Err(PipelineError::Closed),
            Ok(err) = &mut error_rx => Err(PipelineError::Stage(err)),
            Ok(args) = &mut reply_rx => Ok(WaitOutcome::Completed(args)),
            _ = tokio::time::sleep(timeout) => Ok(WaitOutcome::TimedOut(sentinel)),
            else => Err(PipelineError::Closed),
        }
    }

    /// Signal shutdown: close the done queue (observed by every reader on
    /// its next select) and wait for every reader task to exit. A no-op if
    /// already stopped.
    pub async fn stop(&self) {
        tracing::debug!(pipeline = %self.id, "pipeline stopping");
        self.done.close();
        let handles = self.readers.lock().take();
        if let Some(handles) = handles {
            for handle in handles {
                let _ = handle.await;
            }
        }
    }

    /// Number of stages in this pipeline.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether this pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// This pipeline's correlation id, used in its `tracing` events.
    pub fn id(&self) -> PipelineId {
        self.id
    }
}

/// Wrap a pipeline as a stage whose transform invokes `run_wait` on it, so
/// pipelines can be nested as a single stage of an outer pipeline.
pub fn pipeline_as_stage<V>(pipeline: Arc<Pipeline<V>>, options: StageOptions) -> Stage<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    stage(
        move |args: Args<V>| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.run_wait(args).await.map(Control::Plain) }
        },
        options,
    )
}
