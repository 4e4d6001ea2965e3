//! Stage templates, their realization inside a pipeline, and the
//! per-stage run loop.

// Layer 1: Standard library imports
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::future::BoxFuture;

// Layer 3: Internal module imports
use crate::config::StageOptions;
use crate::context::{Args, Context, Control};
use crate::error::StageError;
use crate::queue::BoundedQueue;

/// A stage transform: an async function from an argument tuple to a
/// [`Control`] value.
///
/// Implemented generically for any `Fn(Args<V>) -> Fut` closure via the
/// blanket impl below, so callers pass plain async closures to [`stage`].
pub trait Transform<V>: Send + Sync {
    /// Invoke the transform on a normalized argument tuple.
    fn call(&self, args: Args<V>) -> BoxFuture<'static, Result<Control<V>, TransformError>>;
}

/// Opaque wrapper around whatever error type a transform raises; unwrapped
/// and re-wrapped with stage context by [`run_stage`] into a
/// [`StageError`].
pub struct TransformError(pub Box<dyn std::error::Error + Send + Sync>);

impl<V, F, Fut, E> Transform<V> for F
where
    F: Fn(Args<V>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Control<V>, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    fn call(&self, args: Args<V>) -> BoxFuture<'static, Result<Control<V>, TransformError>> {
        let fut = (self)(args);
        Box::pin(async move { fut.await.map_err(|e| TransformError(Box::new(e))) })
    }
}

/// An immutable, freely reusable stage declaration: a transform plus queue
/// options. Constructing a `Stage` records intent only — no queue exists
/// until [`Stage::realize`] is called inside a pipeline.
pub struct Stage<V> {
    pub(crate) transform: Arc<dyn Transform<V> + Send + Sync>,
    pub(crate) options: StageOptions,
}

impl<V> Clone for Stage<V> {
    fn clone(&self) -> Self {
        Self {
            transform: Arc::clone(&self.transform),
            options: self.options.clone(),
        }
    }
}

/// Declare a stage with the given transform and options.
pub fn stage<V>(
    transform: impl Transform<V> + Send + Sync + 'static,
    options: StageOptions,
) -> Stage<V> {
    Stage {
        transform: Arc::new(transform),
        options,
    }
}

/// A stage that invokes `f` for a side effect and forwards the original
/// arguments unchanged — useful for logging taps.
pub fn copy_stage<V, F, Fut, E>(f: F, options: StageOptions) -> Stage<V>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(Args<V>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    stage(
        move |args: Args<V>| {
            let passthrough = args.clone();
            let fut = f(args);
            async move {
                fut.await?;
                Ok::<Control<V>, E>(Control::Plain(passthrough))
            }
        },
        options,
    )
}

impl<V: Debug + Send + Sync + 'static> Stage<V> {
    /// Instantiate this stage inside a pipeline: allocate its concrete
    /// input queue. Called exactly once per pipeline start.
    pub fn realize(&self) -> RealizedStage<V> {
        RealizedStage {
            queue: Arc::new(BoundedQueue::new(
                self.options.capacity,
                self.options.discipline,
            )),
            transform: Arc::clone(&self.transform),
            name: self.options.name.clone(),
            inline: self.options.inline,
        }
    }
}

/// A stage instantiated inside a running pipeline: a concrete bounded
/// queue of [`Context`]s plus the transform and name. Owned by its
/// pipeline; destroyed (its queue closed) when the pipeline stops.
pub struct RealizedStage<V: Debug> {
    pub(crate) queue: Arc<BoundedQueue<Context<V>>>,
    pub(crate) transform: Arc<dyn Transform<V> + Send + Sync>,
    pub(crate) name: Option<String>,
    pub(crate) inline: bool,
}

impl<V: Debug> RealizedStage<V> {
    /// The stage's name, or a placeholder for anonymous stages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

/// The outcome of invoking a stage's transform on one context.
pub enum StageOutcome<V> {
    /// The transform succeeded; apply `Control` to route the context.
    Completed(Control<V>),
    /// The transform raised a non-abort error; `ctx.ex` has been set.
    Errored,
}

/// Run one stage on one context:
///
/// 1. `ctx.args` is already a normalized `Vec<V>` (empty, singleton, or
///    multi-element), so no spreading step is needed.
/// 2. Invoke the transform.
/// 3. On success, return the `Control` for the engine to route.
/// 4. On failure, wrap the error with the stage name and input args,
///    invoke the pipeline's error handler (done by the caller, which has
///    the handler in scope) and record it on `ctx.ex`.
pub async fn run_stage<V>(
    realized: &RealizedStage<V>,
    mut ctx: Context<V>,
) -> (Context<V>, StageOutcome<V>)
where
    V: Clone + Debug + Send + Sync + 'static,
{
    let name = realized.display_name().to_string();
    let input_args = ctx.args.clone();

    match realized.transform.call(ctx.args.clone()).await {
        Ok(control) => {
            tracing::debug!(stage = %name, "stage transform completed");
            (ctx, StageOutcome::Completed(control))
        }
        Err(TransformError(source)) => {
            let stage_err = Arc::new(StageError {
                stage_name: name.clone(),
                input_args,
                source,
            });
            tracing::error!(stage = %name, error = %stage_err, "stage transform failed");
            if let Some(sink) = ctx.error.take() {
                sink.fail(Arc::clone(&stage_err));
            }
            ctx.ex = Some(stage_err);
            (ctx, StageOutcome::Errored)
        }
    }
}
