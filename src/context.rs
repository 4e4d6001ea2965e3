//! The `Context<V>` envelope that travels through a pipeline, and the
//! `Control<V>` sum type a transform returns to signal plain completion,
//! fan-out, fan-in or abort.

// Layer 1: Standard library imports
use std::fmt::Debug;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tokio::sync::oneshot;

// Layer 3: Internal module imports
use crate::error::StageError;

/// The current argument tuple flowing between stages.
pub type Args<V> = Vec<V>;

/// What a stage transform returns to the engine: plain completion, a
/// fan-out, a fan-in contribution, or an early-terminating abort.
#[derive(Debug, Clone)]
pub enum Control<V> {
    /// Ordinary completion; `Args<V>` becomes the next stage's input.
    Plain(Args<V>),
    /// Fan out: each element becomes an independent `Context` at the next
    /// stage. Records the fan-out width on the context's `forks` stack.
    Fork(Vec<V>),
    /// Fan in: append `V` to the innermost outstanding fork's accumulator.
    Join(V),
    /// Terminate this context's traversal early with `Args<V>` as the
    /// final result.
    Abort(Args<V>),
}

/// Build a [`Control::Plain`] from a single value (the common case of a
/// stage that takes and returns one argument).
pub fn plain<V>(value: V) -> Control<V> {
    Control::Plain(vec![value])
}

/// Terminate the current context's traversal early.
pub fn abort<V>(args: Args<V>) -> Control<V> {
    Control::Abort(args)
}

/// Fan out a sequence of values into independent sibling contexts.
pub fn fork<V>(items: Vec<V>) -> Control<V> {
    Control::Fork(items)
}

/// Contribute a value to the innermost outstanding fork's accumulator.
pub fn join<V>(value: V) -> Control<V> {
    Control::Join(value)
}

/// Single-slot reply sink for a synchronous caller.
///
/// Shared via `Arc` across sibling contexts produced by a fork so that
/// whichever branch's traversal ultimately reaches the end of the pipeline
/// (after all joins resolve back to one context) can deliver the reply.
pub struct ReplySlot<V> {
    sender: Mutex<Option<oneshot::Sender<Args<V>>>>,
}

impl<V> ReplySlot<V> {
    /// Create a reply slot paired with the receiving half.
    pub fn new() -> (Arc<Self>, oneshot::Receiver<Args<V>>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                sender: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    /// Deliver the final result. A no-op if already delivered — at most
    /// one of {normal completion, abort, exception} is ever observable.
    pub fn reply(&self, args: Args<V>) {
        if let Some(tx) = self.sender.lock().take() {
            let _ = tx.send(args);
        }
    }
}

/// Single-slot error sink for a synchronous caller.
pub struct ErrorSlot<V: Debug> {
    sender: Mutex<Option<oneshot::Sender<Arc<StageError<V>>>>>,
}

impl<V: Debug> ErrorSlot<V> {
    /// Create an error slot paired with the receiving half.
    pub fn new() -> (Arc<Self>, oneshot::Receiver<Arc<StageError<V>>>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                sender: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    /// Deliver a stage failure. A no-op if already delivered.
    pub fn fail(&self, err: Arc<StageError<V>>) {
        if let Some(tx) = self.sender.lock().take() {
            let _ = tx.send(err);
        }
    }
}

/// The per-item envelope that traverses a pipeline.
pub struct Context<V: Debug> {
    /// The current argument tuple for the next stage.
    pub args: Args<V>,
    /// Reply sink for a synchronous caller, if this invocation used
    /// `run_wait`/`run_wait_timeout`.
    pub wait: Option<Arc<ReplySlot<V>>>,
    /// Error sink for a synchronous caller.
    pub error: Option<Arc<ErrorSlot<V>>>,
    /// The captured failure, if a stage has already errored on this path.
    pub ex: Option<Arc<StageError<V>>>,
    /// Stack of outstanding fork widths (LIFO; nested forks resolve
    /// innermost-first).
    pub forks: Vec<usize>,
    /// Stack of accumulators paired 1:1 with `forks`, shared across sibling
    /// contexts produced by the same fork.
    pub fork_rets: Vec<Arc<Mutex<Vec<V>>>>,
}

impl<V: Debug + Clone> Clone for Context<V> {
    fn clone(&self) -> Self {
        Self {
            args: self.args.clone(),
            wait: self.wait.clone(),
            error: self.error.clone(),
            ex: self.ex.clone(),
            forks: self.forks.clone(),
            fork_rets: self.fork_rets.clone(),
        }
    }
}

impl<V: Debug> Context<V> {
    /// A bare context with no reply/error sinks (used by fire-and-forget
    /// `run`).
    pub fn new(args: Args<V>) -> Self {
        Self {
            args,
            wait: None,
            error: None,
            ex: None,
            forks: Vec::new(),
            fork_rets: Vec::new(),
        }
    }

    /// A context carrying reply and error sinks for a synchronous caller.
    pub fn with_sinks(
        args: Args<V>,
        wait: Arc<ReplySlot<V>>,
        error: Arc<ErrorSlot<V>>,
    ) -> Self {
        Self {
            args,
            wait: Some(wait),
            error: Some(error),
            ex: None,
            forks: Vec::new(),
            fork_rets: Vec::new(),
        }
    }
}
