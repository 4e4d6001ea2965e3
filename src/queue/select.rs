//! Priority-biased select across two or three bounded queues.
//!
//! Every stage must service both its input queue and the pipeline-wide
//! done signal, with the done signal always winning ties.
//! `tokio::select! { biased; ... }` is the native primitive for this.

use super::BoundedQueue;

/// Outcome of [`select2`]: which of the two queues produced an item first,
/// with the first argument always checked ahead of the second.
pub enum Selected2<A, B> {
    /// The first (priority) queue produced `Some`/`None`.
    First(Option<A>),
    /// The second queue produced `Some`/`None`.
    Second(Option<B>),
}

/// Wait on two queues at once; `first` is checked with priority when both
/// are ready in the same poll.
pub async fn select2<A, B>(first: &BoundedQueue<A>, second: &BoundedQueue<B>) -> Selected2<A, B> {
    tokio::select! {
        biased;
        a = first.take() => Selected2::First(a),
        b = second.take() => Selected2::Second(b),
    }
}

/// Outcome of [`select3`].
pub enum Selected3<A, B, C> {
    /// The first (highest priority) queue produced `Some`/`None`.
    First(Option<A>),
    /// The second queue produced `Some`/`None`.
    Second(Option<B>),
    /// The third (lowest priority) queue produced `Some`/`None`.
    Third(Option<C>),
}

/// Wait on three queues at once, in descending priority order
/// `first, second, third`.
pub async fn select3<A, B, C>(
    first: &BoundedQueue<A>,
    second: &BoundedQueue<B>,
    third: &BoundedQueue<C>,
) -> Selected3<A, B, C> {
    tokio::select! {
        biased;
        a = first.take() => Selected3::First(a),
        b = second.take() => Selected3::Second(b),
        c = third.take() => Selected3::Third(c),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::queue::Discipline;

    #[tokio::test]
    async fn priority_queue_wins_when_both_ready() {
        let done: BoundedQueue<()> = BoundedQueue::new(1, Discipline::Block);
        let input: BoundedQueue<i32> = BoundedQueue::new(1, Discipline::Block);
        done.try_put(()).unwrap();
        input.try_put(1).unwrap();

        match select2(&done, &input).await {
            Selected2::First(Some(())) => {}
            _ => panic!("expected the priority queue to win"),
        }
    }

    #[tokio::test]
    async fn falls_through_to_second_when_first_empty() {
        let done: BoundedQueue<()> = BoundedQueue::new(1, Discipline::Block);
        let input: BoundedQueue<i32> = BoundedQueue::new(1, Discipline::Block);
        input.try_put(7).unwrap();

        match select2(&done, &input).await {
            Selected2::Second(Some(7)) => {}
            _ => panic!("expected the second queue to be selected"),
        }
    }
}
