//! Property-based tests for the bounded queue disciplines and the
//! fork/join multiset invariant, run with `proptest` since both properties
//! are stated over arbitrary-sized inputs rather than fixed examples.

#![allow(clippy::unwrap_used)]

use std::convert::Infallible;
use std::sync::Arc;

use papaline::{fork, join, pipeline, Args, BoundedQueue, Discipline};
use proptest::prelude::*;

fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

proptest! {
    /// `Sliding` never exceeds capacity and always retains a suffix of the
    /// pushed sequence, in order.
    #[test]
    fn sliding_retains_a_suffix_of_pushed_values(
        capacity in 1usize..8,
        values in proptest::collection::vec(0i32..1000, 0..20),
    ) {
        let q = BoundedQueue::new(capacity, Discipline::Sliding);
        for v in &values {
            q.try_put(*v).unwrap();
        }
        let expected_len = values.len().min(capacity);
        prop_assert_eq!(q.len(), expected_len);

        let expected_suffix = &values[values.len() - expected_len..];
        let mut drained = Vec::new();
        while let Ok(v) = q.try_take() {
            drained.push(v);
        }
        prop_assert_eq!(drained, expected_suffix.to_vec());
    }

    /// `Dropping` never exceeds capacity and always retains a prefix of the
    /// pushed sequence, in order.
    #[test]
    fn dropping_retains_a_prefix_of_pushed_values(
        capacity in 1usize..8,
        values in proptest::collection::vec(0i32..1000, 0..20),
    ) {
        let q = BoundedQueue::new(capacity, Discipline::Dropping);
        for v in &values {
            q.try_put(*v).unwrap();
        }
        let expected_len = values.len().min(capacity);
        prop_assert_eq!(q.len(), expected_len);

        let expected_prefix = &values[..expected_len];
        let mut drained = Vec::new();
        while let Ok(v) = q.try_take() {
            drained.push(v);
        }
        prop_assert_eq!(drained, expected_prefix.to_vec());
    }

    /// A fork over `n` values followed by a join always reassembles the
    /// same multiset of values, regardless of fan-out width.
    #[test]
    fn fork_join_reassembles_the_fanned_out_multiset(n in 1usize..12) {
        let items: Vec<i64> = (0..n as i64).collect();
        let items_for_stage = items.clone();

        let splitter = papaline::stage(
            move |_args: Args<i64>| {
                let items = items_for_stage.clone();
                async move { Ok::<_, Infallible>(fork(items)) }
            },
            papaline::StageOptions::default().with_name("splitter"),
        );
        let joiner = papaline::stage(
            |args: Args<i64>| async move { Ok::<_, Infallible>(join(args[0])) },
            papaline::StageOptions::default().with_name("joiner"),
        );

        let result = rt().block_on(async move {
            let p = pipeline(vec![splitter, joiner], None);
            let mut result = p.run_wait(vec![0]).await.unwrap();
            p.stop().await;
            result.sort_unstable();
            result
        });

        let mut expected = items;
        expected.sort_unstable();
        prop_assert_eq!(result, expected);
    }
}
