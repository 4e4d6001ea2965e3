//! Bounded queue abstraction with block / sliding / dropping overflow
//! disciplines, and the priority-select primitive stages use to service
//! their input queue and the pipeline-wide done signal together.

pub mod bounded;
pub mod select;

pub use bounded::{BoundedQueue, Discipline, QueueError, TryPutError, TryTakeError};
pub use select::{select2, select3, Selected2, Selected3};
