//! Configuration structs for stages and the worker pool, validated at
//! construction with sensible defaults.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::queue::Discipline;

/// Default queue capacity for a stage.
pub const DEFAULT_STAGE_CAPACITY: usize = 100;

/// Options recognized when declaring a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOptions {
    /// Input queue capacity. Must be a positive integer.
    pub capacity: usize,
    /// Overflow discipline for the stage's input queue.
    pub discipline: Discipline,
    /// Opaque name used in error wrapping and logging.
    pub name: Option<String>,
    /// Run the stage's work inline on the reader task instead of spawning a
    /// separate task per arriving context. Trades per-stage concurrency for
    /// strict per-stage ordering.
    pub inline: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_STAGE_CAPACITY,
            discipline: Discipline::Block,
            name: None,
            inline: false,
        }
    }
}

impl StageOptions {
    /// Validate that `capacity` is positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("stage capacity must be a positive integer".to_string());
        }
        Ok(())
    }

    /// Builder-style setter for capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builder-style setter for discipline.
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    /// Builder-style setter for name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder-style setter for the inline-execution knob.
    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }
}

/// Rejection policy applied when the pool engine's submission queue is
/// full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RejectionPolicy {
    /// Evict the oldest pending invocation to admit the new one.
    #[default]
    DiscardOldest,
    /// Silently discard the new invocation.
    DiscardNewest,
    /// Wait for a submission slot to free up.
    Block,
}

/// Default worker count for a pool.
pub const DEFAULT_POOL_WORKERS: usize = 4;
/// Default submission queue capacity for a pool.
pub const DEFAULT_POOL_QUEUE_CAPACITY: usize = 1000;

/// Configuration for [`crate::pipeline::pool::WorkerPool`] construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of fixed worker threads.
    pub workers: usize,
    /// Bounded submission queue capacity.
    pub queue_capacity: usize,
    /// Policy applied when the submission queue is full.
    pub rejection_policy: RejectionPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_POOL_WORKERS,
            queue_capacity: DEFAULT_POOL_QUEUE_CAPACITY,
            rejection_policy: RejectionPolicy::DiscardOldest,
        }
    }
}

impl PoolConfig {
    /// Validate that `workers` and `queue_capacity` are positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("pool worker count must be a positive integer".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("pool queue capacity must be a positive integer".to_string());
        }
        Ok(())
    }
}
