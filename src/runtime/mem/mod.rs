//! Memory subsystem: slot pool, chunked byte heap, mark-and-sweep collector
//! and the [`ObjectHeap`] facade tying them together.
//!
//! All capacities are fixed at construction. Handles are indices, never
//! addresses, so a stale handle can misread a recycled slot but can never
//! touch memory outside the pool.

pub mod bitmap;
pub mod byte_heap;
pub mod collector;
pub mod config;
pub mod heap;
pub mod slot_pool;
pub mod telemetry;

pub use byte_heap::{ByteHeap, FreeStatus, HeapPtr};
pub use collector::{Collector, RootId};
pub use config::MemoryConfig;
pub use heap::ObjectHeap;
pub use slot_pool::{SlotPool, SlotRef};
pub use telemetry::{format_mem_stats, MemStats, TypeCount};

use std::fmt;

/// Failures the memory subsystem can report. Exhaustion is an error, not a
/// panic; callers decide whether to collect and retry or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    /// Every object slot is allocated.
    PoolExhausted { capacity: usize },
    /// No contiguous chunk run can satisfy the request.
    HeapExhausted { requested: usize },
    /// The root table has no free entry.
    RootSetFull { max_roots: usize },
    /// Tracing needed more work-stack entries than configured. The
    /// collection was aborted before any sweep.
    MarkStackOverflow { capacity: usize },
}

impl fmt::Display for MemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemError::PoolExhausted { capacity } => {
                write!(f, "object pool exhausted ({capacity} slots)")
            }
            MemError::HeapExhausted { requested } => {
                write!(f, "byte heap exhausted ({requested} bytes requested)")
            }
            MemError::RootSetFull { max_roots } => {
                write!(f, "root set full ({max_roots} entries)")
            }
            MemError::MarkStackOverflow { capacity } => {
                write!(f, "mark stack overflow (capacity {capacity}); collection aborted")
            }
        }
    }
}

impl std::error::Error for MemError {}
