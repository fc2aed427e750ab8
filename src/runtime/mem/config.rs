use serde::{Deserialize, Serialize};

/// Sizing knobs for the memory subsystem. All capacities are fixed at
/// construction; nothing grows at runtime.
///
/// Deserializable so test harnesses and the CLI can load shrunken
/// configurations from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Number of object slots in the pool.
    pub pool_capacity: usize,
    /// Byte heap size; rounded down to a whole number of chunks.
    pub heap_bytes: usize,
    /// Chunk granularity of the byte heap.
    pub chunk_size: usize,
    /// Maximum number of simultaneously registered roots.
    pub max_roots: usize,
    /// Capacity of the collector's explicit mark stack.
    pub mark_stack_capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 1024,
            heap_bytes: 1024 * 1024,
            chunk_size: 32,
            max_roots: 32,
            mark_stack_capacity: 256,
        }
    }
}

impl MemoryConfig {
    /// A deliberately tiny configuration for exercising exhaustion paths.
    pub fn tiny() -> Self {
        Self {
            pool_capacity: 16,
            heap_bytes: 256,
            chunk_size: 32,
            max_roots: 4,
            mark_stack_capacity: 8,
        }
    }
}
