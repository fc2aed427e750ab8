//! Memory telemetry: point-in-time statistics and formatted reports.
//!
//! Statistics are derived by scanning the pool and byte heap rather than
//! being tracked incrementally, so a snapshot is always consistent with the
//! structures it describes.

use serde::{Deserialize, Serialize};

use crate::runtime::mem::byte_heap::ByteHeap;
use crate::runtime::mem::collector::Collector;
use crate::runtime::mem::slot_pool::SlotPool;

/// Live-object count for one value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub type_name: String,
    pub count: usize,
}

/// Point-in-time summary of the memory subsystem. Serializable so the CLI
/// can emit it as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemStats {
    pub pool_capacity: usize,
    pub pool_allocated: usize,
    pub pool_free: usize,
    pub heap_total_bytes: usize,
    pub heap_used_bytes: usize,
    pub heap_free_bytes: usize,
    pub heap_total_chunks: usize,
    pub heap_used_chunks: usize,
    pub root_count: usize,
    pub collections: u64,
    pub last_reclaimed: u64,
    pub total_reclaimed: u64,
    pub type_breakdown: Vec<TypeCount>,
}

impl MemStats {
    /// Gathers a snapshot from the live structures.
    pub fn capture(pool: &SlotPool, bytes: &ByteHeap, gc: &Collector) -> Self {
        let mut breakdown: Vec<TypeCount> = Vec::new();
        for (_, value) in pool.iter_allocated() {
            let name = value.type_name();
            match breakdown.iter_mut().find(|entry| entry.type_name == name) {
                Some(entry) => entry.count += 1,
                None => breakdown.push(TypeCount {
                    type_name: name.to_string(),
                    count: 1,
                }),
            }
        }
        breakdown.sort_by(|a, b| b.count.cmp(&a.count).then(a.type_name.cmp(&b.type_name)));

        Self {
            pool_capacity: pool.capacity(),
            pool_allocated: pool.allocated_count(),
            pool_free: pool.free_count(),
            heap_total_bytes: bytes.total_bytes(),
            heap_used_bytes: bytes.used_bytes(),
            heap_free_bytes: bytes.free_bytes(),
            heap_total_chunks: bytes.chunk_count(),
            heap_used_chunks: bytes.allocated_chunks(),
            root_count: gc.root_count(),
            collections: gc.collections(),
            last_reclaimed: gc.last_reclaimed(),
            total_reclaimed: gc.total_reclaimed(),
            type_breakdown: breakdown,
        }
    }

    pub fn pool_utilization(&self) -> f64 {
        if self.pool_capacity == 0 {
            return 0.0;
        }
        self.pool_allocated as f64 / self.pool_capacity as f64
    }

    pub fn heap_utilization(&self) -> f64 {
        if self.heap_total_bytes == 0 {
            return 0.0;
        }
        self.heap_used_bytes as f64 / self.heap_total_bytes as f64
    }
}

/// Formatted multi-section report of a [`MemStats`] snapshot.
pub fn format_mem_stats(stats: &MemStats) -> String {
    let mut out = String::from("=== Memory Report ===\n");
    out.push_str(&format!(
        "Pool slots:         {} / {} ({:.2}%)\n",
        stats.pool_allocated,
        stats.pool_capacity,
        stats.pool_utilization() * 100.0
    ));
    out.push_str(&format!(
        "Heap bytes:         {} / {} ({:.2}%)\n",
        stats.heap_used_bytes,
        stats.heap_total_bytes,
        stats.heap_utilization() * 100.0
    ));
    out.push_str(&format!(
        "Heap chunks:        {} / {}\n",
        stats.heap_used_chunks, stats.heap_total_chunks
    ));
    out.push_str(&format!("Roots:              {}\n", stats.root_count));
    out.push_str(&format!("Collections:        {}\n", stats.collections));
    out.push_str(&format!("Last reclaimed:     {}\n", stats.last_reclaimed));
    out.push_str(&format!("Total reclaimed:    {}\n", stats.total_reclaimed));

    if !stats.type_breakdown.is_empty() {
        out.push_str("\nLive objects by type:\n");
        out.push_str(&format!("{:<18} {:>8}\n", "Type", "Count"));
        out.push_str(&"-".repeat(28));
        out.push('\n');
        for entry in &stats.type_breakdown {
            out.push_str(&format!("{:<18} {:>8}\n", entry.type_name, entry.count));
        }
    }
    out
}
