//! Mark-and-sweep collector with an explicit root set.
//!
//! Marking is iterative over a fixed-capacity work stack; slots are marked
//! when pushed, so a cycle is traced exactly once and the stack never holds
//! duplicates. Overflowing the mark stack aborts the whole collection before
//! the sweep runs, since sweeping a partially marked pool would free live
//! objects.

use crate::runtime::mem::byte_heap::ByteHeap;
use crate::runtime::mem::slot_pool::{SlotPool, SlotRef};
use crate::runtime::mem::MemError;
use crate::runtime::value::ValueRef;

/// Stable identity of a registered root. Survives retargeting via
/// [`Collector::set_root`]; removing a root retires its id permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(u32);

#[derive(Debug, Clone, Copy)]
struct RootEntry {
    id: RootId,
    value: ValueRef,
}

#[derive(Debug)]
pub struct Collector {
    roots: Vec<Option<RootEntry>>,
    next_id: u32,
    mark_stack_capacity: usize,
    collections: u64,
    last_reclaimed: u64,
    total_reclaimed: u64,
}

impl Collector {
    pub fn new(max_roots: usize, mark_stack_capacity: usize) -> Self {
        Self {
            roots: vec![None; max_roots],
            next_id: 0,
            mark_stack_capacity,
            collections: 0,
            last_reclaimed: 0,
            total_reclaimed: 0,
        }
    }

    /// Number of live root registrations.
    pub fn root_count(&self) -> usize {
        self.roots.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn max_roots(&self) -> usize {
        self.roots.len()
    }

    /// Collections run so far.
    pub fn collections(&self) -> u64 {
        self.collections
    }

    /// Slots reclaimed by the most recent completed collection.
    pub fn last_reclaimed(&self) -> u64 {
        self.last_reclaimed
    }

    /// Slots reclaimed across all collections.
    pub fn total_reclaimed(&self) -> u64 {
        self.total_reclaimed
    }

    /// Registers `value` as a root. Fails when the root table is full.
    pub fn add_root(&mut self, value: ValueRef) -> Result<RootId, MemError> {
        let free = self
            .roots
            .iter()
            .position(|entry| entry.is_none())
            .ok_or(MemError::RootSetFull {
                max_roots: self.roots.len(),
            })?;
        let id = RootId(self.next_id);
        self.next_id += 1;
        self.roots[free] = Some(RootEntry { id, value });
        Ok(id)
    }

    /// Unregisters a root. Unknown ids are a no-op returning `false`.
    pub fn remove_root(&mut self, id: RootId) -> bool {
        for entry in &mut self.roots {
            if matches!(entry, Some(e) if e.id == id) {
                *entry = None;
                return true;
            }
        }
        false
    }

    /// Retargets an existing root at a new value, keeping its table entry.
    /// This is how the evaluator keeps a pinned environment current as it
    /// rebinds across allocations.
    pub fn set_root(&mut self, id: RootId, value: ValueRef) -> bool {
        for entry in &mut self.roots {
            if let Some(e) = entry {
                if e.id == id {
                    e.value = value;
                    return true;
                }
            }
        }
        false
    }

    /// Current target of a root.
    pub fn root(&self, id: RootId) -> Option<ValueRef> {
        self.roots
            .iter()
            .flatten()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value)
    }

    /// Runs a full collection: clear marks, trace from every root, sweep.
    /// Returns the number of slots reclaimed.
    ///
    /// On mark-stack overflow no sweep happens and the pool is left with a
    /// partial mark state that the next collection clears; nothing is freed.
    pub fn collect(&mut self, pool: &mut SlotPool, bytes: &mut ByteHeap) -> Result<usize, MemError> {
        pool.clear_marks();

        let mut stack: Vec<SlotRef> = Vec::with_capacity(self.mark_stack_capacity);
        for entry in self.roots.iter().flatten() {
            self.push_marked(pool, &mut stack, entry.value)?;
        }

        while let Some(slot) = stack.pop() {
            let value = pool.value(slot);
            for child in value.children().into_iter().flatten() {
                self.push_marked(pool, &mut stack, child)?;
            }
        }

        let reclaimed = pool.sweep(bytes);
        self.collections += 1;
        self.last_reclaimed = reclaimed as u64;
        self.total_reclaimed += reclaimed as u64;
        Ok(reclaimed)
    }

    /// Marks `value` and pushes it for tracing. Singletons and
    /// already-marked slots are skipped.
    fn push_marked(
        &self,
        pool: &mut SlotPool,
        stack: &mut Vec<SlotRef>,
        value: ValueRef,
    ) -> Result<(), MemError> {
        let Some(slot) = value.slot() else {
            return Ok(());
        };
        if !pool.mark(slot) {
            return Ok(());
        }
        if stack.len() >= self.mark_stack_capacity {
            return Err(MemError::MarkStackOverflow {
                capacity: self.mark_stack_capacity,
            });
        }
        stack.push(slot);
        Ok(())
    }
}
