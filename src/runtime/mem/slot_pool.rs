//! Fixed-capacity object slot pool.
//!
//! Every heap-resident value lives in one slot. Occupancy and GC marks are
//! tracked in two bitmaps kept in lockstep with the slot array; allocation is
//! first-fit on the lowest clear occupancy bit, so freed slots are reused
//! deterministically.

use crate::runtime::mem::bitmap::Bitmap;
use crate::runtime::mem::byte_heap::ByteHeap;
use crate::runtime::value::Value;

/// Index handle into the slot pool. Always obtained from
/// [`SlotPool::allocate`]; never constructed from arbitrary integers by
/// client code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef(pub(crate) u32);

impl SlotRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct SlotPool {
    slots: Vec<Value>,
    allocated: Bitmap,
    marked: Bitmap,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Value::Nil; capacity],
            allocated: Bitmap::new(capacity),
            marked: Bitmap::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated.count_set()
    }

    pub fn free_count(&self) -> usize {
        self.capacity() - self.allocated_count()
    }

    /// Claims the lowest free slot and stores `value` in it. `None` when the
    /// pool is full.
    pub fn allocate(&mut self, value: Value) -> Option<SlotRef> {
        let index = self.allocated.first_clear()?;
        self.allocated.set(index);
        self.marked.clear(index);
        self.slots[index] = value;
        Some(SlotRef(index as u32))
    }

    /// Releases a slot, returning any byte-heap block the value owned to
    /// `bytes`. Freeing an unallocated or out-of-range slot is a no-op;
    /// the return value says whether anything was actually released.
    pub fn free(&mut self, slot: SlotRef, bytes: &mut ByteHeap) -> bool {
        let index = slot.index();
        if index >= self.capacity() || !self.allocated.get(index) {
            return false;
        }
        if let Some(ptr) = self.slots[index].owned_bytes() {
            bytes.free(ptr);
        }
        self.slots[index] = Value::Nil;
        self.allocated.clear(index);
        self.marked.clear(index);
        true
    }

    pub fn is_allocated(&self, slot: SlotRef) -> bool {
        self.allocated.get(slot.index())
    }

    /// Value stored in a slot. Unallocated and out-of-range slots read as
    /// `Nil`, the same value a freed slot is reset to.
    pub fn value(&self, slot: SlotRef) -> Value {
        let index = slot.index();
        if index >= self.capacity() || !self.allocated.get(index) {
            return Value::Nil;
        }
        self.slots[index]
    }

    /// Replaces the value in an allocated slot. Ignored for unallocated
    /// slots so a stale handle cannot resurrect freed storage.
    pub fn set_value(&mut self, slot: SlotRef, value: Value) -> bool {
        let index = slot.index();
        if index >= self.capacity() || !self.allocated.get(index) {
            return false;
        }
        self.slots[index] = value;
        true
    }

    // -- Mark bitmap, driven by the collector --

    pub fn is_marked(&self, slot: SlotRef) -> bool {
        self.marked.get(slot.index())
    }

    /// Marks an allocated slot. Returns `false` when the slot was already
    /// marked, which is what terminates tracing through cycles. Free slots
    /// are never marked, so a stale reference cannot pin recycled storage.
    pub fn mark(&mut self, slot: SlotRef) -> bool {
        let index = slot.index();
        if index >= self.capacity() || !self.allocated.get(index) || self.marked.get(index) {
            return false;
        }
        self.marked.set(index);
        true
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear_all();
    }

    /// Frees every allocated-but-unmarked slot, cascading owned byte blocks.
    /// Returns the number of slots reclaimed.
    pub fn sweep(&mut self, bytes: &mut ByteHeap) -> usize {
        let mut reclaimed = 0;
        for index in 0..self.capacity() {
            if self.allocated.get(index) && !self.marked.get(index) {
                self.free(SlotRef(index as u32), bytes);
                reclaimed += 1;
            }
        }
        reclaimed
    }

    /// Iterates over allocated slots in index order.
    pub fn iter_allocated(&self) -> impl Iterator<Item = (SlotRef, &Value)> + '_ {
        (0..self.capacity()).filter_map(move |index| {
            if self.allocated.get(index) {
                Some((SlotRef(index as u32), &self.slots[index]))
            } else {
                None
            }
        })
    }
}
