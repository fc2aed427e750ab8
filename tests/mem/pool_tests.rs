//! Slot pool behavior through the public API: capacity conservation,
//! handle uniqueness and deterministic reuse.

use chibi_lisp::runtime::mem::byte_heap::ByteHeap;
use chibi_lisp::runtime::mem::slot_pool::SlotPool;
use chibi_lisp::runtime::mem::{MemError, MemoryConfig, ObjectHeap};
use chibi_lisp::runtime::value::Value;

#[test]
fn allocated_plus_free_always_equals_capacity() {
    let mut pool = SlotPool::new(64);
    let mut bytes = ByteHeap::new(256, 32);

    let mut live = Vec::new();
    for round in 0..10 {
        for i in 0..20 {
            if let Some(slot) = pool.allocate(Value::Number(round * 100 + i)) {
                live.push(slot);
            }
            assert_eq!(pool.allocated_count() + pool.free_count(), 64);
        }
        // Free every other live slot.
        let mut kept = Vec::new();
        for (index, slot) in live.drain(..).enumerate() {
            if index % 2 == 0 {
                assert!(pool.free(slot, &mut bytes));
            } else {
                kept.push(slot);
            }
            assert_eq!(pool.allocated_count() + pool.free_count(), 64);
        }
        live = kept;
    }
}

#[test]
fn live_handles_are_unique() {
    let mut pool = SlotPool::new(128);
    let mut handles = Vec::new();
    while let Some(slot) = pool.allocate(Value::Nil) {
        handles.push(slot.index());
    }
    assert_eq!(handles.len(), 128);

    let mut sorted = handles.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), handles.len());
}

#[test]
fn allocation_order_is_lowest_index_first() {
    let mut pool = SlotPool::new(8);
    let mut bytes = ByteHeap::new(256, 32);

    let slots: Vec<_> = (0..8).map(|i| pool.allocate(Value::Number(i)).unwrap()).collect();
    for (i, slot) in slots.iter().enumerate() {
        assert_eq!(slot.index(), i);
    }

    pool.free(slots[5], &mut bytes);
    pool.free(slots[1], &mut bytes);
    assert_eq!(pool.allocate(Value::Nil).unwrap().index(), 1);
    assert_eq!(pool.allocate(Value::Nil).unwrap().index(), 5);
}

#[test]
fn values_survive_unrelated_frees() {
    let mut pool = SlotPool::new(8);
    let mut bytes = ByteHeap::new(256, 32);

    let keep = pool.allocate(Value::Number(7)).unwrap();
    let drop = pool.allocate(Value::Number(8)).unwrap();
    pool.free(drop, &mut bytes);

    assert_eq!(pool.value(keep), Value::Number(7));
}

#[test]
fn facade_surfaces_pool_exhaustion() {
    let mut heap = ObjectHeap::new(MemoryConfig {
        pool_capacity: 4,
        ..MemoryConfig::tiny()
    });
    for i in 0..4 {
        heap.make_number(i).unwrap();
    }
    let err = heap.make_number(4).unwrap_err();
    assert_eq!(err, MemError::PoolExhausted { capacity: 4 });

    // Collecting with no roots frees everything and unblocks allocation.
    assert_eq!(heap.collect().unwrap(), 4);
    assert!(heap.make_number(5).is_ok());
}

#[test]
fn stale_handle_reads_nil_after_reuse() {
    let mut pool = SlotPool::new(2);
    let mut bytes = ByteHeap::new(64, 32);

    let old = pool.allocate(Value::Number(1)).unwrap();
    pool.free(old, &mut bytes);
    let new = pool.allocate(Value::Number(2)).unwrap();

    // Same index, new occupant: the stale handle observes the new value,
    // never freed memory.
    assert_eq!(old.index(), new.index());
    assert_eq!(pool.value(old), Value::Number(2));
}
