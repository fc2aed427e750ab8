//! Collector behavior through the facade: reachability, cycles, repeated
//! collections, root retargeting and the bounded mark stack.

use chibi_lisp::runtime::mem::byte_heap::ByteHeap;
use chibi_lisp::runtime::mem::collector::Collector;
use chibi_lisp::runtime::mem::slot_pool::SlotPool;
use chibi_lisp::runtime::mem::{MemError, MemoryConfig, ObjectHeap};
use chibi_lisp::runtime::value::{Value, ValueRef};

fn heap() -> ObjectHeap {
    ObjectHeap::new(MemoryConfig {
        pool_capacity: 64,
        heap_bytes: 1024,
        chunk_size: 32,
        max_roots: 8,
        mark_stack_capacity: 64,
    })
}

/// Builds a proper list of `n` numbers and returns its head.
fn number_list(heap: &mut ObjectHeap, n: i32) -> ValueRef {
    let mut list = ValueRef::Nil;
    for i in (0..n).rev() {
        let num = heap.make_number(i).unwrap();
        list = heap.make_cons(num, list).unwrap();
    }
    list
}

#[test]
fn everything_reachable_from_a_root_survives() {
    let mut h = heap();
    let list = number_list(&mut h, 10);
    let root = h.add_root(list).unwrap();

    // 10 cons cells + 10 numbers.
    assert_eq!(h.live_objects(), 20);
    assert_eq!(h.collect().unwrap(), 0);
    assert_eq!(h.live_objects(), 20);
    assert_eq!(h.list_length(list), 10);

    h.remove_root(root);
    assert_eq!(h.collect().unwrap(), 20);
    assert_eq!(h.live_objects(), 0);
}

#[test]
fn unreachable_subgraph_is_reclaimed() {
    let mut h = heap();
    let keep = number_list(&mut h, 3);
    let _garbage = number_list(&mut h, 5);
    h.add_root(keep).unwrap();

    assert_eq!(h.collect().unwrap(), 10);
    assert_eq!(h.live_objects(), 6);
}

#[test]
fn collection_is_idempotent_for_a_fixed_root_set() {
    let mut h = heap();
    let list = number_list(&mut h, 4);
    h.add_root(list).unwrap();
    number_list(&mut h, 4);

    assert_eq!(h.collect().unwrap(), 8);
    assert_eq!(h.collect().unwrap(), 0);
    assert_eq!(h.collect().unwrap(), 0);
    assert_eq!(h.live_objects(), 8);
}

#[test]
fn cyclic_structures_are_traced_once_and_reclaimed() {
    let mut h = heap();
    let a = h.make_cons(ValueRef::Nil, ValueRef::Nil).unwrap();
    let b = h.make_cons(a, ValueRef::Nil).unwrap();
    let c = h.make_cons(b, ValueRef::Nil).unwrap();
    // Close the loop: a -> c.
    assert!(h.set_car(a, c));
    assert!(h.set_cdr(a, b));

    let root = h.add_root(a).unwrap();
    assert_eq!(h.collect().unwrap(), 0);
    assert_eq!(h.live_objects(), 3);

    h.remove_root(root);
    assert_eq!(h.collect().unwrap(), 3);
}

#[test]
fn self_referential_cell_does_not_hang() {
    let mut h = heap();
    let cell = h.make_cons(ValueRef::Nil, ValueRef::Nil).unwrap();
    h.set_car(cell, cell);
    h.set_cdr(cell, cell);

    let root = h.add_root(cell).unwrap();
    assert_eq!(h.collect().unwrap(), 0);
    h.remove_root(root);
    assert_eq!(h.collect().unwrap(), 1);
}

#[test]
fn string_payloads_are_reclaimed_with_their_slots() {
    let mut h = heap();
    let free_before = h.heap_free_bytes();
    for i in 0..5 {
        h.make_string(&format!("transient-{i}")).unwrap();
    }
    assert!(h.heap_free_bytes() < free_before);

    assert_eq!(h.collect().unwrap(), 5);
    assert_eq!(h.heap_free_bytes(), free_before);
}

#[test]
fn retargeted_root_pins_the_new_target_only() {
    let mut h = heap();
    let first = number_list(&mut h, 2);
    let second = number_list(&mut h, 3);
    let root = h.add_root(first).unwrap();

    assert!(h.set_root(root, second));
    assert_eq!(h.collect().unwrap(), 4);
    assert!(h.is_live(second));
    assert!(!h.is_live(first));
}

#[test]
fn root_set_overflow_is_reported() {
    let mut h = heap();
    let mut roots = Vec::new();
    for _ in 0..8 {
        let cell = h.make_cons(ValueRef::Nil, ValueRef::Nil).unwrap();
        roots.push(h.add_root(cell).unwrap());
    }
    let extra = h.make_cons(ValueRef::Nil, ValueRef::Nil).unwrap();
    assert_eq!(
        h.add_root(extra),
        Err(MemError::RootSetFull { max_roots: 8 })
    );

    // Removing one frees a table entry.
    h.remove_root(roots[0]);
    assert!(h.add_root(extra).is_ok());
}

#[test]
fn stale_root_never_marks_a_swept_slot() {
    let mut pool = SlotPool::new(8);
    let mut bytes = ByteHeap::new(256, 32);
    let mut gc = Collector::new(4, 8);

    let slot = pool.allocate(Value::Number(7)).unwrap();
    assert_eq!(gc.collect(&mut pool, &mut bytes).unwrap(), 1);
    assert!(!pool.is_allocated(slot));

    // A root added after the slot was swept must not pin or corrupt it:
    // a mark bit on a free slot would break the occupancy/mark pairing.
    gc.add_root(ValueRef::Slot(slot)).unwrap();
    assert_eq!(gc.collect(&mut pool, &mut bytes).unwrap(), 0);
    assert!(!pool.is_marked(slot));
    assert!(!pool.is_allocated(slot));
}

#[test]
fn mark_stack_overflow_aborts_without_freeing() {
    let mut h = ObjectHeap::new(MemoryConfig {
        pool_capacity: 64,
        heap_bytes: 256,
        chunk_size: 32,
        max_roots: 4,
        mark_stack_capacity: 2,
    });
    // A wide tree pushes both children of each cell; capacity 2 cannot
    // hold the frontier of a depth-3 complete tree.
    let mut leaves = Vec::new();
    for _ in 0..4 {
        leaves.push(h.make_cons(ValueRef::Nil, ValueRef::Nil).unwrap());
    }
    let left = h.make_cons(leaves[0], leaves[1]).unwrap();
    let right = h.make_cons(leaves[2], leaves[3]).unwrap();
    let top = h.make_cons(left, right).unwrap();
    h.add_root(top).unwrap();

    let live_before = h.live_objects();
    assert_eq!(
        h.collect(),
        Err(MemError::MarkStackOverflow { capacity: 2 })
    );
    assert_eq!(h.live_objects(), live_before);
}

#[test]
fn deep_list_within_stack_capacity_collects_fine() {
    let mut h = heap();
    // A 30-element chain peaks at about 31 pending entries, within the
    // configured capacity of 64.
    let list = number_list(&mut h, 30);
    let root = h.add_root(list).unwrap();
    assert_eq!(h.collect().unwrap(), 0);
    h.remove_root(root);
    assert_eq!(h.collect().unwrap(), 60);
}

#[test]
fn collect_after_exhaustion_restores_capacity() {
    let mut h = ObjectHeap::new(MemoryConfig {
        pool_capacity: 16,
        heap_bytes: 256,
        chunk_size: 32,
        max_roots: 4,
        mark_stack_capacity: 16,
    });
    while h.make_number(0).is_ok() {}
    assert_eq!(h.free_slots(), 0);

    assert_eq!(h.collect().unwrap(), 16);
    assert_eq!(h.free_slots(), 16);
    assert!(h.make_number(1).is_ok());
}
