//! Byte heap behavior: chunk accounting, first-fit reuse, invalid free
//! tolerance and payload integrity across neighboring frees.

use chibi_lisp::runtime::mem::byte_heap::{ByteHeap, FreeStatus};

fn heap_16x32() -> ByteHeap {
    ByteHeap::new(512, 32)
}

#[test]
fn payloads_are_isolated_between_blocks() {
    let mut heap = heap_16x32();
    let a = heap.allocate_bytes(b"alpha").unwrap();
    let b = heap.allocate_bytes(b"beta").unwrap();
    let c = heap.allocate_bytes(b"gamma").unwrap();

    heap.free(b);
    assert_eq!(heap.bytes(a), b"alpha");
    assert_eq!(heap.bytes(c), b"gamma");
}

#[test]
fn multi_chunk_blocks_round_trip() {
    let mut heap = heap_16x32();
    let long = "x".repeat(100);
    let ptr = heap.allocate_bytes(long.as_bytes()).unwrap();
    // 100 bytes + terminator span 4 chunks.
    assert_eq!(heap.allocated_chunks(), 4);
    assert_eq!(heap.text(ptr), long);

    assert_eq!(heap.free(ptr), FreeStatus::Freed { chunks: 4 });
    assert_eq!(heap.allocated_chunks(), 0);
    assert!(heap.validate());
}

#[test]
fn freed_runs_are_reused_first_fit() {
    let mut heap = heap_16x32();
    let blocks: Vec<_> = (0..8).map(|_| heap.allocate(64).unwrap()).collect();
    assert_eq!(heap.free_chunks(), 0);

    // Free two adjacent two-chunk blocks to open a four-chunk hole.
    heap.free(blocks[2]);
    heap.free(blocks[3]);
    let big = heap.allocate(128).unwrap();
    assert_eq!(big.chunk(), 4);
    assert!(heap.validate());
}

#[test]
fn fragmented_heap_rejects_contiguous_request() {
    let mut heap = heap_16x32();
    let blocks: Vec<_> = (0..16).map(|_| heap.allocate(32).unwrap()).collect();

    // Free every other chunk: 8 free chunks but no two adjacent.
    for block in blocks.iter().step_by(2) {
        heap.free(*block);
    }
    assert_eq!(heap.free_chunks(), 8);
    assert_eq!(heap.allocate(64), None);
    assert!(heap.allocate(32).is_some());
}

#[test]
fn invalid_frees_leave_heap_consistent() {
    let mut heap = heap_16x32();
    let ptr = heap.allocate(64).unwrap();

    assert!(heap.free(ptr).is_freed());
    assert_eq!(heap.free(ptr), FreeStatus::AlreadyFree);
    assert_eq!(heap.free(ptr), FreeStatus::AlreadyFree);
    assert!(heap.validate());
    assert_eq!(heap.free_chunks(), 16);
}

#[test]
fn exhaustion_boundary_is_exact() {
    let mut heap = ByteHeap::new(128, 32);
    assert!(heap.allocate(128).is_some());
    assert_eq!(heap.allocate(1), None);
}

#[test]
fn empty_and_embedded_nul_payloads() {
    let mut heap = heap_16x32();
    let empty = heap.allocate_bytes(b"").unwrap();
    assert_eq!(empty.len(), 0);
    assert!(empty.is_empty());
    assert_eq!(heap.bytes(empty), b"");

    let nul = heap.allocate_bytes(b"a\0b").unwrap();
    assert_eq!(heap.bytes(nul), b"a\0b");
}
