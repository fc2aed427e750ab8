//! Chunked byte arena for variable-length payloads.
//!
//! The arena is a fixed byte buffer divided into fixed-size chunks. Each
//! chunk carries one bookkeeping entry: free, head of a live block (with the
//! block length in chunks), or continuation of the preceding head. Allocation
//! is a first-fit linear scan over chunk indices; there is no coalescing
//! beyond what the scan naturally finds contiguous.
//!
//! Chunk granularity bounds internal fragmentation to at most
//! `chunk_size - 1` bytes per block and keeps bookkeeping to one entry per
//! chunk rather than per byte.

/// Handle to an allocated block: head chunk index plus payload length in
/// bytes. Copyable and index-based; never a raw address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapPtr {
    chunk: u32,
    len: u32,
}

impl HeapPtr {
    pub fn chunk(self) -> usize {
        self.chunk as usize
    }

    /// Payload length in bytes (terminator excluded).
    pub fn len(self) -> usize {
        self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    pub fn new_for_test(chunk: u32, len: u32) -> Self {
        Self { chunk, len }
    }
}

/// Per-chunk bookkeeping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkInfo {
    Free,
    /// First chunk of a live block spanning this many chunks.
    BlockStart(u32),
    /// Interior chunk of the block started by the nearest preceding head.
    Continuation,
}

/// Outcome of [`ByteHeap::free`]. Invalid frees are tolerated no-ops so a
/// client double-free cannot corrupt the arena, but the status is returned
/// so callers and tests can observe them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeStatus {
    Freed { chunks: usize },
    OutOfRange,
    AlreadyFree,
    NotBlockHead,
}

impl FreeStatus {
    pub fn is_freed(self) -> bool {
        matches!(self, FreeStatus::Freed { .. })
    }
}

/// Fixed-capacity chunked byte heap.
#[derive(Debug)]
pub struct ByteHeap {
    arena: Vec<u8>,
    chunk_info: Vec<ChunkInfo>,
    chunk_size: usize,
}

impl ByteHeap {
    /// Creates an arena of `heap_bytes` rounded down to a whole number of
    /// chunks. All chunks start free.
    pub fn new(heap_bytes: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunk_count = heap_bytes / chunk_size;
        Self {
            arena: vec![0u8; chunk_count * chunk_size],
            chunk_info: vec![ChunkInfo::Free; chunk_count],
            chunk_size,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_info.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.arena.len()
    }

    /// Reserves a block of at least `size` bytes. Fails on `size == 0` or
    /// when no run of `⌈size/chunk_size⌉` contiguous free chunks exists.
    pub fn allocate(&mut self, size: usize) -> Option<HeapPtr> {
        if size == 0 {
            return None;
        }
        let needed = size.div_ceil(self.chunk_size);
        let count = self.chunk_count();
        if needed > count {
            return None;
        }

        let mut i = 0;
        while i + needed <= count {
            match self.first_used_in(i, needed) {
                // First fit: claim the run.
                None => {
                    self.chunk_info[i] = ChunkInfo::BlockStart(needed as u32);
                    for j in 1..needed {
                        self.chunk_info[i + j] = ChunkInfo::Continuation;
                    }
                    return Some(HeapPtr {
                        chunk: i as u32,
                        len: size as u32,
                    });
                }
                // Resume the scan past the chunk that broke the run.
                Some(used) => i = used + 1,
            }
        }
        None
    }

    /// Copies `data` into a fresh block sized for the payload plus a NUL
    /// terminator, matching the original allocation layout for strings and
    /// symbols. The returned pointer's length covers the payload only.
    pub fn allocate_bytes(&mut self, data: &[u8]) -> Option<HeapPtr> {
        let mut ptr = self.allocate(data.len() + 1)?;
        let start = ptr.chunk() * self.chunk_size;
        self.arena[start..start + data.len()].copy_from_slice(data);
        self.arena[start + data.len()] = 0;
        ptr.len = data.len() as u32;
        Some(ptr)
    }

    /// Releases the block headed at `ptr`. A pointer that does not refer to
    /// the head chunk of a live block is a no-op; the status says why.
    pub fn free(&mut self, ptr: HeapPtr) -> FreeStatus {
        let head = ptr.chunk();
        if head >= self.chunk_count() {
            return FreeStatus::OutOfRange;
        }
        match self.chunk_info[head] {
            ChunkInfo::Free => FreeStatus::AlreadyFree,
            ChunkInfo::Continuation => FreeStatus::NotBlockHead,
            ChunkInfo::BlockStart(span) => {
                let span = span as usize;
                for j in 0..span {
                    self.chunk_info[head + j] = ChunkInfo::Free;
                }
                let start = head * self.chunk_size;
                self.arena[start..start + span * self.chunk_size].fill(0);
                FreeStatus::Freed { chunks: span }
            }
        }
    }

    /// Payload bytes of a block. Returns an empty slice for pointers that do
    /// not refer to a live block head.
    pub fn bytes(&self, ptr: HeapPtr) -> &[u8] {
        let head = ptr.chunk();
        if head >= self.chunk_count() {
            return &[];
        }
        let ChunkInfo::BlockStart(span) = self.chunk_info[head] else {
            return &[];
        };
        if ptr.len() > span as usize * self.chunk_size {
            return &[];
        }
        let start = head * self.chunk_size;
        &self.arena[start..start + ptr.len()]
    }

    /// Payload interpreted as UTF-8; lossy fallback is the empty string.
    pub fn text(&self, ptr: HeapPtr) -> &str {
        std::str::from_utf8(self.bytes(ptr)).unwrap_or("")
    }

    // -- Statistics, derived by scanning chunk_info --

    pub fn allocated_chunks(&self) -> usize {
        self.chunk_info
            .iter()
            .filter(|info| !matches!(info, ChunkInfo::Free))
            .count()
    }

    pub fn free_chunks(&self) -> usize {
        self.chunk_count() - self.allocated_chunks()
    }

    pub fn used_bytes(&self) -> usize {
        self.allocated_chunks() * self.chunk_size
    }

    pub fn free_bytes(&self) -> usize {
        self.total_bytes() - self.used_bytes()
    }

    /// Checks chunk bookkeeping consistency: every block head is followed by
    /// exactly its continuations, and no continuation is orphaned.
    pub fn validate(&self) -> bool {
        let mut i = 0;
        let count = self.chunk_count();
        while i < count {
            match self.chunk_info[i] {
                ChunkInfo::Free => i += 1,
                ChunkInfo::Continuation => return false,
                ChunkInfo::BlockStart(span) => {
                    let span = span as usize;
                    if span == 0 || i + span > count {
                        return false;
                    }
                    for j in 1..span {
                        if self.chunk_info[i + j] != ChunkInfo::Continuation {
                            return false;
                        }
                    }
                    i += span;
                }
            }
        }
        true
    }

    fn first_used_in(&self, start: usize, len: usize) -> Option<usize> {
        (start..start + len).find(|&i| self.chunk_info[i] != ChunkInfo::Free)
    }
}
