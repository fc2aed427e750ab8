/// Fixed-size bit set backed by `⌈len/8⌉` bytes.
///
/// The slot pool keeps two of these (occupancy and GC marks) in lockstep with
/// its slot array. Out-of-range operations are no-ops and out-of-range reads
/// return `false`.
#[derive(Debug, Clone)]
pub struct Bitmap {
    bytes: Vec<u8>,
    len: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len.div_ceil(8)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing storage in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.bytes[index / 8] & (1 << (index % 8)) != 0
    }

    pub fn set(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        self.bytes[index / 8] |= 1 << (index % 8);
    }

    pub fn clear(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        self.bytes[index / 8] &= !(1 << (index % 8));
    }

    /// Clears every bit. O(byte_len).
    pub fn clear_all(&mut self) {
        self.bytes.fill(0);
    }

    /// Index of the first clear bit, or `None` when every bit is set.
    pub fn first_clear(&self) -> Option<usize> {
        for (byte_index, &byte) in self.bytes.iter().enumerate() {
            if byte == 0xFF {
                continue;
            }
            let bit = (!byte).trailing_zeros() as usize;
            let index = byte_index * 8 + bit;
            if index < self.len {
                return Some(index);
            }
        }
        None
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        let mut count = 0;
        for index in 0..self.len {
            if self.get(index) {
                count += 1;
            }
        }
        count
    }
}
