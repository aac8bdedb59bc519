/// FixedBuffer is the single chunk handed back and forth between the read and
/// the write phase.
///
/// The storage is allocated once and never moves, so a pointer handed to an
/// in-flight request stays valid for as long as the buffer lives.
#[derive(Debug)]
pub struct FixedBuffer {
    data: Box<[u8]>,
    /// bytes produced by the last read, valid until the matching write
    /// completes
    len: usize,
}

impl FixedBuffer {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be non-zero");

        Self {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// reset discards the occupied bytes and offers the whole capacity
    /// to the next read.
    pub fn reset(&mut self) -> &mut [u8] {
        self.len = 0;
        &mut self.data
    }

    /// fill marks the first `n` bytes as produced by a read.
    ///
    /// # Panics
    /// Panics if `n` exceeds the capacity.
    pub fn fill(&mut self, n: usize) -> &[u8] {
        assert!(
            n <= self.capacity(),
            "read of {n} bytes overflows a {} byte buffer",
            self.capacity()
        );

        self.len = n;
        &self.data[..n]
    }

    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }
}
