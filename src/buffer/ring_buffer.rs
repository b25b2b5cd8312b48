//! Power-of-two circular buffer of interleaved PCM samples
//!
//! Two positions are tracked:
//! - the physical cursor, the next slot to be overwritten (`0..capacity`)
//! - the logical write position, the number of samples written since the
//!   buffer was (re)allocated
//!
//! Readers address samples by logical index. Any logical index, including
//! negative ones and indices past the write position, maps onto a slot via
//! `index mod capacity`, so there is no failure path on read. Slots that were
//! never written read as zero.

/// Smallest capacity ever allocated
const MIN_CAPACITY: usize = 2;

/// Fixed-capacity circular store of i16 samples
#[derive(Debug, Default)]
pub struct RingBuffer {
    slots: Box<[i16]>,
    cursor: usize,
    written: u64,
}

impl RingBuffer {
    /// Allocate a zeroed buffer holding at least `min_samples` samples
    pub fn with_capacity(min_samples: usize) -> Self {
        let mut buffer = Self::default();
        buffer.ensure_capacity(min_samples);
        buffer
    }

    /// Grow to the smallest power of two >= `min_samples` if needed
    ///
    /// Reallocation discards every buffered sample and resets both the cursor
    /// and the logical write position. Returns `true` when that happened.
    /// A buffer that is already large enough, including exactly large enough,
    /// is left untouched.
    pub fn ensure_capacity(&mut self, min_samples: usize) -> bool {
        if self.slots.len() >= min_samples {
            return false;
        }

        let capacity = min_samples.next_power_of_two().max(MIN_CAPACITY);
        log::debug!(
            "Reallocating ring buffer: {} -> {} samples (requested {})",
            self.slots.len(),
            capacity,
            min_samples
        );

        self.slots = vec![0i16; capacity].into_boxed_slice();
        self.cursor = 0;
        self.written = 0;
        true
    }

    /// Store one sample at the cursor and advance
    ///
    /// Writes into an unallocated buffer are dropped.
    #[inline]
    pub fn write(&mut self, sample: i16) {
        if self.slots.is_empty() {
            return;
        }
        self.slots[self.cursor] = sample;
        // Capacity is a power of two
        self.cursor = (self.cursor + 1) & (self.slots.len() - 1);
        self.written += 1;
    }

    /// Store a run of samples in order
    #[inline]
    pub fn write_slice(&mut self, samples: &[i16]) {
        for &sample in samples {
            self.write(sample);
        }
    }

    /// Sample stored at `logical_index mod capacity`
    #[inline]
    pub fn read(&self, logical_index: i64) -> i16 {
        if self.slots.is_empty() {
            return 0;
        }
        let slot = logical_index.rem_euclid(self.slots.len() as i64) as usize;
        self.slots[slot]
    }

    /// Number of sample slots (0 until first allocation)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Next slot to be overwritten
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Samples written since the last (re)allocation
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Whether storage has been allocated yet
    pub fn is_allocated(&self) -> bool {
        !self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_power_of_two() {
        for n in [0usize, 1, 2, 3, 5, 100, 1000, 44100 * 3, 48000 * 2 * 3] {
            let buffer = RingBuffer::with_capacity(n);
            if n == 0 {
                assert!(!buffer.is_allocated());
                continue;
            }
            assert!(buffer.capacity() >= n, "capacity {} < {}", buffer.capacity(), n);
            assert!(buffer.capacity().is_power_of_two());
        }
    }

    #[test]
    fn test_unallocated_reads_zero_and_drops_writes() {
        let mut buffer = RingBuffer::default();
        buffer.write(42);
        assert_eq!(buffer.written(), 0);
        assert_eq!(buffer.read(0), 0);
        assert_eq!(buffer.read(-7), 0);
    }

    #[test]
    fn test_fresh_allocation_reads_zero() {
        let buffer = RingBuffer::with_capacity(16);
        for i in -32..32 {
            assert_eq!(buffer.read(i), 0);
        }
    }

    #[test]
    fn test_wraparound_keeps_latest_values() {
        let mut buffer = RingBuffer::with_capacity(8);
        for value in 0..21i16 {
            buffer.write(value);
        }
        assert_eq!(buffer.written(), 21);
        assert_eq!(buffer.cursor(), 21 % 8);

        // The last 8 logical indices hold the last 8 values
        for i in 13..21i64 {
            assert_eq!(buffer.read(i), i as i16);
        }
        // Older indices alias onto the same slots
        assert_eq!(buffer.read(5), 13);
    }

    #[test]
    fn test_negative_index_wraps() {
        let mut buffer = RingBuffer::with_capacity(4);
        buffer.write_slice(&[1, 2, 3, 4]);
        assert_eq!(buffer.read(-1), 4);
        assert_eq!(buffer.read(-4), 1);
        assert_eq!(buffer.read(-5), 4);
    }

    #[test]
    fn test_growth_discards_history() {
        let mut buffer = RingBuffer::with_capacity(4);
        buffer.write_slice(&[9, 9, 9]);

        assert!(buffer.ensure_capacity(5));
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.written(), 0);
        for i in 0..8 {
            assert_eq!(buffer.read(i), 0);
        }
    }

    #[test]
    fn test_exact_capacity_does_not_reallocate() {
        let mut buffer = RingBuffer::with_capacity(8);
        buffer.write_slice(&[1, 2, 3]);

        assert!(!buffer.ensure_capacity(8));
        assert!(!buffer.ensure_capacity(3));
        assert_eq!(buffer.written(), 3);
        assert_eq!(buffer.read(2), 3);
    }
}
