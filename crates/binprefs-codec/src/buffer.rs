/// Initial capacity of the per-record write buffer, and the additive term
/// of its growth step.
pub(crate) const GROW_CAPACITY: usize = 128;

/// Single-use growable write buffer backing one `serialize` call.
///
/// Growth is purely a capacity concern: before a write of `len` bytes, if
/// `offset + len >= capacity - 1` the buffer reallocates to
/// `(capacity + len + GROW_CAPACITY) * 2`. The trimmed output is identical
/// no matter how many growth steps occur.
pub(crate) struct GrowableBuf {
    buf: Vec<u8>,
    offset: usize,
}

impl GrowableBuf {
    pub(crate) fn new() -> Self {
        Self {
            buf: vec![0; GROW_CAPACITY],
            offset: 0,
        }
    }

    /// Append `bytes`, growing the buffer if needed.
    pub(crate) fn write(&mut self, bytes: &[u8]) {
        self.try_grow(bytes.len());
        self.buf[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
    }

    fn try_grow(&mut self, len: usize) {
        let out_of_bounds = self.offset + len >= self.buf.len().saturating_sub(1);
        if out_of_bounds {
            let new_len = (self.buf.len() + len + GROW_CAPACITY) * 2;
            self.buf.resize(new_len, 0);
        }
    }

    /// Bytes written so far.
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Consume the buffer, returning exactly the bytes written.
    pub(crate) fn into_trimmed(mut self) -> Vec<u8> {
        self.buf.truncate(self.offset);
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_to_written_bytes() {
        let mut buf = GrowableBuf::new();
        buf.write(&[1, 2, 3]);
        assert_eq!(buf.offset(), 3);
        assert_eq!(buf.into_trimmed(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_buffer_trims_to_empty() {
        let buf = GrowableBuf::new();
        assert_eq!(buf.into_trimmed(), Vec::<u8>::new());
    }

    #[test]
    fn growth_preserves_earlier_writes() {
        let mut buf = GrowableBuf::new();
        buf.write(&[0xAB; 100]);
        // Crosses the initial 128-byte capacity.
        buf.write(&[0xCD; 100]);
        buf.write(&[0xEF; 5000]);

        let out = buf.into_trimmed();
        assert_eq!(out.len(), 5200);
        assert!(out[..100].iter().all(|&b| b == 0xAB));
        assert!(out[100..200].iter().all(|&b| b == 0xCD));
        assert!(out[200..].iter().all(|&b| b == 0xEF));
    }

    #[test]
    fn growth_is_transparent_in_output() {
        // Many small writes (several growth steps) vs. one big write.
        let chunk: Vec<u8> = (0..=255).collect();
        let mut grown = GrowableBuf::new();
        for _ in 0..16 {
            grown.write(&chunk);
        }

        let mut presized = GrowableBuf::new();
        let big: Vec<u8> = std::iter::repeat(chunk.clone()).take(16).flatten().collect();
        presized.write(&big);

        assert_eq!(grown.into_trimmed(), presized.into_trimmed());
    }

    #[test]
    fn single_write_near_capacity_boundary() {
        for n in 125..=130 {
            let mut buf = GrowableBuf::new();
            buf.write(&vec![7u8; n]);
            assert_eq!(buf.into_trimmed(), vec![7u8; n]);
        }
    }
}
