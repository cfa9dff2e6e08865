//! Burst planning for block transfers

/// One burst of a chunked transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chunk {
    pub index: usize,
    /// Byte offset into the buffer
    pub offset: usize,
    pub len: usize,
}

impl Chunk {
    pub fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Number of bursts needed for `total` bytes
///
/// A zero `max_burst` yields no chunks; [`TransportConfig::validate`]
/// rejects it before a plan is ever built.
///
/// [`TransportConfig::validate`]: crate::config::TransportConfig::validate
pub fn chunk_count(total: usize, max_burst: usize) -> usize {
    if max_burst == 0 {
        return 0;
    }
    total.div_ceil(max_burst)
}

/// Splits a buffer into bursts of at most `max_burst` bytes
///
/// Every chunk but the last is exactly `max_burst` bytes long, offsets
/// advance by `max_burst`, and the lengths sum to the buffer length.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    total: usize,
    max_burst: usize,
    next: usize,
    count: usize,
}

impl ChunkPlan {
    pub fn new(total: usize, max_burst: usize) -> Self {
        Self {
            total,
            max_burst,
            next: 0,
            count: chunk_count(total, max_burst),
        }
    }
}

impl Iterator for ChunkPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        let offset = index * self.max_burst;
        let len = self.max_burst.min(self.total - offset);
        self.next += 1;
        Some(Chunk { index, offset, len })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ChunkPlan {}

#[cfg(test)]
mod tests {
    use heapless::Vec;

    use super::*;

    #[test]
    fn test_plan_with_short_tail() {
        let chunks: Vec<Chunk, 4> = ChunkPlan::new(150_000, 65_536).collect();
        assert_eq!(
            chunks.as_slice(),
            &[
                Chunk { index: 0, offset: 0, len: 65_536 },
                Chunk { index: 1, offset: 65_536, len: 65_536 },
                Chunk { index: 2, offset: 131_072, len: 18_928 },
            ]
        );
    }

    #[test]
    fn test_plan_exact_multiple_and_small() {
        assert_eq!(ChunkPlan::new(131_072, 65_536).len(), 2);
        assert_eq!(
            ChunkPlan::new(131_072, 65_536).last().map(|c| c.len),
            Some(65_536)
        );

        let mut plan = ChunkPlan::new(6_144, 65_536);
        assert_eq!(plan.next(), Some(Chunk { index: 0, offset: 0, len: 6_144 }));
        assert_eq!(plan.next(), None);
    }

    #[test]
    fn test_empty_buffer_has_no_chunks() {
        assert_eq!(chunk_count(0, 65_536), 0);
        assert_eq!(ChunkPlan::new(0, 65_536).next(), None);
        assert_eq!(ChunkPlan::new(100, 0).next(), None);
    }

    #[test]
    fn test_chunks_cover_buffer() {
        for (total, burst) in [(1, 4), (4, 4), (17, 4), (1_000, 64), (70_000, 65_536)] {
            let mut expected_offset = 0;
            for chunk in ChunkPlan::new(total, burst) {
                assert_eq!(chunk.offset, expected_offset);
                assert!(chunk.len > 0 && chunk.len <= burst);
                expected_offset += chunk.len;
            }
            assert_eq!(expected_offset, total);
            assert_eq!(ChunkPlan::new(total, burst).len(), chunk_count(total, burst));
        }
    }
}
