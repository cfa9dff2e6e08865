//! Receiver side of the word-framed link
//!
//! Feed the byte stream one byte at a time; a complete payload pops out once
//! the footer has been checked. Bytes before a header are discarded.

use heapless::Vec;

use super::word::{FOOTER, HEADER};
use crate::error::FramingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Number of header bytes matched so far
    Header(usize),
    Payload,
    /// Number of footer bytes matched so far
    Footer(usize),
}

/// Reassembles frames carrying exactly `N` payload bytes
pub struct FrameDecoder<const N: usize> {
    phase: Phase,
    payload: Vec<u8, N>,
}

impl<const N: usize> FrameDecoder<N> {
    pub const fn new() -> Self {
        Self {
            phase: Phase::Header(0),
            payload: Vec::new(),
        }
    }

    /// Drop any partial frame and go back to hunting for a header
    pub fn reset(&mut self) {
        self.phase = Phase::Header(0);
        self.payload.clear();
    }

    pub fn feed(&mut self, byte: u8) -> Option<Result<Vec<u8, N>, FramingError>> {
        match self.phase {
            Phase::Header(matched) => {
                self.phase = Phase::Header(advance_header(matched, byte));
                if self.phase == Phase::Header(HEADER.len()) {
                    self.payload.clear();
                    self.phase = if N == 0 { Phase::Footer(0) } else { Phase::Payload };
                }
                None
            }
            Phase::Payload => {
                // capacity is N and the phase ends at N bytes, so this never fails
                let _ = self.payload.push(byte);
                if self.payload.len() == N {
                    self.phase = Phase::Footer(0);
                }
                None
            }
            Phase::Footer(matched) => {
                if byte != FOOTER[matched] {
                    self.reset();
                    self.phase = Phase::Header(advance_header(0, byte));
                    return Some(Err(FramingError::BadFooter));
                }
                if matched + 1 < FOOTER.len() {
                    self.phase = Phase::Footer(matched + 1);
                    return None;
                }
                self.phase = Phase::Header(0);
                Some(Ok(core::mem::take(&mut self.payload)))
            }
        }
    }
}

impl<const N: usize> Default for FrameDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Header match length after seeing `byte` with `matched` bytes already matched
///
/// The header bytes are all distinct, so on a mismatch the only possible
/// restart is the mismatching byte itself being the first header byte.
fn advance_header(matched: usize, byte: u8) -> usize {
    if byte == HEADER[matched] {
        matched + 1
    } else if byte == HEADER[0] {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all<const N: usize>(
        decoder: &mut FrameDecoder<N>,
        bytes: &[u8],
    ) -> heapless::Vec<Result<Vec<u8, N>, FramingError>, 4> {
        let mut out = heapless::Vec::new();
        for &b in bytes {
            if let Some(result) = decoder.feed(b) {
                out.push(result).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_decodes_after_noise() {
        let mut decoder: FrameDecoder<8> = FrameDecoder::new();
        let stream = [
            0x01, 0xAA, 0x02, // noise, including a lone header byte
            0xAA, 0xBB, 0xCC, 0xDD, 1, 2, 3, 4, 5, 6, 7, 8, 0xDD, 0xCC, 0xBB, 0xAA,
        ];
        let frames = feed_all(&mut decoder, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_deref(), Ok(&[1, 2, 3, 4, 5, 6, 7, 8][..]));
    }

    #[test]
    fn test_repeated_first_header_byte() {
        let mut decoder: FrameDecoder<4> = FrameDecoder::new();
        let stream = [
            0xAA, 0xAA, 0xBB, 0xCC, 0xDD, 9, 9, 9, 9, 0xDD, 0xCC, 0xBB, 0xAA,
        ];
        let frames = feed_all(&mut decoder, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_deref(), Ok(&[9, 9, 9, 9][..]));
    }

    #[test]
    fn test_bad_footer_resyncs() {
        let mut decoder: FrameDecoder<4> = FrameDecoder::new();
        let stream = [
            0xAA, 0xBB, 0xCC, 0xDD, 1, 2, 3, 4, 0xDD, 0xCC, 0x00, 0xAA, // broken
            0xAA, 0xBB, 0xCC, 0xDD, 5, 6, 7, 8, 0xDD, 0xCC, 0xBB, 0xAA,
        ];
        let frames = feed_all(&mut decoder, &stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Err(FramingError::BadFooter));
        assert_eq!(frames[1].as_deref(), Ok(&[5, 6, 7, 8][..]));
    }

    #[test]
    fn test_payload_may_contain_markers() {
        let mut decoder: FrameDecoder<4> = FrameDecoder::new();
        let stream = [
            0xAA, 0xBB, 0xCC, 0xDD, 0xAA, 0xBB, 0xCC, 0xDD, 0xDD, 0xCC, 0xBB, 0xAA,
        ];
        let frames = feed_all(&mut decoder, &stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_deref(), Ok(&HEADER[..]));
    }
}
