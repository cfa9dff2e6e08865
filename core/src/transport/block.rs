//! Block-transfer link (SPI)
//!
//! The buffer goes out in bursts of at most `max_burst_bytes`, one
//! chip-select cycle each. The host adapter reads the same burst sizes, so
//! there is no framing on this link.

use embedded_hal_async::spi::SpiDevice;

use super::chunk::ChunkPlan;
use super::{FrameSink, SendReport};
use crate::config::TransportConfig;
use crate::error::TransportError;

pub struct BlockTransport<D> {
    device: D,
    config: TransportConfig,
}

impl<D: SpiDevice<u8>> BlockTransport<D> {
    pub fn new(device: D, config: TransportConfig) -> Self {
        Self { device, config }
    }

    pub fn release(self) -> D {
        self.device
    }
}

impl<D: SpiDevice<u8>> FrameSink for BlockTransport<D> {
    async fn send_buffer(&mut self, buf: &[u8]) -> Result<SendReport, TransportError> {
        let mut report = SendReport::default();
        for chunk in ChunkPlan::new(buf.len(), self.config.max_burst_bytes) {
            trace!("chunk {} offset {} len {}", chunk.index, chunk.offset, chunk.len);
            self.device
                .write(&buf[chunk.range()])
                .await
                .map_err(|_| TransportError::Chunk {
                    index: chunk.index,
                    offset: chunk.offset,
                })?;
            report.chunks += 1;
            report.bytes += chunk.len;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use embassy_futures::block_on;
    use embedded_hal_async::spi::{ErrorKind, ErrorType, Operation};

    use super::*;

    /// Records the length and first byte of every write
    struct MockSpi {
        writes: Vec<(usize, u8)>,
        fail_at: Option<usize>,
    }

    impl ErrorType for MockSpi {
        type Error = ErrorKind;
    }

    impl SpiDevice<u8> for MockSpi {
        async fn transaction(
            &mut self,
            operations: &mut [Operation<'_, u8>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                if let Operation::Write(buf) = op {
                    if self.fail_at == Some(self.writes.len()) {
                        return Err(ErrorKind::Other);
                    }
                    self.writes.push((buf.len(), buf[0]));
                }
            }
            Ok(())
        }
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i / 65_536) as u8 + 1).collect()
    }

    #[test]
    fn test_sends_bursts_in_order() {
        let buf = patterned(150_000);
        let mut link = BlockTransport::new(
            MockSpi {
                writes: Vec::new(),
                fail_at: None,
            },
            TransportConfig::default(),
        );

        let report = block_on(link.send_buffer(&buf)).unwrap();
        assert_eq!(report, SendReport { chunks: 3, bytes: 150_000 });
        assert_eq!(
            link.release().writes,
            [(65_536, 1), (65_536, 2), (18_928, 3)]
        );
    }

    #[test]
    fn test_stops_at_first_failed_chunk() {
        let buf = patterned(150_000);
        let mut link = BlockTransport::new(
            MockSpi {
                writes: Vec::new(),
                fail_at: Some(1),
            },
            TransportConfig::default(),
        );

        assert_eq!(
            block_on(link.send_buffer(&buf)),
            Err(TransportError::Chunk {
                index: 1,
                offset: 65_536,
            })
        );
        assert_eq!(link.release().writes.len(), 1);
    }

    #[test]
    fn test_sends_trailing_partial_unit() {
        for (len, expected) in [
            (150_001, &[65_536, 65_536, 18_929][..]),
            (65_537, &[65_536, 1][..]),
            (6, &[6][..]),
        ] {
            let mut link = BlockTransport::new(
                MockSpi {
                    writes: Vec::new(),
                    fail_at: None,
                },
                TransportConfig::default(),
            );

            let report = block_on(link.send_buffer(&patterned(len))).unwrap();
            assert_eq!(report.bytes, len);
            assert_eq!(report.chunks, expected.len());
            let sizes: Vec<usize> = link.release().writes.iter().map(|w| w.0).collect();
            assert_eq!(sizes, expected);
        }
    }
}
