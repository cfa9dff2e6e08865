//! Word-framed link (UART)
//!
//! ```text
//! AA BB CC DD | unit 0 | unit 1 | ... | unit N-1 | DD CC BB AA
//! ```
//!
//! No length field and no checksum: the receiver knows the payload size and
//! resynchronises by hunting for the header.

use embedded_io_async::Write;

use super::{FrameSink, SendReport};
use crate::config::TransportConfig;
use crate::error::TransportError;

pub const HEADER: [u8; 4] = [0xAA, 0xBB, 0xCC, 0xDD];
pub const FOOTER: [u8; 4] = [0xDD, 0xCC, 0xBB, 0xAA];

pub struct WordTransport<W> {
    writer: W,
    unit_bytes: usize,
    units_per_frame: Option<usize>,
}

impl<W: Write> WordTransport<W> {
    pub fn new(writer: W, config: &TransportConfig) -> Self {
        Self {
            writer,
            unit_bytes: config.unit_bytes,
            units_per_frame: None,
        }
    }

    /// Send only the first `units` of every buffer
    ///
    /// Serial plotters typically want a single range profile rather than
    /// the whole cube.
    pub fn with_units_per_frame(mut self, units: usize) -> Self {
        self.units_per_frame = Some(units);
        self
    }

    pub fn release(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for WordTransport<W> {
    async fn send_buffer(&mut self, buf: &[u8]) -> Result<SendReport, TransportError> {
        let unit = self.unit_bytes;
        if unit == 0 || buf.len() % unit != 0 {
            return Err(TransportError::UnalignedLength {
                len: buf.len(),
                unit,
            });
        }

        let available = buf.len() / unit;
        let units = self
            .units_per_frame
            .map_or(available, |limit| limit.min(available));

        self.writer
            .write_all(&HEADER)
            .await
            .map_err(|_| TransportError::Write)?;
        for word in buf.chunks_exact(unit).take(units) {
            self.writer
                .write_all(word)
                .await
                .map_err(|_| TransportError::Write)?;
        }
        self.writer
            .write_all(&FOOTER)
            .await
            .map_err(|_| TransportError::Write)?;
        self.writer.flush().await.map_err(|_| TransportError::Write)?;

        Ok(SendReport {
            chunks: units,
            bytes: units * unit,
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use embassy_futures::block_on;
    use embedded_io_async::{ErrorKind, ErrorType};

    use super::*;

    #[derive(Default)]
    struct MockUart {
        bytes: Vec<u8>,
        calls: usize,
        flushed: bool,
        fail_after: Option<usize>,
    }

    impl ErrorType for MockUart {
        type Error = ErrorKind;
    }

    impl Write for MockUart {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.fail_after == Some(self.calls) {
                return Err(ErrorKind::Other);
            }
            self.calls += 1;
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushed = true;
            Ok(())
        }
    }

    #[test]
    fn test_frames_every_unit() {
        let payload: Vec<u8> = (0..512u32).map(|i| i as u8).collect();
        let mut link = WordTransport::new(MockUart::default(), &TransportConfig::default());

        let report = block_on(link.send_buffer(&payload)).unwrap();
        assert_eq!(report, SendReport { chunks: 128, bytes: 512 });

        let uart = link.release();
        // header + one write per unit + footer
        assert_eq!(uart.calls, 130);
        assert!(uart.flushed);
        assert_eq!(uart.bytes.len(), 520);
        assert_eq!(uart.bytes[..4], HEADER);
        assert_eq!(uart.bytes[4..516], payload[..]);
        assert_eq!(uart.bytes[516..], FOOTER);
    }

    #[test]
    fn test_unit_limit() {
        let payload = [1u8; 6_144];
        let mut link = WordTransport::new(MockUart::default(), &TransportConfig::default())
            .with_units_per_frame(128);

        let report = block_on(link.send_buffer(&payload)).unwrap();
        assert_eq!(report.chunks, 128);
        assert_eq!(link.release().bytes.len(), 8 + 512);
    }

    #[test]
    fn test_write_failure_skips_footer() {
        let mut link = WordTransport::new(
            MockUart {
                fail_after: Some(2),
                ..MockUart::default()
            },
            &TransportConfig::default(),
        );

        assert_eq!(
            block_on(link.send_buffer(&[0u8; 16])),
            Err(TransportError::Write)
        );
        let uart = link.release();
        assert_eq!(uart.bytes.len(), 8);
        assert!(!uart.flushed);
    }
}
