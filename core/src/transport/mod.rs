#![deny(unsafe_code)]
//! Moving radar cubes off-chip
//!
//! The transport task waits on the handshake's start slot, pushes the cube
//! out through a [`FrameSink`] and always hands the cube back on the done
//! slot, whether or not the send succeeded. A failed frame is logged and
//! dropped; the pipeline never retries.
//!
//! Two sinks are provided:
//!
//! - [`BlockTransport`]: SPI, bursts of up to 64 KiB, no framing
//! - [`WordTransport`]: UART, one write per 4-byte unit between header and
//!   footer markers

pub mod block;
pub mod chunk;
pub mod decoder;
pub mod word;

use core::future::Future;

use embassy_sync::blocking_mutex::raw::RawMutex;

pub use block::BlockTransport;
pub use chunk::{chunk_count, Chunk, ChunkPlan};
pub use decoder::FrameDecoder;
pub use word::{WordTransport, FOOTER, HEADER};

use crate::context::SharedContext;
use crate::error::TransportError;

/// What a successful send put on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendReport {
    /// Bursts on a block link, units on a word link
    pub chunks: usize,
    /// Payload bytes, excluding framing
    pub bytes: usize,
}

/// Per-channel frame counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportStats {
    pub frames_sent: u32,
    pub frames_failed: u32,
}

/// A link that can carry one whole buffer per call
pub trait FrameSink {
    fn send_buffer(
        &mut self,
        buf: &[u8],
    ) -> impl Future<Output = Result<SendReport, TransportError>>;
}

/// Transport task body
pub struct TransportChannel<'a, 'c, S, M: RawMutex> {
    sink: S,
    context: &'c SharedContext<'a, M>,
    stats: TransportStats,
}

impl<'a, 'c, S: FrameSink, M: RawMutex> TransportChannel<'a, 'c, S, M> {
    pub fn new(sink: S, context: &'c SharedContext<'a, M>) -> Self {
        Self {
            sink,
            context,
            stats: TransportStats::default(),
        }
    }

    /// Send one handed-off cube and give it back
    ///
    /// The done slot is posted exactly once per start, also on failure.
    pub async fn serve_one(&mut self) -> Result<SendReport, TransportError> {
        let cube = self.context.handshake.wait_start().await;
        let result = self.sink.send_buffer(cube.as_bytes()).await;
        match &result {
            Ok(report) => {
                self.stats.frames_sent = self.stats.frames_sent.wrapping_add(1);
                trace!(
                    "frame {} sent: {} bytes in {} chunks",
                    cube.frame_index(),
                    report.bytes,
                    report.chunks
                );
            }
            Err(e) => {
                self.stats.frames_failed = self.stats.frames_failed.wrapping_add(1);
                warn!("frame {} dropped: {}", cube.frame_index(), e);
            }
        }
        self.context.handshake.complete(cube).await;
        result
    }

    pub async fn run(&mut self) -> ! {
        info!("transport running");
        loop {
            // failures are already logged and counted
            let _ = self.serve_one().await;
        }
    }

    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
