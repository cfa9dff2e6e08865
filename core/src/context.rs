#![deny(unsafe_code)]
//! Process-wide shared state
//!
//! Everything the processing task, the transport task and the interrupt
//! handlers share lives in one [`SharedContext`], created once by the board
//! and passed around by reference.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use crate::counters::InterruptCounters;
use crate::handshake::Handshake;

/// Exclusive handle to the radar cube
///
/// There is exactly one per process. It is deliberately not `Clone`:
/// whoever holds it owns the cube memory.
#[derive(Debug)]
pub struct RadarCube<'a> {
    data: &'a mut [u8],
    frame: u32,
}

impl<'a> RadarCube<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, frame: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sequence number of the frame currently held in the cube
    pub fn frame_index(&self) -> u32 {
        self.frame
    }

    pub(crate) fn set_frame_index(&mut self, frame: u32) {
        self.frame = frame;
    }
}

/// Posted once when configuration has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigSummary {
    pub cube_bytes: usize,
    /// Peak bytes used in the large (DMA-capable) pool
    pub large_pool_usage: usize,
    /// Peak bytes used in the core-local pool
    pub local_pool_usage: usize,
}

pub struct SharedContext<'a, M: RawMutex> {
    pub counters: InterruptCounters,
    pub handshake: Handshake<M, RadarCube<'a>>,
    pub config_done: Signal<M, ConfigSummary>,
}

impl<'a, M: RawMutex> SharedContext<'a, M> {
    pub const fn new() -> Self {
        Self {
            counters: InterruptCounters::new(),
            handshake: Handshake::new(),
            config_done: Signal::new(),
        }
    }
}

impl<'a, M: RawMutex> Default for SharedContext<'a, M> {
    fn default() -> Self {
        Self::new()
    }
}
