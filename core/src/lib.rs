//! Platform-agnostic frame pipeline for radar node firmware
//!
//! This crate contains the logic shared by every board: memory pools, the
//! processing-task state machine, the start/done handshake and the transport
//! links. It has NO hardware dependencies; boards plug in through the traits
//! in `hal-abstractions`.
//!
//! Enable the `defmt` feature on target builds to get log output.

#![no_std]
#![deny(unsafe_code)]

// must come first so the logging macros are visible to the other modules
mod fmt;

pub mod config;
pub mod context;
pub mod counters;
pub mod error;
pub mod handshake;
pub mod interrupts;
pub mod mem_pool;
pub mod pipeline;
pub mod transport;

pub use config::{CubeLayout, IrqPriorities, RadarConfig, TransportConfig};
pub use context::{ConfigSummary, RadarCube, SharedContext};
pub use counters::{CounterSnapshot, InterruptCounters};
pub use error::{ConfigError, FramingError, PipelineError, PoolError, TransportError};
pub use handshake::Handshake;
pub use interrupts::{InterruptHub, IsrHandler};
pub use mem_pool::{Arena, MemoryPool, MemoryPoolConfig};
pub use pipeline::{open_engine, FrameProcessor, FrameState};
pub use transport::{
    BlockTransport, FrameDecoder, FrameSink, SendReport, TransportChannel, TransportStats,
    WordTransport,
};
