#![deny(unsafe_code)]
//! Pipeline error types
//!
//! Errors are split by where they surface. Configuration, engine and
//! interrupt-registration failures end up in [`PipelineError`] and halt the
//! firmware; [`TransportError`] is logged by the transport task and the frame
//! is dropped.

use core::fmt;

use hal_abstractions::{EngineStatus, IrqError, TimingEvent};

/// Memory pool errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PoolError {
    /// Allocation does not fit in the remaining pool space
    Exhausted {
        /// Bytes asked for
        requested: usize,
        /// Bytes left after the cursor
        available: usize,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted {
                requested,
                available,
            } => write!(
                f,
                "pool exhausted: requested {} bytes, {} available",
                requested, available
            ),
        }
    }
}

impl core::error::Error for PoolError {}

/// Invalid radar or transport configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A dimension that must be non-zero is zero
    ZeroDimension,
    /// More antennas than the front-end provides
    TooManyAntennas,
    /// MIMO pattern select is neither TDM (0, 1) nor BPM (4)
    UnsupportedMimo(u8),
    /// Chirps per frame is not a multiple of the TX antenna count
    UnevenDopplerChirps,
    /// Bursts × chirps per burst does not fit a frame
    TooManyChirps,
    /// Burst size is zero or not a multiple of the unit size
    InvalidBurstSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "zero dimension in radar configuration"),
            Self::TooManyAntennas => write!(f, "too many antennas"),
            Self::UnsupportedMimo(sel) => write!(
                f,
                "MIMO select {} unsupported, expected 1 (TDM) or 4 (BPM)",
                sel
            ),
            Self::UnevenDopplerChirps => {
                write!(f, "chirps per frame not divisible by TX antennas")
            }
            Self::TooManyChirps => write!(f, "too many chirps per frame"),
            Self::InvalidBurstSize => write!(f, "burst size must be a multiple of the unit size"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Transport send failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// A block transfer failed; the remaining chunks were not sent
    Chunk {
        /// Zero-based chunk number
        index: usize,
        /// Byte offset of the chunk into the buffer
        offset: usize,
    },
    /// Writing the header, a unit or the footer failed on a word link
    Write,
    /// Buffer length is not a whole number of units on a word link
    UnalignedLength {
        /// Buffer length in bytes
        len: usize,
        /// Unit size in bytes
        unit: usize,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chunk { index, offset } => {
                write!(f, "chunk {} at offset {} failed", index, offset)
            }
            Self::Write => write!(f, "link write failed"),
            Self::UnalignedLength { len, unit } => {
                write!(f, "{} bytes is not a multiple of {}-byte units", len, unit)
            }
        }
    }
}

impl core::error::Error for TransportError {}

/// Host-side frame decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingError {
    /// Payload was followed by something other than the footer marker
    BadFooter,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadFooter => write!(f, "footer marker mismatch"),
        }
    }
}

impl core::error::Error for FramingError {}

/// Fatal processing-task errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineError {
    /// Radar configuration rejected
    Config(ConfigError),
    /// Working buffer or radar cube did not fit its pool
    Alloc(PoolError),
    /// Engine could not be opened
    EngineInit(EngineStatus),
    /// Engine rejected the parameter set
    EngineConfigure(EngineStatus),
    /// Trigger command failed
    Trigger(EngineStatus),
    /// Frame processing failed
    Process(EngineStatus),
    /// A timing-event handler could not be registered
    InterruptRegistration {
        event: TimingEvent,
        cause: IrqError,
    },
    /// `start` was called twice; buffers are derived once per process
    AlreadyConfigured,
    /// A frame was run before `start`
    NotConfigured,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {}", e),
            Self::Alloc(e) => write!(f, "allocation error: {}", e),
            Self::EngineInit(s) => write!(f, "engine init failed: {}", s),
            Self::EngineConfigure(s) => write!(f, "engine configure failed: {}", s),
            Self::Trigger(s) => write!(f, "trigger failed: {}", s),
            Self::Process(s) => write!(f, "process failed: {}", s),
            Self::InterruptRegistration { event, cause } => {
                write!(f, "registering {:?} failed: {}", event, cause)
            }
            Self::AlreadyConfigured => write!(f, "pipeline already configured"),
            Self::NotConfigured => write!(f, "pipeline not configured"),
        }
    }
}

impl core::error::Error for PipelineError {}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PoolError> for PipelineError {
    fn from(e: PoolError) -> Self {
        Self::Alloc(e)
    }
}
