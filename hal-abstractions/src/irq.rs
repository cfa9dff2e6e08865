#![deny(unsafe_code)]
//! Interrupt controller abstraction for RF timing events

use core::fmt;

/// Hardware timing events raised by the RF front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingEvent {
    /// Frame timer fired, a new frame begins
    FrameStart,
    /// Chirp timer fired, a chirp begins
    ChirpStart,
    /// ADC data for one chirp is available
    ChirpAvailable,
}

impl TimingEvent {
    /// Number of distinct events
    pub const COUNT: usize = 3;

    /// All events, in registration order
    pub const ALL: [TimingEvent; Self::COUNT] = [
        TimingEvent::FrameStart,
        TimingEvent::ChirpStart,
        TimingEvent::ChirpAvailable,
    ];

    /// Dense index for table lookups
    pub const fn index(self) -> usize {
        match self {
            TimingEvent::FrameStart => 0,
            TimingEvent::ChirpStart => 1,
            TimingEvent::ChirpAvailable => 2,
        }
    }
}

/// Interrupt controller errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqError {
    /// Requested priority is not available for this line
    InvalidPriority,
    /// The line is not routed on this board
    Unsupported,
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPriority => write!(f, "invalid interrupt priority"),
            Self::Unsupported => write!(f, "interrupt line not supported"),
        }
    }
}

impl core::error::Error for IrqError {}

/// Register-level access to the interrupt lines of the timing events
///
/// All methods take `&self`: they are single register writes that are safe
/// to issue from interrupt context.
pub trait InterruptController {
    /// Bind a priority level to the event's line
    fn set_priority(&self, event: TimingEvent, priority: u8) -> Result<(), IrqError>;

    /// Unmask the event's line
    fn enable(&self, event: TimingEvent);

    /// Acknowledge a pending event
    fn clear(&self, event: TimingEvent);

    /// Free-running timer value, read from interrupt context
    fn timestamp(&self) -> u32;
}
