//! Hardware abstraction traits for radar node firmware
//!
//! This crate defines the seams between the platform-agnostic pipeline in
//! `radar-core` and a concrete board. BSPs implement these traits.
//!
//! - [`engine`]: the range-processing accelerator (opaque compute engine)
//! - [`irq`]: the interrupt controller lines that carry RF timing events

#![no_std]
#![deny(unsafe_code)]

pub mod engine;
pub mod irq;

pub use engine::{
    BufferDescriptor, ComputeEngine, EngineCommand, EngineParams, EngineStatus, MimoMode,
    ProcessReport, MAX_RX_CHANNELS,
};
pub use irq::{InterruptController, IrqError, TimingEvent};
