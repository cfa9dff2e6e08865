#![deny(unsafe_code)]
//! Timing-event lines
//!
//! The RF front-end drives three GPIOs that land on EXTI0..2:
//!
//! | Event           | Pin | EXTI line | Vector |
//! |-----------------|-----|-----------|--------|
//! | frame start     | PA0 | 0         | EXTI0  |
//! | chirp start     | PA1 | 1         | EXTI1  |
//! | chirp available | PA2 | 2         | EXTI2  |
//!
//! RTIC owns the NVIC side: the vectors are bound as hardware tasks at a
//! fixed priority and unmasked at boot. Masking per event is done at the
//! EXTI peripheral instead, so a line stays silent until its handler is
//! registered.

use cortex_m::peripheral::DWT;
use hal_abstractions::{InterruptController, IrqError, TimingEvent};
use stm32_metapac::{EXTI, SYSCFG};

/// Priority of the EXTI0..2 hardware tasks in main.rs
pub const TIMING_IRQ_PRIORITY: u8 = 3;

/// SYSCFG_EXTICR port code for GPIOA
const PORT_A: u8 = 0;

const fn line(event: TimingEvent) -> usize {
    match event {
        TimingEvent::FrameStart => 0,
        TimingEvent::ChirpStart => 1,
        TimingEvent::ChirpAvailable => 2,
    }
}

/// EXTI lines 0..2 with DWT cycle-counter timestamps
pub struct ExtiLines;

impl ExtiLines {
    /// Route PA0..2 to EXTI0..2 on the rising edge, all masked
    ///
    /// The DWT cycle counter must already be running.
    pub fn configure() {
        for event in TimingEvent::ALL {
            let n = line(event);
            EXTI.imr(0).modify(|w| w.set_line(n, false));
            SYSCFG.exticr(n / 4).modify(|w| w.set_exti(n % 4, PORT_A));
            EXTI.rtsr(0).modify(|w| w.set_line(n, true));
            EXTI.ftsr(0).modify(|w| w.set_line(n, false));
            EXTI.pr(0).write(|w| w.set_line(n, true));
        }
    }
}

impl InterruptController for ExtiLines {
    fn set_priority(&self, _event: TimingEvent, priority: u8) -> Result<(), IrqError> {
        // fixed by the #[task(binds = ...)] attributes
        if priority != TIMING_IRQ_PRIORITY {
            return Err(IrqError::InvalidPriority);
        }
        Ok(())
    }

    fn enable(&self, event: TimingEvent) {
        let n = line(event);
        EXTI.pr(0).write(|w| w.set_line(n, true));
        EXTI.imr(0).modify(|w| w.set_line(n, true));
    }

    fn clear(&self, event: TimingEvent) {
        // write-one-to-clear
        EXTI.pr(0).write(|w| w.set_line(line(event), true));
    }

    fn timestamp(&self) -> u32 {
        DWT::cycle_count()
    }
}
