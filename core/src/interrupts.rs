#![deny(unsafe_code)]
//! Timing-event interrupt registration and dispatch
//!
//! The board's raw interrupt vectors call [`InterruptHub::dispatch`]; the
//! hub acknowledges the line and forwards to whichever counter handler was
//! registered for it. Lines stay masked until a handler is installed.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use hal_abstractions::{InterruptController, TimingEvent};

use crate::counters::InterruptCounters;
use crate::error::PipelineError;

/// Timing-event handler, called with the controller timestamp
pub type IsrHandler = fn(&InterruptCounters, u32);

type HandlerTable = [Option<IsrHandler>; TimingEvent::COUNT];

/// Routes timing-event interrupts to counter handlers
pub struct InterruptHub<'a, C, M: RawMutex> {
    controller: &'a C,
    counters: &'a InterruptCounters,
    handlers: Mutex<M, Cell<HandlerTable>>,
}

impl<'a, C: InterruptController, M: RawMutex> InterruptHub<'a, C, M> {
    pub const fn new(controller: &'a C, counters: &'a InterruptCounters) -> Self {
        Self {
            controller,
            counters,
            handlers: Mutex::new(Cell::new([None; TimingEvent::COUNT])),
        }
    }

    /// Install `handler` for `event` and unmask its line
    ///
    /// The priority is applied first and the line is enabled last, so an
    /// event can never fire into an empty slot.
    pub fn register(
        &self,
        event: TimingEvent,
        priority: u8,
        handler: IsrHandler,
    ) -> Result<(), PipelineError> {
        self.controller
            .set_priority(event, priority)
            .map_err(|cause| PipelineError::InterruptRegistration { event, cause })?;

        self.handlers.lock(|slots| {
            let mut table = slots.get();
            table[event.index()] = Some(handler);
            slots.set(table);
        });

        self.controller.enable(event);
        debug!("registered {} at priority {}", event, priority);
        Ok(())
    }

    /// Entry point for the raw interrupt vector of `event`
    pub fn dispatch(&self, event: TimingEvent) {
        self.controller.clear(event);
        let timestamp = self.controller.timestamp();
        let handler = self.handlers.lock(|slots| slots.get()[event.index()]);
        if let Some(handler) = handler {
            handler(self.counters, timestamp);
        }
    }

    pub fn is_registered(&self, event: TimingEvent) -> bool {
        self.handlers
            .lock(|slots| slots.get()[event.index()].is_some())
    }
}
