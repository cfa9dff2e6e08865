#![deny(unsafe_code)]
//! Start/done handshake between the processing and transport tasks
//!
//! Two single-slot channels carry one buffer handle back and forth. The
//! processing task hands the handle off on `start` and gets it back on
//! `done`; the transport task does the reverse. With one handle and slots of
//! capacity one, at most one frame is ever in flight.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

pub struct Handshake<M: RawMutex, T> {
    start: Channel<M, T, 1>,
    done: Channel<M, T, 1>,
    in_flight: AtomicBool,
}

impl<M: RawMutex, T> Handshake<M, T> {
    pub const fn new() -> Self {
        Self {
            start: Channel::new(),
            done: Channel::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Processing side: post `start` with the buffer
    pub async fn hand_off(&self, item: T) {
        self.in_flight.store(true, Ordering::Release);
        self.start.send(item).await;
    }

    /// Transport side: wait for a buffer to send
    pub async fn wait_start(&self) -> T {
        self.start.receive().await
    }

    /// Transport side: post `done` and return the buffer
    pub async fn complete(&self, item: T) {
        self.done.send(item).await;
    }

    /// Processing side: wait until the transport is finished with the buffer
    pub async fn wait_done(&self) -> T {
        let item = self.done.receive().await;
        self.in_flight.store(false, Ordering::Release);
        item
    }

    /// A buffer has been handed off and not yet returned
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl<M: RawMutex, T> Default for Handshake<M, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;

    #[test]
    fn test_round_trip_moves_the_item() {
        let handshake: Handshake<NoopRawMutex, u32> = Handshake::new();
        assert!(!handshake.in_flight());

        block_on(handshake.hand_off(7));
        assert!(handshake.in_flight());

        let item = block_on(handshake.wait_start());
        assert_eq!(item, 7);
        assert!(handshake.in_flight());

        block_on(handshake.complete(item));
        assert_eq!(block_on(handshake.wait_done()), 7);
        assert!(!handshake.in_flight());
    }
}
