#![deny(unsafe_code)]
//! Timing-event counters
//!
//! Incremented only from the timing-event interrupt handlers and read from
//! anywhere for diagnostics. Nothing in the pipeline branches on them.

use core::sync::atomic::{AtomicU32, Ordering};

/// Frame, chirp and chirp-available counts plus frame-start timestamps
#[derive(Debug, Default)]
pub struct InterruptCounters {
    frames: AtomicU32,
    chirps: AtomicU32,
    chirps_available: AtomicU32,
    last_frame_start: AtomicU32,
    prev_frame_start: AtomicU32,
}

/// Point-in-time copy of [`InterruptCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterSnapshot {
    pub frames: u32,
    pub chirps: u32,
    pub chirps_available: u32,
    /// Timer value captured at the most recent frame start
    pub last_frame_start: u32,
}

impl InterruptCounters {
    pub const fn new() -> Self {
        Self {
            frames: AtomicU32::new(0),
            chirps: AtomicU32::new(0),
            chirps_available: AtomicU32::new(0),
            last_frame_start: AtomicU32::new(0),
            prev_frame_start: AtomicU32::new(0),
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            chirps: self.chirps.load(Ordering::Relaxed),
            chirps_available: self.chirps_available.load(Ordering::Relaxed),
            last_frame_start: self.last_frame_start.load(Ordering::Relaxed),
        }
    }

    /// Timer ticks between the last two frame starts
    ///
    /// `None` until two frames have started. The timer is free-running, so
    /// the difference is taken modulo 2^32.
    pub fn frame_period_ticks(&self) -> Option<u32> {
        if self.frames.load(Ordering::Relaxed) < 2 {
            return None;
        }
        let last = self.last_frame_start.load(Ordering::Relaxed);
        let prev = self.prev_frame_start.load(Ordering::Relaxed);
        Some(last.wrapping_sub(prev))
    }
}

// Each counter has exactly one writer, its own ISR, so relaxed ordering is enough.

/// Frame-start handler: count the frame and capture its start time
pub fn count_frame_start(counters: &InterruptCounters, timestamp: u32) {
    let prev = counters.last_frame_start.swap(timestamp, Ordering::Relaxed);
    counters.prev_frame_start.store(prev, Ordering::Relaxed);
    counters.frames.fetch_add(1, Ordering::Relaxed);
}

/// Chirp-start handler
pub fn count_chirp_start(counters: &InterruptCounters, _timestamp: u32) {
    counters.chirps.fetch_add(1, Ordering::Relaxed);
}

/// Chirp-available handler
pub fn count_chirp_available(counters: &InterruptCounters, _timestamp: u32) {
    counters.chirps_available.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handlers_touch_only_their_counter() {
        let counters = InterruptCounters::new();
        count_chirp_start(&counters, 10);
        count_chirp_start(&counters, 20);
        count_chirp_available(&counters, 30);

        let snap = counters.snapshot();
        assert_eq!(snap.frames, 0);
        assert_eq!(snap.chirps, 2);
        assert_eq!(snap.chirps_available, 1);
        assert_eq!(snap.last_frame_start, 0);
    }

    #[test]
    fn test_frame_period() {
        let counters = InterruptCounters::new();
        count_frame_start(&counters, 1_000);
        assert_eq!(counters.frame_period_ticks(), None);

        count_frame_start(&counters, 4_000);
        assert_eq!(counters.frame_period_ticks(), Some(3_000));
        assert_eq!(counters.snapshot().frames, 2);
    }

    #[test]
    fn test_frame_period_across_timer_wrap() {
        let counters = InterruptCounters::new();
        count_frame_start(&counters, u32::MAX - 99);
        count_frame_start(&counters, 100);
        assert_eq!(counters.frame_period_ticks(), Some(200));
    }
}
