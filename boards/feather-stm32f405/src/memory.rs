//! Pool regions
//!
//! This module is the **ONLY** place in the board crate that places data in
//! a linker section. The large pool sits in main SRAM so the SPI DMA can read
//! the radar cube from it; the local pool sits in CCM RAM, which is faster
//! for the CPU but invisible to DMA.
//!
//! ```text
//! SRAM   (128 KB, DMA-capable):  large pool   96 KB  ─ radar cube
//! CCMRAM ( 64 KB, CPU only):     local pool   16 KB  ─ window coefficients
//! ```
//!
//! Each region is handed out once, as a `&'static mut [u8]`, to the
//! processing task, which owns the pools from then on.

// #[link_section] and the static mut below are the reason this module is
// not under #![deny(unsafe_code)].
#![allow(unsafe_code)]

use core::sync::atomic::{AtomicBool, Ordering};

use static_cell::ConstStaticCell;

pub const LARGE_POOL_BYTES: usize = 96 * 1024;
pub const LOCAL_POOL_BYTES: usize = 16 * 1024;

static LARGE_POOL: ConstStaticCell<[u8; LARGE_POOL_BYTES]> =
    ConstStaticCell::new([0; LARGE_POOL_BYTES]);

/// Local pool storage in CCM RAM
///
/// `.ccmram` is NOLOAD: the contents are whatever the RAM held at reset
/// until the engine writes the window coefficients.
#[link_section = ".ccmram"]
static mut LOCAL_POOL: [u8; LOCAL_POOL_BYTES] = [0; LOCAL_POOL_BYTES];

/// Lives in .bss so it really starts out false
static LOCAL_POOL_TAKEN: AtomicBool = AtomicBool::new(false);

/// Take the large pool region; `None` after the first call
pub fn take_large_pool() -> Option<&'static mut [u8]> {
    LARGE_POOL
        .try_take()
        .map(|region| region.as_mut_slice())
}

/// Take the local pool region; `None` after the first call
pub fn take_local_pool() -> Option<&'static mut [u8]> {
    if LOCAL_POOL_TAKEN.swap(true, Ordering::AcqRel) {
        return None;
    }
    // SAFETY: the flag above lets exactly one caller through, so this is
    // the only reference ever created to LOCAL_POOL. The region is never
    // used for DMA.
    Some(unsafe { &mut *core::ptr::addr_of_mut!(LOCAL_POOL) })
}
