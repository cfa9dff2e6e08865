#![deny(unsafe_code)]
//! Bump-allocator memory pools
//!
//! Each RAM region the pipeline uses is managed by exactly one
//! [`MemoryPool`]: a cursor that only moves forward, plus a high-water mark
//! for usage diagnostics. There is no per-allocation free. The whole pool is
//! reset at the start of a configuration epoch and the same allocations are
//! re-derived in the same order, so they land at the same addresses.
//!
//! The pool only does address bookkeeping. [`Arena`] binds a pool to a real
//! byte region and hands out non-overlapping `&mut [u8]` blocks at the
//! addresses the pool chose.
//!
//! # Memory regions (board defaults)
//!
//! ```text
//! Large pool  (main SRAM, DMA-capable)  ─ radar cube
//! Local pool  (CCM RAM, CPU only)        ─ window coefficients
//! ```

use crate::error::PoolError;

/// Round `addr` up to the next multiple of `align`
///
/// `align` must be a power of two; 0 and 1 leave the address unchanged.
/// Returns `None` on overflow.
pub const fn align_up(addr: usize, align: usize) -> Option<usize> {
    if align <= 1 {
        return Some(addr);
    }
    let mask = align - 1;
    match addr.checked_add(mask) {
        Some(sum) => Some(sum & !mask),
        None => None,
    }
}

/// Region handed to a pool; immutable once set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryPoolConfig {
    /// First address of the region
    pub base_address: usize,
    /// Region size in bytes
    pub size_bytes: usize,
}

impl MemoryPoolConfig {
    /// One past the last usable address
    pub const fn end_address(&self) -> usize {
        self.base_address.saturating_add(self.size_bytes)
    }
}

/// Bump allocator over a fixed region
///
/// Invariant: `base <= current <= high_water`, and every address returned by
/// [`alloc`](Self::alloc) lies in `[base, base + size)`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryPool {
    config: MemoryPoolConfig,
    current_address: usize,
    high_water_address: usize,
}

impl MemoryPool {
    /// Create a pool with the cursor at the region base
    pub const fn new(config: MemoryPoolConfig) -> Self {
        Self {
            config,
            current_address: config.base_address,
            high_water_address: config.base_address,
        }
    }

    /// Wind cursor and high-water mark back to the region base
    pub fn reset(&mut self) {
        self.current_address = self.config.base_address;
        self.high_water_address = self.config.base_address;
    }

    /// Reserve `size` bytes aligned to `align`
    ///
    /// Returns the aligned start address, or `None` if the block does not fit.
    /// A failed allocation leaves the pool untouched.
    pub fn alloc(&mut self, size: usize, align: usize) -> Option<usize> {
        if align > 1 && !align.is_power_of_two() {
            return None;
        }
        let aligned = align_up(self.current_address, align)?;
        let end = aligned.checked_add(size)?;
        if end > self.config.end_address() {
            return None;
        }
        self.current_address = end;
        self.high_water_address = self.high_water_address.max(end);
        Some(aligned)
    }

    /// Move the cursor to `address`
    ///
    /// Used to reuse part of a region across configuration epochs without a
    /// full reset. The address is clamped to the region.
    pub fn set(&mut self, address: usize) {
        let address = address.clamp(self.config.base_address, self.config.end_address());
        self.current_address = address;
        self.high_water_address = self.high_water_address.max(address);
    }

    /// Peak number of bytes ever in use since the last reset
    pub fn max_usage(&self) -> usize {
        self.high_water_address - self.config.base_address
    }

    /// Current cursor
    pub fn current(&self) -> usize {
        self.current_address
    }

    /// High-water address
    pub fn high_water(&self) -> usize {
        self.high_water_address
    }

    /// Bytes between the cursor and the end of the region
    pub fn remaining(&self) -> usize {
        self.config.end_address().saturating_sub(self.current_address)
    }

    pub fn config(&self) -> &MemoryPoolConfig {
        &self.config
    }
}

/// Pool bound to a borrowed byte region
///
/// Creating an arena resets its pool. Blocks are split off the front of the
/// unallocated tail, so they never overlap and live as long as the region.
pub struct Arena<'a> {
    pool: MemoryPool,
    tail: &'a mut [u8],
}

impl<'a> Arena<'a> {
    /// Take over `region` and start a fresh configuration epoch on it
    pub fn new(region: &'a mut [u8]) -> Self {
        let mut pool = MemoryPool::new(MemoryPoolConfig {
            base_address: region.as_ptr() as usize,
            size_bytes: region.len(),
        });
        pool.reset();
        Self { pool, tail: region }
    }

    /// Carve `size` bytes aligned to `align`
    pub fn carve(&mut self, size: usize, align: usize) -> Result<&'a mut [u8], PoolError> {
        let start = self.pool.current();
        let address = self.pool.alloc(size, align).ok_or(PoolError::Exhausted {
            requested: size,
            available: self.pool.remaining(),
        })?;

        // tail always begins at the pool cursor
        let tail = core::mem::take(&mut self.tail);
        let (_padding, rest) = tail.split_at_mut(address - start);
        let (block, rest) = rest.split_at_mut(size);
        self.tail = rest;
        Ok(block)
    }

    /// Peak bytes used in this arena
    pub fn usage(&self) -> usize {
        self.pool.max_usage()
    }

    pub fn pool(&self) -> &MemoryPool {
        &self.pool
    }
}
