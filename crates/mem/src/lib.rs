#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # rtk event pools
//!
//! Fixed-size block pools handing out reference-counted event buffers. Pools
//! are registered once at startup in increasing block-size order; allocation
//! picks the smallest pool whose blocks fit the payload.
//!
//! Pooled events are only reachable through [`EventRef`], an owning handle
//! that carries the block's generation. Counts change exclusively through
//! [`EventPools::retain`] and [`EventPools::release`], both of which run
//! inside a critical section since releases may come from interrupt context.

extern crate alloc;

mod error;
mod handle;
mod pool;
mod pools;

pub use error::PoolConfigError;
pub use handle::EventRef;
pub use pools::{EventGuard, EventPools, EventPoolsBuilder};

/// Maximum number of pools one registry may hold.
pub const MAX_POOLS: usize = 15;

/// Maximum number of blocks per pool.
pub const MAX_BLOCKS: usize = u16::MAX as usize;

/// Block usage statistics of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of blocks in the pool
    pub total_blocks: usize,
    /// Number of free blocks currently available
    pub free_blocks: usize,
    /// Number of blocks currently in use
    pub used_blocks: usize,
    /// Minimum number of free blocks ever reached
    pub min_free_blocks: usize,
}

impl PoolStats {
    pub const fn new(total_blocks: usize) -> Self {
        Self {
            total_blocks,
            free_blocks: total_blocks,
            used_blocks: 0,
            min_free_blocks: total_blocks,
        }
    }

    pub(crate) fn on_alloc(&mut self) {
        self.used_blocks += 1;
        self.free_blocks -= 1;
        if self.free_blocks < self.min_free_blocks {
            self.min_free_blocks = self.free_blocks;
        }
    }

    pub(crate) fn on_free(&mut self) {
        self.used_blocks -= 1;
        self.free_blocks += 1;
    }

    /// No block left.
    pub const fn is_exhausted(&self) -> bool {
        self.free_blocks == 0
    }

    /// Every block is free.
    pub const fn is_idle(&self) -> bool {
        self.used_blocks == 0
    }

    /// Utilization as a percentage (0-100).
    pub fn utilization(&self) -> u8 {
        if self.total_blocks == 0 {
            0
        } else {
            ((self.used_blocks * 100) / self.total_blocks) as u8
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PoolStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "PoolStats{{ total: {}, free: {}, used: {}, min_free: {} }}",
            self.total_blocks,
            self.free_blocks,
            self.used_blocks,
            self.min_free_blocks
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_low_water_mark() {
        let mut stats = PoolStats::new(4);
        assert!(stats.is_idle());

        stats.on_alloc();
        stats.on_alloc();
        stats.on_free();

        assert_eq!(stats.free_blocks, 3);
        assert_eq!(stats.used_blocks, 1);
        assert_eq!(stats.min_free_blocks, 2);
        assert_eq!(stats.utilization(), 25);
        assert!(!stats.is_exhausted());
    }
}
