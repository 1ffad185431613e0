//! A single block-size class.

use alloc::boxed::Box;
use alloc::vec::Vec;

use rtk_core::{fail, require, BlockId, CritCell, Signal};
use spin::{RwLock, RwLockReadGuard};

use crate::PoolStats;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    ref_count: u8,
    generation: u16,
    signal: Signal,
}

struct PoolState {
    free: Vec<u16>,
    slots: Box<[Slot]>,
    stats: PoolStats,
}

pub(crate) struct EventPool {
    id: u8,
    block_size: usize,
    blocks: Box<[RwLock<Vec<u8>>]>,
    state: CritCell<PoolState>,
}

impl EventPool {
    pub(crate) fn new(id: u8, block_size: usize, n_blocks: usize) -> Self {
        let blocks = (0..n_blocks)
            .map(|_| RwLock::new(Vec::with_capacity(block_size)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        // Popped from the back, so block 0 goes out first.
        let free = (0..n_blocks as u16).rev().collect();

        Self {
            id,
            block_size,
            blocks,
            state: CritCell::new(PoolState {
                free,
                slots: alloc::vec![Slot::default(); n_blocks].into_boxed_slice(),
                stats: PoolStats::new(n_blocks),
            }),
        }
    }

    pub(crate) fn id(&self) -> u8 {
        self.id
    }

    pub(crate) fn block_size(&self) -> usize {
        self.block_size
    }

    /// Takes a block off the free list. `margin == None` treats exhaustion as
    /// fatal; otherwise the block is handed out only while more than `margin`
    /// blocks remain free.
    pub(crate) fn take(&self, signal: Signal, margin: Option<u16>) -> Option<BlockId> {
        self.state.with(|state| {
            let available = state.free.len();
            match margin {
                None => require!(available > 0, 110),
                Some(margin) if available <= margin as usize => return None,
                Some(_) => {}
            }

            let index = state.free.pop()?;
            let slot = &mut state.slots[index as usize];
            slot.ref_count = 1;
            slot.generation = slot.generation.wrapping_add(1);
            slot.signal = signal;
            state.stats.on_alloc();
            Some(BlockId::new(self.id, index, slot.generation))
        })
    }

    /// Copies the payload into a block freshly returned by [`take`](Self::take).
    pub(crate) fn fill(&self, block: BlockId, payload: &[u8]) {
        require!(payload.len() <= self.block_size, 120);
        let Some(mut data) = self.blocks[block.index() as usize].try_write() else {
            fail!(130, "freshly allocated block is still being read");
        };
        data.clear();
        data.extend_from_slice(payload);
    }

    /// Adds one reference, returning the new count.
    pub(crate) fn retain(&self, block: BlockId) -> u8 {
        self.state.with(|state| {
            let slot = Self::live_slot(state, block);
            require!(slot.ref_count < u8::MAX, 210);
            slot.ref_count += 1;
            slot.ref_count
        })
    }

    /// Drops one reference, returning the block to the free list when the
    /// count reaches zero. Returns the remaining count.
    pub(crate) fn release(&self, block: BlockId) -> u8 {
        self.state.with(|state| {
            let slot = Self::live_slot(state, block);
            slot.ref_count -= 1;
            let remaining = slot.ref_count;
            if remaining == 0 {
                state.free.push(block.index());
                state.stats.on_free();
            }
            remaining
        })
    }

    pub(crate) fn read(&self, block: BlockId) -> (Signal, RwLockReadGuard<'_, Vec<u8>>) {
        let signal = self.state.with(|state| Self::live_slot(state, block).signal);
        let Some(data) = self.blocks[block.index() as usize].try_read() else {
            fail!(330, "live block is being written");
        };
        (signal, data)
    }

    /// Current count, or `None` if the handle no longer names a live block.
    pub(crate) fn ref_count(&self, block: BlockId) -> Option<u8> {
        self.state.with_ref(|state| {
            let slot = state.slots.get(block.index() as usize)?;
            (slot.generation == block.generation() && slot.ref_count > 0)
                .then_some(slot.ref_count)
        })
    }

    pub(crate) fn stats(&self) -> PoolStats {
        self.state.with_ref(|state| state.stats)
    }

    fn live_slot(state: &mut PoolState, block: BlockId) -> &mut Slot {
        require!((block.index() as usize) < state.slots.len(), 300);
        let slot = &mut state.slots[block.index() as usize];
        require!(slot.generation == block.generation(), 310);
        require!(slot.ref_count > 0, 320);
        slot
    }
}
