//! The pool registry.

use alloc::vec::Vec;

use rtk_core::{fail, require, BlockId, Event, Signal};
use rtk_trace::{emit, records, TraceHook};
use spin::RwLockReadGuard;

use crate::handle::Kind;
use crate::pool::EventPool;
use crate::{EventRef, PoolConfigError, PoolStats, MAX_BLOCKS, MAX_POOLS};

/// Startup-time pool registration.
#[derive(Default)]
pub struct EventPoolsBuilder {
    specs: Vec<(usize, usize)>,
    trace: Option<TraceHook>,
}

impl EventPoolsBuilder {
    /// Adds a pool of `n_blocks` blocks holding payloads up to `block_size`
    /// bytes. Pools must be added in strictly increasing block-size order.
    pub fn pool(mut self, block_size: usize, n_blocks: usize) -> Self {
        self.specs.push((block_size, n_blocks));
        self
    }

    pub fn trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn build(self) -> Result<EventPools, PoolConfigError> {
        if self.specs.len() > MAX_POOLS {
            return Err(PoolConfigError::TooManyPools { max: MAX_POOLS });
        }

        let mut pools = Vec::with_capacity(self.specs.len());
        let mut previous: Option<usize> = None;
        for (index, &(size, blocks)) in self.specs.iter().enumerate() {
            if size == 0 || blocks == 0 {
                return Err(PoolConfigError::Empty { index });
            }
            if blocks > MAX_BLOCKS {
                return Err(PoolConfigError::TooManyBlocks {
                    index,
                    blocks,
                    max: MAX_BLOCKS,
                });
            }
            if let Some(previous) = previous.filter(|&previous| size <= previous) {
                return Err(PoolConfigError::NotAscending {
                    index,
                    size,
                    previous,
                });
            }
            previous = Some(size);

            log::debug!("event pool {} registered: {blocks} x {size} bytes", index + 1);
            pools.push(EventPool::new((index + 1) as u8, size, blocks));
        }

        Ok(EventPools {
            pools,
            trace: self.trace,
        })
    }
}

/// Registry of event pools, configured once and shared thereafter.
pub struct EventPools {
    pools: Vec<EventPool>,
    trace: Option<TraceHook>,
}

impl EventPools {
    pub fn builder() -> EventPoolsBuilder {
        EventPoolsBuilder::default()
    }

    /// A registry without pools; only static events can circulate.
    pub fn empty() -> Self {
        Self {
            pools: Vec::new(),
            trace: None,
        }
    }

    pub fn set_trace_hook(&mut self, hook: Option<TraceHook>) {
        self.trace = hook;
    }

    /// Allocates an event holding `payload`.
    ///
    /// Fatal when no pool can hold the payload or the matching pool is
    /// exhausted.
    pub fn allocate(&self, signal: Signal, payload: &[u8]) -> EventRef {
        match self.allocate_with(signal, payload, None) {
            Some(event) => event,
            None => fail!(400, "asserting allocation returned no block"),
        }
    }

    /// Non-asserting allocation: succeeds only while more than `margin`
    /// blocks stay free in the matching pool.
    pub fn try_allocate(&self, signal: Signal, payload: &[u8], margin: u16) -> Option<EventRef> {
        let event = self.allocate_with(signal, payload, Some(margin));
        if event.is_none() {
            log::warn!(
                "allocation of {} bytes for {signal} refused (margin {margin})",
                payload.len()
            );
            self.trace_signal(records::qf::MPOOL_GET_ATTEMPT, 0, signal);
        }
        event
    }

    fn allocate_with(&self, signal: Signal, payload: &[u8], margin: Option<u16>) -> Option<EventRef> {
        let Some(pool) = self.pools.iter().find(|pool| pool.block_size() >= payload.len()) else {
            fail!(410, "no event pool fits the requested size");
        };

        let block = pool.take(signal, margin)?;
        pool.fill(block, payload);
        self.trace_signal(records::qf::MPOOL_GET, block.pool(), signal);

        log::trace!("new {signal} in {block:?}");
        self.trace_signal(records::qf::NEW, block.pool(), signal);
        Some(EventRef::pooled(block, signal))
    }

    /// Mints another counted reference to the same event.
    pub fn retain(&self, event: &EventRef) -> EventRef {
        match *event.kind() {
            Kind::Static(event) => EventRef::from_static(event),
            Kind::Pooled { block, signal } => self.retain_block(block, signal),
        }
    }

    /// Mints a counted reference from a view handed to a state handler.
    ///
    /// Transient events were never queued and cannot be retained.
    pub fn retain_event(&self, event: &Event<'_>) -> EventRef {
        if let Some(event) = event.to_static() {
            return EventRef::from_static(event);
        }
        match event.origin() {
            Some(block) => self.retain_block(block, event.signal()),
            None => fail!(420, "transient events cannot be retained"),
        }
    }

    fn retain_block(&self, block: BlockId, signal: Signal) -> EventRef {
        let count = self.pool(block.pool()).retain(block);
        log::trace!("retain {block:?} -> {count}");
        self.trace_signal(records::qf::NEW_REF, block.pool(), signal);
        EventRef::pooled(block, signal)
    }

    /// Gives one reference back; the block returns to its free list when the
    /// last reference goes.
    pub fn release(&self, event: EventRef) {
        let Kind::Pooled { block, signal } = *event.kind() else {
            return;
        };

        let remaining = self.pool(block.pool()).release(block);
        if remaining == 0 {
            log::trace!("gc {block:?}");
            self.trace_signal(records::qf::GC, block.pool(), signal);
            self.trace_signal(records::qf::MPOOL_PUT, block.pool(), signal);
        } else {
            self.trace_signal(records::qf::DELETE_REF, block.pool(), signal);
        }
    }

    /// Borrows the event behind a reference.
    pub fn read(&self, event: &EventRef) -> EventGuard<'_> {
        let inner = match *event.kind() {
            Kind::Static(event) => GuardInner::Static(event),
            Kind::Pooled { block, .. } => {
                let (signal, data) = self.pool(block.pool()).read(block);
                GuardInner::Pooled {
                    signal,
                    block,
                    data,
                }
            }
        };
        EventGuard { inner }
    }

    /// Reference count of a pooled event; `None` for static events.
    pub fn ref_count(&self, event: &EventRef) -> Option<u8> {
        let block = event.block()?;
        self.pool(block.pool()).ref_count(block)
    }

    /// Whether the block named by `block` is still allocated to that handle.
    pub fn is_live(&self, block: BlockId) -> bool {
        self.pool(block.pool()).ref_count(block).is_some()
    }

    pub fn stats(&self, pool_id: u8) -> PoolStats {
        self.pool(pool_id).stats()
    }

    /// Lowest number of free blocks a pool has had (low-water mark).
    pub fn pool_min(&self, pool_id: u8) -> usize {
        self.stats(pool_id).min_free_blocks
    }

    pub fn block_size(&self, pool_id: u8) -> usize {
        self.pool(pool_id).block_size()
    }

    /// Largest payload any pool can hold; 0 without pools.
    pub fn max_block_size(&self) -> usize {
        self.pools.last().map_or(0, EventPool::block_size)
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    fn pool(&self, pool_id: u8) -> &EventPool {
        require!(pool_id >= 1 && (pool_id as usize) <= self.pools.len(), 500);
        let pool = &self.pools[pool_id as usize - 1];
        debug_assert_eq!(pool.id(), pool_id);
        pool
    }

    fn trace_signal(&self, record: u8, pool_id: u8, signal: Signal) {
        let [lo, hi] = signal.to_le_bytes();
        emit(self.trace.as_ref(), record, &[pool_id, lo, hi]);
    }
}

/// Read access to an event for the duration of a dispatch.
pub struct EventGuard<'p> {
    inner: GuardInner<'p>,
}

enum GuardInner<'p> {
    Static(Event<'static>),
    Pooled {
        signal: Signal,
        block: BlockId,
        data: RwLockReadGuard<'p, Vec<u8>>,
    },
}

impl EventGuard<'_> {
    pub fn event(&self) -> Event<'_> {
        match &self.inner {
            GuardInner::Static(event) => *event,
            GuardInner::Pooled {
                signal,
                block,
                data,
            } => Event::pooled(*signal, data.as_slice(), *block),
        }
    }

    pub fn signal(&self) -> Signal {
        match &self.inner {
            GuardInner::Static(event) => event.signal(),
            GuardInner::Pooled { signal, .. } => *signal,
        }
    }
}
