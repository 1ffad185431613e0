//! Event views.
//!
//! An [`Event`] is what state handlers see: a signal, an immutable payload and
//! the identity of the pool block backing it (if any). Counted ownership of
//! pooled events lives in `rtk-mem`; a view is only ever handed out while a
//! counted reference keeps the block alive.

use crate::signal::Signal;

/// Identity of a pool block: 1-based pool id, block index and the generation
/// the block had when the reference was minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    pool: u8,
    index: u16,
    generation: u16,
}

impl BlockId {
    pub const fn new(pool: u8, index: u16, generation: u16) -> Self {
        Self {
            pool,
            index,
            generation,
        }
    }

    pub const fn pool(self) -> u8 {
        self.pool
    }

    pub const fn index(self) -> u16 {
        self.index
    }

    pub const fn generation(self) -> u16 {
        self.generation
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BlockId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Block({}:{}#{})", self.pool, self.index, self.generation);
    }
}

/// Immutable event as seen by a state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<'a> {
    signal: Signal,
    body: Body<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body<'a> {
    /// Lives for the whole program; never counted.
    Static(&'static [u8]),
    /// Backed by a pool block kept alive by a counted reference.
    Pooled(&'a [u8], BlockId),
    /// Borrowed from the caller for a single synchronous dispatch.
    Transient(&'a [u8]),
}

impl Event<'static> {
    pub const EMPTY: Event<'static> = Event::new(Signal::EMPTY);
    pub const ENTRY: Event<'static> = Event::new(Signal::ENTRY);
    pub const EXIT: Event<'static> = Event::new(Signal::EXIT);
    pub const INIT: Event<'static> = Event::new(Signal::INIT);

    /// Static event without payload.
    pub const fn new(signal: Signal) -> Self {
        Self::with_static_payload(signal, &[])
    }

    /// Static event carrying constant data.
    pub const fn with_static_payload(signal: Signal, payload: &'static [u8]) -> Self {
        Self {
            signal,
            body: Body::Static(payload),
        }
    }
}

impl<'a> Event<'a> {
    /// Event borrowed for one synchronous dispatch; it cannot be queued or
    /// retained.
    pub const fn transient(signal: Signal, payload: &'a [u8]) -> Self {
        Self {
            signal,
            body: Body::Transient(payload),
        }
    }

    /// View of a pool-backed event.
    pub const fn pooled(signal: Signal, payload: &'a [u8], origin: BlockId) -> Self {
        Self {
            signal,
            body: Body::Pooled(payload, origin),
        }
    }

    pub const fn signal(&self) -> Signal {
        self.signal
    }

    pub const fn payload(&self) -> &'a [u8] {
        match self.body {
            Body::Static(bytes) => bytes,
            Body::Pooled(bytes, _) | Body::Transient(bytes) => bytes,
        }
    }

    pub const fn origin(&self) -> Option<BlockId> {
        match self.body {
            Body::Pooled(_, block) => Some(block),
            _ => None,
        }
    }

    pub const fn is_static(&self) -> bool {
        matches!(self.body, Body::Static(_))
    }

    pub const fn is_transient(&self) -> bool {
        matches!(self.body, Body::Transient(_))
    }

    /// The same event with its full static lifetime, if it is static.
    pub const fn to_static(&self) -> Option<Event<'static>> {
        match self.body {
            Body::Static(bytes) => Some(Event::with_static_payload(self.signal, bytes)),
            _ => None,
        }
    }

    /// Pool id as carried in the event header; 0 for events outside pools.
    pub const fn pool_id(&self) -> u8 {
        match self.body {
            Body::Pooled(_, block) => block.pool,
            _ => 0,
        }
    }
}
