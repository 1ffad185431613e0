use rtk_core::{BlockId, Event, Signal};

/// One counted reference to an event.
///
/// Static events are freely duplicated by the pools; pooled references can
/// only be minted by [`EventPools`](crate::EventPools), and each value owns
/// exactly one unit of the block's reference count. Hand it back through
/// [`EventPools::release`](crate::EventPools::release) or move it into a
/// queue; dropping it on the floor leaks the block.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an EventRef owns a reference count; release it or post it"]
pub struct EventRef {
    kind: Kind,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Kind {
    Static(Event<'static>),
    Pooled { block: BlockId, signal: Signal },
}

impl EventRef {
    /// Wraps a static event; it is never counted or reclaimed.
    pub fn from_static(event: Event<'static>) -> Self {
        Self {
            kind: Kind::Static(event),
        }
    }

    /// Static event carrying only a signal.
    pub fn signal_only(signal: Signal) -> Self {
        Self::from_static(Event::new(signal))
    }

    pub(crate) fn pooled(block: BlockId, signal: Signal) -> Self {
        Self {
            kind: Kind::Pooled { block, signal },
        }
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn signal(&self) -> Signal {
        match self.kind {
            Kind::Static(event) => event.signal(),
            Kind::Pooled { signal, .. } => signal,
        }
    }

    pub fn block(&self) -> Option<BlockId> {
        match self.kind {
            Kind::Static(_) => None,
            Kind::Pooled { block, .. } => Some(block),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, Kind::Static(_))
    }
}

impl From<Event<'static>> for EventRef {
    fn from(event: Event<'static>) -> Self {
        Self::from_static(event)
    }
}
