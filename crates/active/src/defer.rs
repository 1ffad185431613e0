//! Deferred-event storage.

use heapless::Deque;
use rtk_mem::EventRef;

/// Holds events an active object set aside to handle later.
///
/// Lives inside the active object's own data and is filled and drained through
/// [`ActiveContext::defer`](crate::ActiveContext::defer) and
/// [`ActiveContext::recall`](crate::ActiveContext::recall), which keep the
/// reference counts straight. Flush it with
/// [`ActiveContext::flush_deferred`](crate::ActiveContext::flush_deferred)
/// before dropping it, or the held blocks leak.
pub struct DeferQueue<const N: usize> {
    ring: Deque<EventRef, N>,
}

impl<const N: usize> DeferQueue<N> {
    pub const fn new() -> Self {
        Self { ring: Deque::new() }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    pub(crate) fn push(&mut self, event: EventRef) -> Result<(), EventRef> {
        self.ring.push_back(event)
    }

    pub(crate) fn pop(&mut self) -> Option<EventRef> {
        self.ring.pop_front()
    }
}

impl<const N: usize> Default for DeferQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
