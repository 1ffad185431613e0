//! Bounded event queues.

use heapless::Deque;
use rtk_core::require;
use rtk_mem::EventRef;

/// Primary queue of an active object: a fixed ring of `N` event references.
///
/// The queue owns every reference it holds. A refused
/// [`try_post`](Self::try_post) hands the reference back.
pub struct EventQueue<const N: usize> {
    ring: Deque<EventRef, N>,
    min_free: usize,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            ring: Deque::new(),
            min_free: N,
        }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn free(&self) -> usize {
        N - self.ring.len()
    }

    /// Fewest free entries ever observed.
    pub fn min_free(&self) -> usize {
        self.min_free
    }

    /// Appends at the tail; overflow is fatal.
    pub fn post_fifo(&mut self, event: EventRef) {
        require!(!self.ring.is_full(), 100);
        if self.ring.push_back(event).is_ok() {
            self.note_usage();
        }
    }

    /// Inserts at the head so the event is taken next; overflow is fatal.
    pub fn post_lifo(&mut self, event: EventRef) {
        require!(!self.ring.is_full(), 110);
        if self.ring.push_front(event).is_ok() {
            self.note_usage();
        }
    }

    /// Appends only while more than `margin` entries stay free.
    pub fn try_post(&mut self, event: EventRef, margin: u16) -> Result<(), EventRef> {
        if self.free() <= margin as usize {
            return Err(event);
        }
        self.ring.push_back(event)?;
        self.note_usage();
        Ok(())
    }

    pub fn get(&mut self) -> Option<EventRef> {
        self.ring.pop_front()
    }

    fn note_usage(&mut self) {
        self.min_free = self.min_free.min(self.free());
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtk_core::Signal;

    fn ev(raw: u16) -> EventRef {
        EventRef::signal_only(Signal(raw))
    }

    #[test]
    fn fifo_order_and_low_water_mark() {
        let mut queue: EventQueue<4> = EventQueue::new();
        for raw in 10..13 {
            queue.post_fifo(ev(raw));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.min_free(), 1);

        let order: Vec<u16> = core::iter::from_fn(|| queue.get())
            .map(|event| event.signal().raw())
            .collect();
        assert_eq!(order, [10, 11, 12]);
        assert_eq!(queue.min_free(), 1);
    }

    #[test]
    fn lifo_jumps_the_line() {
        let mut queue: EventQueue<3> = EventQueue::new();
        queue.post_fifo(ev(10));
        queue.post_lifo(ev(20));
        assert_eq!(queue.get().map(|event| event.signal()), Some(Signal(20)));
        assert_eq!(queue.get().map(|event| event.signal()), Some(Signal(10)));
        assert!(queue.get().is_none());
    }

    #[test]
    fn margin_refuses_and_returns_the_event() {
        let mut queue: EventQueue<3> = EventQueue::new();
        assert!(queue.try_post(ev(10), 1).is_ok());
        assert!(queue.try_post(ev(11), 1).is_ok());
        let refused = queue.try_post(ev(12), 1).unwrap_err();
        assert_eq!(refused.signal(), Signal(12));
        assert!(queue.try_post(refused, 0).is_ok());
        assert!(queue.try_post(ev(13), 0).is_err());
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn fifo_overflow_is_fatal() {
        let mut queue: EventQueue<1> = EventQueue::new();
        queue.post_fifo(ev(10));
        queue.post_fifo(ev(11));
    }
}
