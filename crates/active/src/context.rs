//! The handle state handlers use to reach the framework.

use rtk_core::{Event, Priority, Signal};
use rtk_mem::EventRef;
use rtk_trace::{emit, records};

use crate::defer::DeferQueue;
use crate::error::PostError;
use crate::framework::Framework;
use crate::port::SchedStatus;
use crate::time::TimeEventId;

/// Passed to every state handler of an [`ActiveObject`](crate::ActiveObject)
/// as its context argument.
///
/// Knows the priority of the object it belongs to, so "self" operations
/// (subscriptions, own time events, recall) need no extra arguments.
pub struct ActiveContext {
    prio: Priority,
    framework: Framework,
}

impl ActiveContext {
    pub(crate) fn new(prio: Priority, framework: Framework) -> Self {
        Self { prio, framework }
    }

    pub fn prio(&self) -> Priority {
        self.prio
    }

    pub fn framework(&self) -> &Framework {
        &self.framework
    }

    pub fn post(&self, prio: Priority, event: EventRef) {
        self.framework.post(prio, event);
    }

    pub fn post_self(&self, event: EventRef) {
        self.framework.post(self.prio, event);
    }

    pub fn post_lifo(&self, prio: Priority, event: EventRef) {
        self.framework.post_lifo(prio, event);
    }

    pub fn try_post(&self, prio: Priority, event: EventRef, margin: u16) -> Result<(), PostError> {
        self.framework.try_post(prio, event, margin)
    }

    pub fn publish(&self, event: EventRef) {
        self.framework.publish(event);
    }

    pub fn new_event(&self, signal: Signal, payload: &[u8]) -> EventRef {
        self.framework.new_event(signal, payload)
    }

    pub fn try_new_event(&self, signal: Signal, payload: &[u8], margin: u16) -> Option<EventRef> {
        self.framework.try_new_event(signal, payload, margin)
    }

    /// New counted reference to the event being dispatched, for forwarding it.
    pub fn retain(&self, event: &Event<'_>) -> EventRef {
        self.framework.pools().retain_event(event)
    }

    pub fn release(&self, event: EventRef) {
        self.framework.release(event);
    }

    /// Sets the current event aside in `queue`. Returns `false`, holding on to
    /// nothing, when the queue is full.
    pub fn defer<const N: usize>(&self, queue: &mut DeferQueue<N>, event: &Event<'_>) -> bool {
        let held = self.retain(event);
        let signal = held.signal();
        match queue.push(held) {
            Ok(()) => {
                self.trace(records::qf::ACTIVE_DEFER, signal, queue.len());
                true
            }
            Err(held) => {
                log::warn!("defer queue full, {signal} dropped");
                self.framework.release(held);
                false
            }
        }
    }

    /// Moves the oldest deferred event to the front of this object's queue.
    /// Returns `false` when nothing was deferred.
    pub fn recall<const N: usize>(&self, queue: &mut DeferQueue<N>) -> bool {
        match queue.pop() {
            Some(event) => {
                let signal = event.signal();
                self.framework.post_lifo(self.prio, event);
                self.trace(records::qf::ACTIVE_RECALL, signal, queue.len());
                true
            }
            None => {
                self.trace(records::qf::ACTIVE_RECALL_ATTEMPT, Signal::EMPTY, 0);
                false
            }
        }
    }

    /// Releases everything still deferred; returns how many events that was.
    pub fn flush_deferred<const N: usize>(&self, queue: &mut DeferQueue<N>) -> usize {
        let mut flushed = 0;
        while let Some(event) = queue.pop() {
            self.framework.release(event);
            flushed += 1;
        }
        flushed
    }

    pub fn subscribe(&self, signal: Signal) {
        self.framework.subscribe(self.prio, signal);
    }

    pub fn unsubscribe(&self, signal: Signal) {
        self.framework.unsubscribe(self.prio, signal);
    }

    pub fn unsubscribe_all(&self) -> usize {
        self.framework.unsubscribe_all(self.prio)
    }

    /// Time event posting `signal` to this object on clock `rate`.
    pub fn new_time_event(&self, signal: Signal, rate: u8) -> TimeEventId {
        self.framework.new_time_event(self.prio, signal, rate)
    }

    pub fn arm(&self, id: TimeEventId, n_ticks: u32, interval: u32) {
        self.framework.arm(id, n_ticks, interval);
    }

    pub fn disarm(&self, id: TimeEventId) -> bool {
        self.framework.disarm(id)
    }

    pub fn rearm(&self, id: TimeEventId, n_ticks: u32) -> bool {
        self.framework.rearm(id, n_ticks)
    }

    pub fn was_disarmed(&self, id: TimeEventId) -> bool {
        self.framework.was_disarmed(id)
    }

    pub fn current_ctr(&self, id: TimeEventId) -> u32 {
        self.framework.current_ctr(id)
    }

    pub fn lock_scheduler(&self, ceiling: Priority) -> SchedStatus {
        self.framework.lock_scheduler(ceiling)
    }

    pub fn unlock_scheduler(&self, status: SchedStatus) {
        self.framework.unlock_scheduler(status);
    }

    /// Takes this object out of the framework: subscriptions and time events
    /// go, pending events are released. The current dispatch still completes.
    pub fn stop(&self) {
        if self.framework.unregister(self.prio).is_none() {
            log::warn!("{} stopped twice", self.prio);
        }
    }

    fn trace(&self, record: u8, signal: Signal, depth: usize) {
        let [lo, hi] = signal.to_le_bytes();
        emit(
            self.framework.trace_hook(),
            record,
            &[self.prio.raw(), lo, hi, u8::try_from(depth).unwrap_or(u8::MAX)],
        );
    }
}
