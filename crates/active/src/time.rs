//! Time events: per-signal down-counters driven by clock ticks.

use alloc::vec::Vec;

use rtk_core::{require, CritCell, Priority, Signal};

/// Handle to a time event created with
/// [`Framework::new_time_event`](crate::Framework::new_time_event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeEventId(u16);

impl TimeEventId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TimeEvent {
    pub(crate) target: Priority,
    pub(crate) signal: Signal,
    pub(crate) rate: u8,
    /// Ticks left until expiry; 0 means disarmed.
    pub(crate) ctr: u32,
    pub(crate) interval: u32,
    was_disarmed: bool,
}

/// What one tick did to a time event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expiry {
    /// Periodic event fired and reloaded.
    Reloaded { target: Priority, signal: Signal },
    /// One-shot event fired and disarmed itself.
    Disarmed { target: Priority, signal: Signal },
}

pub(crate) struct TimeEvents {
    slots: CritCell<Vec<TimeEvent>>,
}

impl TimeEvents {
    pub(crate) fn new() -> Self {
        Self {
            slots: CritCell::new(Vec::new()),
        }
    }

    pub(crate) fn create(&self, target: Priority, signal: Signal, rate: u8) -> TimeEventId {
        self.slots.with(|slots| {
            require!(slots.len() < u16::MAX as usize, 300);
            slots.push(TimeEvent {
                target,
                signal,
                rate,
                ctr: 0,
                interval: 0,
                was_disarmed: false,
            });
            TimeEventId((slots.len() - 1) as u16)
        })
    }

    pub(crate) fn count(&self) -> usize {
        self.slots.with_ref(Vec::len)
    }

    pub(crate) fn get(&self, id: TimeEventId) -> TimeEvent {
        self.slots.with_ref(|slots| {
            require!(id.index() < slots.len(), 310);
            slots[id.index()]
        })
    }

    pub(crate) fn arm(&self, id: TimeEventId, n_ticks: u32, interval: u32) {
        self.with_slot(id, |slot| {
            require!(n_ticks != 0 && slot.ctr == 0, 400);
            slot.ctr = n_ticks;
            slot.interval = interval;
        });
    }

    /// Returns whether the event was running.
    pub(crate) fn disarm(&self, id: TimeEventId) -> bool {
        self.with_slot(id, |slot| {
            let was_armed = slot.ctr != 0;
            slot.ctr = 0;
            slot.was_disarmed = was_armed;
            was_armed
        })
    }

    /// Reloads the counter, keeping the interval. Returns whether the event
    /// was running.
    pub(crate) fn rearm(&self, id: TimeEventId, n_ticks: u32) -> bool {
        self.with_slot(id, |slot| {
            require!(n_ticks != 0, 600);
            let was_armed = slot.ctr != 0;
            slot.ctr = n_ticks;
            was_armed
        })
    }

    /// Reports whether the last disarm stopped a running event, then sets the
    /// flag so later calls report `true`.
    pub(crate) fn was_disarmed(&self, id: TimeEventId) -> bool {
        self.with_slot(id, |slot| core::mem::replace(&mut slot.was_disarmed, true))
    }

    pub(crate) fn disarm_all_for(&self, target: Priority) -> usize {
        self.slots.with(|slots| {
            let mut disarmed = 0;
            for slot in slots.iter_mut().filter(|slot| slot.target == target && slot.ctr != 0) {
                slot.ctr = 0;
                disarmed += 1;
            }
            disarmed
        })
    }

    pub(crate) fn none_active(&self, rate: u8) -> bool {
        self.slots
            .with_ref(|slots| slots.iter().all(|slot| slot.rate != rate || slot.ctr == 0))
    }

    /// Advances one time event by one tick of `rate`.
    pub(crate) fn advance(&self, index: usize, rate: u8) -> Option<Expiry> {
        self.slots.with(|slots| {
            let slot = slots.get_mut(index)?;
            if slot.rate != rate || slot.ctr == 0 {
                return None;
            }
            slot.ctr -= 1;
            if slot.ctr != 0 {
                return None;
            }

            let (target, signal) = (slot.target, slot.signal);
            if slot.interval != 0 {
                slot.ctr = slot.interval;
                Some(Expiry::Reloaded { target, signal })
            } else {
                Some(Expiry::Disarmed { target, signal })
            }
        })
    }

    fn with_slot<R>(&self, id: TimeEventId, f: impl FnOnce(&mut TimeEvent) -> R) -> R {
        self.slots.with(|slots| {
            require!(id.index() < slots.len(), 310);
            f(&mut slots[id.index()])
        })
    }
}
