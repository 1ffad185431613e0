//! Per-signal subscriber sets.

use alloc::vec::Vec;

use rtk_core::{require, CritCell, Priority, PrioritySet, Signal};

pub(crate) struct Subscribers {
    table: CritCell<Vec<PrioritySet>>,
}

impl Subscribers {
    pub(crate) fn new(max_signal: u16) -> Self {
        Self {
            table: CritCell::new(alloc::vec![PrioritySet::new(); max_signal as usize]),
        }
    }

    pub(crate) fn subscribe(&self, signal: Signal, prio: Priority) {
        self.table.with(|table| {
            let index = Self::slot(table, signal);
            table[index].insert(prio);
        });
    }

    pub(crate) fn unsubscribe(&self, signal: Signal, prio: Priority) {
        self.table.with(|table| {
            let index = Self::slot(table, signal);
            table[index].remove(prio);
        });
    }

    /// Removes `prio` from every signal; returns how many subscriptions it had.
    pub(crate) fn unsubscribe_all(&self, prio: Priority) -> usize {
        self.table.with(|table| {
            let mut removed = 0;
            for set in table.iter_mut().filter(|set| set.contains(prio)) {
                set.remove(prio);
                removed += 1;
            }
            removed
        })
    }

    /// Snapshot of the subscribers of `signal`.
    pub(crate) fn of(&self, signal: Signal) -> PrioritySet {
        self.table.with_ref(|table| {
            require!(signal.raw() < table.len() as u16, 200);
            table[signal.raw() as usize]
        })
    }

    fn slot(table: &[PrioritySet], signal: Signal) -> usize {
        require!(
            !signal.is_reserved() && (signal.raw() as usize) < table.len(),
            100
        );
        signal.raw() as usize
    }
}
