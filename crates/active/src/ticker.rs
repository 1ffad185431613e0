//! Moves clock-tick processing from interrupt context to task level.

use alloc::sync::Arc;

use rtk_core::{require, CritCell, Event, Priority};
use rtk_mem::{EventPools, EventRef};
use spin::Once;

use crate::active::Active;
use crate::framework::Framework;

/// An active object without a state machine: every event posted to it counts
/// one pending tick, and its dispatch runs [`Framework::tick`] once per
/// pending tick.
///
/// The tick interrupt then only posts a static event, and the time-event
/// scan runs at the ticker's priority.
pub struct Ticker {
    prio: Priority,
    rate: u8,
    pending: CritCell<u32>,
    peak: CritCell<u32>,
    framework: Once<Framework>,
}

impl Ticker {
    pub fn new(prio: Priority, rate: u8) -> Arc<Self> {
        Arc::new(Self {
            prio,
            rate,
            pending: CritCell::new(0),
            peak: CritCell::new(0),
            framework: Once::new(),
        })
    }

    pub fn rate(&self) -> u8 {
        self.rate
    }

    pub fn pending(&self) -> u32 {
        self.pending.get()
    }

    fn count(&self, event: EventRef) {
        self.pending.with(|pending| {
            *pending = pending.saturating_add(1);
            self.peak.with(|peak| *peak = (*peak).max(*pending));
        });
        match self.framework.get() {
            Some(framework) => framework.release(event),
            None => require!(event.is_static(), 100),
        }
    }
}

impl Active for Ticker {
    fn priority(&self) -> Priority {
        self.prio
    }

    fn name(&self) -> &'static str {
        "ticker"
    }

    fn start(&self, framework: &Framework, _init: &Event<'_>) {
        require!(self.rate < framework.config().max_tick_rate, 110);
        self.framework.call_once(|| framework.clone());
        log::debug!("ticker for rate {} started at {}", self.rate, self.prio);
    }

    fn enqueue(&self, event: EventRef) {
        self.count(event);
    }

    fn enqueue_lifo(&self, event: EventRef) {
        self.count(event);
    }

    fn try_enqueue(&self, event: EventRef, _margin: u16) -> Result<(), EventRef> {
        self.count(event);
        Ok(())
    }

    fn dispatch_one(&self) -> bool {
        let Some(framework) = self.framework.get() else {
            return false;
        };

        let ticks = critical_section::with(|_| {
            let ticks = self.pending.with(core::mem::take);
            framework.port().on_empty(self.prio);
            ticks
        });
        for _ in 0..ticks {
            framework.tick(self.rate);
        }
        ticks != 0
    }

    fn has_events(&self) -> bool {
        self.pending.get() != 0
    }

    /// The ticker has no queue; reports the most ticks that were ever pending
    /// at once.
    fn queue_min(&self) -> usize {
        self.peak.get() as usize
    }

    fn clear(&self, _pools: &EventPools) -> usize {
        self.pending.with(core::mem::take) as usize
    }
}
