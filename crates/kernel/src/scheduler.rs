//! Ready set and preemption bookkeeping of the QK kernel.

use rtk_active::{SchedStatus, SchedulerPort};
use rtk_core::{CritCell, Priority, PrioritySet};
use rtk_trace::{emit, records::sched, TraceHook};

#[derive(Default)]
struct State {
    lock_ceiling: Priority,
    active_prio: Priority,
    next_prio: Priority,
    ready: PrioritySet,
}

impl State {
    fn eligible(&self, floor: Priority) -> Option<Priority> {
        self.ready
            .highest()
            .filter(|&prio| prio > floor && prio > self.lock_ceiling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDecision {
    pub next_prio: Priority,
    pub previous_prio: Priority,
}

/// Which priority runs next, given what is ready, what is running and the
/// scheduler lock.
///
/// All state sits in one critical-section cell, so readiness reports from
/// interrupt context and the kernel's own decisions never interleave.
pub struct QkScheduler {
    state: CritCell<State>,
    trace: Option<TraceHook>,
}

impl QkScheduler {
    pub fn new(trace: Option<TraceHook>) -> Self {
        Self {
            state: CritCell::new(State::default()),
            trace,
        }
    }

    /// Raises the lock ceiling; priorities at or below it stop preempting.
    pub fn lock(&self, ceiling: Priority) -> SchedStatus {
        let previous = self.state.with(|state| {
            (ceiling > state.lock_ceiling)
                .then(|| core::mem::replace(&mut state.lock_ceiling, ceiling))
        });
        match previous {
            Some(previous) => {
                self.emit_record(sched::LOCK, &[previous.raw(), ceiling.raw()]);
                SchedStatus::Locked(previous)
            }
            None => SchedStatus::Unlocked,
        }
    }

    pub fn unlock(&self, status: SchedStatus) {
        let SchedStatus::Locked(previous) = status else {
            return;
        };
        let current = self.state.with(|state| {
            (state.lock_ceiling > previous)
                .then(|| core::mem::replace(&mut state.lock_ceiling, previous))
        });
        if let Some(current) = current {
            self.emit_record(sched::UNLOCK, &[current.raw(), previous.raw()]);
        }
    }

    pub fn mark_ready(&self, prio: Priority) {
        self.state.with(|state| state.ready.insert(prio));
    }

    pub fn mark_not_ready(&self, prio: Priority) {
        self.state.with(|state| state.ready.remove(prio));
    }

    pub fn is_ready(&self, prio: Priority) -> bool {
        self.state.with_ref(|state| state.ready.contains(prio))
    }

    pub fn ready(&self) -> PrioritySet {
        self.state.with_ref(|state| state.ready)
    }

    pub fn reset_ready(&self) {
        self.state.with(|state| state.ready.clear());
    }

    /// Highest ready priority allowed to preempt the running one, if any.
    pub fn plan_activation(&self) -> Option<ScheduleDecision> {
        self.state.with(|state| {
            let candidate = state.eligible(state.active_prio);
            state.next_prio = candidate.unwrap_or(Priority::IDLE);
            candidate.map(|next_prio| ScheduleDecision {
                next_prio,
                previous_prio: state.active_prio,
            })
        })
    }

    pub fn has_ready_to_run(&self) -> bool {
        self.state
            .with_ref(|state| state.eligible(state.active_prio).is_some())
    }

    /// Next priority to run once the current dispatch finished, considering
    /// only priorities above `floor` (the level that was preempted).
    pub fn next_after_dispatch(&self, floor: Priority) -> Option<ScheduleDecision> {
        self.state.with(|state| {
            let candidate = state.eligible(floor);
            state.next_prio = candidate.unwrap_or(Priority::IDLE);
            candidate.map(|next_prio| ScheduleDecision {
                next_prio,
                previous_prio: state.active_prio,
            })
        })
    }

    pub fn commit_activation(&self, decision: &ScheduleDecision) {
        let previous = self.state.with(|state| {
            debug_assert_eq!(state.next_prio, decision.next_prio);
            state.next_prio = Priority::IDLE;
            core::mem::replace(&mut state.active_prio, decision.next_prio)
        });

        if decision.next_prio != previous {
            self.emit_record(sched::NEXT, &[decision.next_prio.raw(), previous.raw()]);
        }
    }

    /// Returns to the level that was running before an activation.
    pub fn restore_active(&self, prio: Priority) {
        let previous = self.state.with(|state| {
            state.next_prio = Priority::IDLE;
            core::mem::replace(&mut state.active_prio, prio)
        });

        if prio.is_idle() {
            if !previous.is_idle() {
                self.emit_record(sched::IDLE, &[previous.raw()]);
            }
        } else if prio != previous {
            self.emit_record(sched::RESUME, &[prio.raw(), previous.raw()]);
        }
    }

    pub fn next_priority(&self) -> Priority {
        self.state.with_ref(|state| state.next_prio)
    }

    pub fn current_priority(&self) -> Priority {
        self.state.with_ref(|state| state.active_prio)
    }

    pub fn lock_ceiling(&self) -> Priority {
        self.state.with_ref(|state| state.lock_ceiling)
    }

    fn emit_record(&self, record: u8, payload: &[u8]) {
        emit(self.trace.as_ref(), record, payload);
    }
}

impl SchedulerPort for QkScheduler {
    fn on_ready(&self, prio: Priority) {
        self.mark_ready(prio);
    }

    fn on_empty(&self, prio: Priority) {
        self.mark_not_ready(prio);
    }

    fn lock(&self, ceiling: Priority) -> SchedStatus {
        QkScheduler::lock(self, ceiling)
    }

    fn unlock(&self, status: SchedStatus) {
        QkScheduler::unlock(self, status);
    }
}
