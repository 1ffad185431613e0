//! Shared fixtures: a scheduler port that only records readiness, and an
//! active object that logs every user event it receives.

#![allow(dead_code)]

use std::sync::Arc;

use rtk_active::{ActiveContext, ActiveObject, Framework, SchedStatus, SchedulerPort};
use rtk_core::{CritCell, Event, Priority, PrioritySet, Signal};
use rtk_hsm::{Outcome, State};
use rtk_mem::EventPools;

#[derive(Default)]
pub struct RecordingPort {
    ready: CritCell<PrioritySet>,
    ceiling: CritCell<Priority>,
    locks: CritCell<Vec<Priority>>,
}

impl RecordingPort {
    pub fn ready(&self) -> PrioritySet {
        self.ready.get()
    }

    pub fn ceiling(&self) -> Priority {
        self.ceiling.get()
    }

    /// Ceilings requested through `lock`, in order.
    pub fn locks(&self) -> Vec<Priority> {
        self.locks.with_ref(Clone::clone)
    }
}

impl SchedulerPort for RecordingPort {
    fn on_ready(&self, prio: Priority) {
        self.ready.with(|ready| ready.insert(prio));
    }

    fn on_empty(&self, prio: Priority) {
        self.ready.with(|ready| ready.remove(prio));
    }

    fn lock(&self, ceiling: Priority) -> SchedStatus {
        self.locks.with(|locks| locks.push(ceiling));
        self.ceiling.with(|current| {
            if ceiling > *current {
                let previous = core::mem::replace(current, ceiling);
                SchedStatus::Locked(previous)
            } else {
                SchedStatus::Unlocked
            }
        })
    }

    fn unlock(&self, status: SchedStatus) {
        if let SchedStatus::Locked(previous) = status {
            self.ceiling.with(|current| *current = previous);
        }
    }
}

pub fn framework(pools: EventPools) -> (Framework, Arc<RecordingPort>) {
    let port = Arc::new(RecordingPort::default());
    let framework = Framework::builder(port.clone())
        .pools(pools)
        .build()
        .unwrap();
    (framework, port)
}

pub fn small_pools() -> EventPools {
    EventPools::builder().pool(8, 8).pool(32, 4).build().unwrap()
}

/// Dispatches ready objects, highest priority first, until none is ready.
pub fn run_until_idle(framework: &Framework, port: &RecordingPort) -> usize {
    let mut dispatched = 0;
    while let Some(prio) = port.ready().highest() {
        match framework.active(prio) {
            Some(active) => {
                if active.dispatch_one() {
                    dispatched += 1;
                }
            }
            None => port.on_empty(prio),
        }
    }
    dispatched
}

pub type Received = Vec<(Signal, Vec<u8>)>;
pub type Recorder = ActiveObject<Received, 8>;

pub static RECORDER_INITIAL: State<Received, ActiveContext> =
    State::new("initial", |_, _, _| Outcome::Initial(&RECORDING));

pub static RECORDING: State<Received, ActiveContext> =
    State::new("recording", |received, _, e| {
        if e.signal().is_reserved() {
            return Outcome::Super;
        }
        received.push((e.signal(), e.payload().to_vec()));
        Outcome::Handled
    });

pub fn recorder(framework: &Framework, prio: u8) -> Arc<Recorder> {
    let recorder = Recorder::new(Priority::new(prio), "recorder", &RECORDER_INITIAL, Vec::new());
    framework.start_active(recorder.clone(), &Event::EMPTY);
    recorder
}

pub fn signals(recorder: &Recorder) -> Vec<Signal> {
    recorder.with_data(|received| received.iter().map(|(signal, _)| *signal).collect())
}
