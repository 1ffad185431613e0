//! Active objects: a state machine, its data and a private event queue.

use alloc::sync::Arc;

use rtk_core::{fail, CritCell, Event, Priority};
use rtk_hsm::{Hsm, State};
use rtk_mem::{EventPools, EventRef};
use rtk_trace::{emit, records};

use crate::context::ActiveContext;
use crate::framework::Framework;
use crate::queue::EventQueue;
use crate::sync::Mutex;

/// What the framework and the kernel need from an active object.
///
/// The `enqueue*` methods are called inside a critical section by
/// [`Framework`], which reports readiness to the scheduler in the same
/// section. Application code posts through the framework, never through
/// these directly.
pub trait Active: Send + Sync {
    fn priority(&self) -> Priority;

    fn name(&self) -> &'static str;

    /// Runs the initial transition. Called once, after registration.
    fn start(&self, framework: &Framework, init: &Event<'_>);

    /// FIFO insertion; overflow is fatal.
    fn enqueue(&self, event: EventRef);

    /// LIFO insertion; overflow is fatal.
    fn enqueue_lifo(&self, event: EventRef);

    /// FIFO insertion while more than `margin` entries stay free.
    fn try_enqueue(&self, event: EventRef, margin: u16) -> Result<(), EventRef>;

    /// Takes one event and runs it to completion. Returns `false` when there
    /// was nothing to do.
    fn dispatch_one(&self) -> bool;

    fn has_events(&self) -> bool;

    /// Fewest free queue entries ever observed.
    fn queue_min(&self) -> usize;

    /// Releases every queued event; returns how many there were.
    fn clear(&self, pools: &EventPools) -> usize;
}

struct Machine<M: 'static> {
    hsm: Hsm<M, ActiveContext>,
    data: M,
    ctx: Option<ActiveContext>,
}

/// State-machine active object with a queue of `N` events.
///
/// ```
/// use std::sync::Arc;
///
/// use rtk_active::{Active, ActiveContext, ActiveObject};
/// use rtk_core::{Priority, Signal};
/// use rtk_hsm::{Outcome, State};
///
/// const PING: Signal = Signal::user(0);
///
/// static INITIAL: State<u32, ActiveContext> =
///     State::new("initial", |_, _, _| Outcome::Initial(&COUNTING));
/// static COUNTING: State<u32, ActiveContext> = State::new("counting", |count, _, e| {
///     match e.signal() {
///         PING => {
///             *count += 1;
///             Outcome::Handled
///         }
///         _ => Outcome::Super,
///     }
/// });
///
/// let counter: Arc<ActiveObject<u32, 4>> =
///     ActiveObject::new(Priority::new(1), "counter", &INITIAL, 0);
/// assert_eq!(counter.priority(), Priority::new(1));
/// ```
pub struct ActiveObject<M: Send + 'static, const N: usize> {
    prio: Priority,
    name: &'static str,
    queue: CritCell<EventQueue<N>>,
    machine: Mutex<Machine<M>>,
}

impl<M: Send + 'static, const N: usize> ActiveObject<M, N> {
    pub fn new(
        prio: Priority,
        name: &'static str,
        initial: &'static State<M, ActiveContext>,
        data: M,
    ) -> Arc<Self> {
        Arc::new(Self {
            prio,
            name,
            queue: CritCell::new(EventQueue::new()),
            machine: Mutex::new(Machine {
                hsm: Hsm::new(initial),
                data,
                ctx: None,
            }),
        })
    }

    /// Inspects the user data between dispatches.
    pub fn with_data<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.machine.lock().data)
    }

    pub fn is_in(&self, state: &'static State<M, ActiveContext>) -> bool {
        self.machine.lock().hsm.is_in(state)
    }

    pub fn state_name(&self) -> &'static str {
        self.machine.lock().hsm.state().name
    }

    pub fn is_started(&self) -> bool {
        self.machine.lock().hsm.is_started()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.with_ref(EventQueue::len)
    }

    fn trace_get(framework: &Framework, prio: Priority, event: &EventRef, remaining: usize) {
        let record = if remaining == 0 {
            records::qf::ACTIVE_GET_LAST
        } else {
            records::qf::ACTIVE_GET
        };
        let [lo, hi] = event.signal().to_le_bytes();
        emit(
            framework.trace_hook(),
            record,
            &[prio.raw(), lo, hi, u8::try_from(remaining).unwrap_or(u8::MAX)],
        );
    }
}

impl<M: Send + 'static, const N: usize> Active for ActiveObject<M, N> {
    fn priority(&self) -> Priority {
        self.prio
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn start(&self, framework: &Framework, init: &Event<'_>) {
        let mut machine = self.machine.lock();
        let Machine { hsm, data, ctx } = &mut *machine;
        if ctx.is_some() {
            fail!(100, "active object started twice");
        }

        hsm.set_trace_hook(framework.trace_hook().cloned());
        let ctx = ctx.insert(ActiveContext::new(self.prio, framework.clone()));
        hsm.init(data, ctx, init);
        log::debug!("{} started at {} in {}", self.name, self.prio, hsm.state().name);
    }

    fn enqueue(&self, event: EventRef) {
        self.queue.with(|queue| queue.post_fifo(event));
    }

    fn enqueue_lifo(&self, event: EventRef) {
        self.queue.with(|queue| queue.post_lifo(event));
    }

    fn try_enqueue(&self, event: EventRef, margin: u16) -> Result<(), EventRef> {
        self.queue.with(|queue| queue.try_post(event, margin))
    }

    fn dispatch_one(&self) -> bool {
        let mut machine = self.machine.lock();
        let Machine { hsm, data, ctx } = &mut *machine;
        let Some(ctx) = ctx.as_mut() else {
            fail!(110, "active object dispatched before start");
        };
        let framework = ctx.framework().clone();

        let taken = critical_section::with(|_| {
            let taken = self.queue.with(|queue| {
                let event = queue.get()?;
                Some((event, queue.len()))
            });
            if matches!(taken, None | Some((_, 0))) {
                framework.port().on_empty(self.prio);
            }
            taken
        });
        let Some((event, remaining)) = taken else {
            return false;
        };
        Self::trace_get(&framework, self.prio, &event, remaining);

        {
            let guard = framework.pools().read(&event);
            hsm.dispatch(data, ctx, &guard.event());
        }
        framework.release(event);
        true
    }

    fn has_events(&self) -> bool {
        self.queue.with_ref(|queue| !queue.is_empty())
    }

    fn queue_min(&self) -> usize {
        self.queue.with_ref(EventQueue::min_free)
    }

    fn clear(&self, pools: &EventPools) -> usize {
        let mut cleared = 0;
        while let Some(event) = self.queue.with(EventQueue::get) {
            pools.release(event);
            cleared += 1;
        }
        cleared
    }
}
