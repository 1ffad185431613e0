//! The shared framework handle: registry, posting, publish-subscribe and time
//! events.

use alloc::sync::Arc;
use alloc::vec::Vec;

use rtk_core::{fail, require, CritCell, Event, Priority, Signal};
use rtk_mem::{EventPools, EventRef};
use rtk_trace::{emit, records, TraceHook};

use crate::active::Active;
use crate::config::FrameworkConfig;
use crate::error::{ConfigError, PostError};
use crate::port::{SchedStatus, SchedulerPort};
use crate::pubsub::Subscribers;
use crate::time::{Expiry, TimeEventId, TimeEvents};

struct Shared {
    config: FrameworkConfig,
    pools: EventPools,
    registry: CritCell<Vec<Option<Arc<dyn Active>>>>,
    subscribers: Subscribers,
    timers: TimeEvents,
    port: Arc<dyn SchedulerPort>,
    trace: Option<TraceHook>,
}

/// Cheaply clonable handle to one framework instance.
///
/// Every queue change goes together with the matching readiness report to
/// the [`SchedulerPort`] inside one critical section, so a scheduler never
/// sees a non-empty queue it was not told about.
///
/// Started active objects hold a clone through their [`ActiveContext`], so
/// the instance lives until they are unregistered.
///
/// [`ActiveContext`]: crate::ActiveContext
#[derive(Clone)]
pub struct Framework {
    inner: Arc<Shared>,
}

pub struct FrameworkBuilder {
    config: FrameworkConfig,
    pools: Option<EventPools>,
    trace: Option<TraceHook>,
    port: Arc<dyn SchedulerPort>,
}

impl FrameworkBuilder {
    pub fn config(mut self, config: FrameworkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn pools(mut self, pools: EventPools) -> Self {
        self.pools = Some(pools);
        self
    }

    /// Hook shared by the framework, its pools and every state machine
    /// started on it.
    pub fn trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn build(self) -> Result<Framework, ConfigError> {
        self.config.validate()?;

        let mut pools = self.pools.unwrap_or_else(EventPools::empty);
        if pools.pool_count() > self.config.max_event_pools as usize {
            return Err(ConfigError::EventPools {
                configured: pools.pool_count(),
                max: self.config.max_event_pools as usize,
            });
        }
        if self.trace.is_some() {
            pools.set_trace_hook(self.trace.clone());
        }

        log::debug!(
            "framework '{}' built: {} priorities, {} signals, {} pools",
            self.config.name,
            self.config.max_active,
            self.config.max_signal,
            pools.pool_count()
        );

        let slots = self.config.max_active as usize + 1;
        Ok(Framework {
            inner: Arc::new(Shared {
                subscribers: Subscribers::new(self.config.max_signal),
                registry: CritCell::new((0..slots).map(|_| None).collect()),
                timers: TimeEvents::new(),
                config: self.config,
                pools,
                port: self.port,
                trace: self.trace,
            }),
        })
    }
}

impl Framework {
    pub fn builder(port: Arc<dyn SchedulerPort>) -> FrameworkBuilder {
        FrameworkBuilder {
            config: FrameworkConfig::default(),
            pools: None,
            trace: None,
            port,
        }
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.inner.config
    }

    pub fn pools(&self) -> &EventPools {
        &self.inner.pools
    }

    pub fn trace_hook(&self) -> Option<&TraceHook> {
        self.inner.trace.as_ref()
    }

    pub fn port(&self) -> &Arc<dyn SchedulerPort> {
        &self.inner.port
    }

    /// Adds an active object at its priority. Occupied or out-of-range
    /// priorities are fatal.
    pub fn register(&self, active: Arc<dyn Active>) {
        let prio = active.priority();
        require!(
            prio.is_valid() && prio.raw() <= self.inner.config.max_active,
            100
        );

        let name = active.name();
        self.inner.registry.with(|registry| {
            let slot = &mut registry[prio.index()];
            if slot.is_some() {
                fail!(110, "priority already taken by another active object");
            }
            *slot = Some(active);
        });
        log::debug!("{name} registered at {prio}");
    }

    /// Registers `active` and runs its initial transition.
    pub fn start_active(&self, active: Arc<dyn Active>, init: &Event<'_>) {
        self.register(Arc::clone(&active));
        active.start(self, init);
    }

    /// Removes the active object at `prio`: its subscriptions go, its time
    /// events are disarmed and its pending events are released.
    pub fn unregister(&self, prio: Priority) -> Option<Arc<dyn Active>> {
        let active = self.inner.registry.with(|registry| {
            registry.get_mut(prio.index()).and_then(Option::take)
        })?;

        let subscriptions = self.inner.subscribers.unsubscribe_all(prio);
        let timers = self.inner.timers.disarm_all_for(prio);
        let pending = critical_section::with(|_| {
            let pending = active.clear(&self.inner.pools);
            self.inner.port.on_empty(prio);
            pending
        });

        log::debug!(
            "{} at {prio} unregistered ({subscriptions} subscriptions, {timers} timers, {pending} pending events dropped)",
            active.name()
        );
        Some(active)
    }

    pub fn active(&self, prio: Priority) -> Option<Arc<dyn Active>> {
        self.inner
            .registry
            .with_ref(|registry| registry.get(prio.index()).cloned().flatten())
    }

    /// Priorities of every registered active object, highest first.
    pub fn priorities(&self) -> Vec<Priority> {
        self.inner.registry.with_ref(|registry| {
            registry
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, slot)| slot.is_some())
                .map(|(index, _)| Priority::new(index as u8))
                .collect()
        })
    }

    /// Allocates a pooled event; fatal when no pool can serve it.
    pub fn new_event(&self, signal: Signal, payload: &[u8]) -> EventRef {
        self.inner.pools.allocate(signal, payload)
    }

    pub fn try_new_event(&self, signal: Signal, payload: &[u8], margin: u16) -> Option<EventRef> {
        self.inner.pools.try_allocate(signal, payload, margin)
    }

    pub fn release(&self, event: EventRef) {
        self.inner.pools.release(event);
    }

    /// FIFO post. The queue takes over the reference; overflow is fatal.
    pub fn post(&self, prio: Priority, event: EventRef) {
        let active = self.registered(prio);
        let signal = event.signal();
        critical_section::with(|_| {
            active.enqueue(event);
            self.inner.port.on_ready(prio);
        });
        self.trace_signal(records::qf::ACTIVE_POST_FIFO, prio, signal);
    }

    /// LIFO post: the event is taken before anything already queued.
    pub fn post_lifo(&self, prio: Priority, event: EventRef) {
        let active = self.registered(prio);
        let signal = event.signal();
        critical_section::with(|_| {
            active.enqueue_lifo(event);
            self.inner.port.on_ready(prio);
        });
        self.trace_signal(records::qf::ACTIVE_POST_LIFO, prio, signal);
    }

    /// Non-asserting post for contexts that cannot afford a fatal overflow.
    ///
    /// Succeeds only while more than `margin` queue entries stay free. On
    /// refusal the event is released and the reason reported.
    pub fn try_post(&self, prio: Priority, event: EventRef, margin: u16) -> Result<(), PostError> {
        let signal = event.signal();
        let Some(active) = self.active(prio) else {
            log::warn!("post of {signal} to unregistered {prio} dropped");
            self.inner.pools.release(event);
            return Err(PostError::NotRegistered(prio));
        };

        let refused = critical_section::with(|_| match active.try_enqueue(event, margin) {
            Ok(()) => {
                self.inner.port.on_ready(prio);
                None
            }
            Err(event) => Some(event),
        });

        match refused {
            None => {
                self.trace_signal(records::qf::ACTIVE_POST_FIFO, prio, signal);
                Ok(())
            }
            Some(event) => {
                log::warn!("{} refused {signal} (margin {margin})", active.name());
                self.trace_signal(records::qf::ACTIVE_POST_ATTEMPT, prio, signal);
                self.inner.pools.release(event);
                Err(PostError::QueueFull { prio, signal })
            }
        }
    }

    /// Fewest free entries the queue at `prio` ever had.
    pub fn queue_min(&self, prio: Priority) -> usize {
        self.registered(prio).queue_min()
    }

    /// Delivers `event` to every subscriber of its signal, highest priority
    /// first, then drops the publisher's reference.
    ///
    /// The scheduler is locked at the highest subscriber's priority for the
    /// duration of the fan-out so no recipient runs before all have the
    /// event.
    pub fn publish(&self, event: EventRef) {
        let signal = event.signal();
        require!(signal.raw() < self.inner.config.max_signal, 300);

        let subscribers = self.inner.subscribers.of(signal);
        let [lo, hi] = signal.to_le_bytes();
        emit(
            self.trace_hook(),
            records::qf::PUBLISH,
            &[lo, hi, u8::try_from(subscribers.len()).unwrap_or(u8::MAX)],
        );

        if let Some(highest) = subscribers.highest() {
            let status = self.inner.port.lock(highest);
            for prio in subscribers.iter() {
                let Some(active) = self.active(prio) else {
                    log::warn!("subscriber {prio} of {signal} is not registered");
                    continue;
                };
                let copy = self.inner.pools.retain(&event);
                critical_section::with(|_| {
                    active.enqueue(copy);
                    self.inner.port.on_ready(prio);
                });
                self.trace_signal(records::qf::ACTIVE_POST_FIFO, prio, signal);
            }
            self.inner.port.unlock(status);
        } else {
            log::trace!("{signal} published without subscribers");
        }

        self.inner.pools.release(event);
    }

    pub fn subscribe(&self, prio: Priority, signal: Signal) {
        self.check_subscriber(prio);
        self.inner.subscribers.subscribe(signal, prio);
        self.trace_signal(records::qf::ACTIVE_SUBSCRIBE, prio, signal);
    }

    pub fn unsubscribe(&self, prio: Priority, signal: Signal) {
        self.check_subscriber(prio);
        self.inner.subscribers.unsubscribe(signal, prio);
        self.trace_signal(records::qf::ACTIVE_UNSUBSCRIBE, prio, signal);
    }

    /// Drops every subscription of `prio`; returns how many there were.
    pub fn unsubscribe_all(&self, prio: Priority) -> usize {
        self.check_subscriber(prio);
        self.inner.subscribers.unsubscribe_all(prio)
    }

    pub fn subscribers(&self, signal: Signal) -> rtk_core::PrioritySet {
        self.inner.subscribers.of(signal)
    }

    /// Creates a disarmed time event posting `signal` to `target` when it
    /// expires on clock `rate`.
    pub fn new_time_event(&self, target: Priority, signal: Signal, rate: u8) -> TimeEventId {
        require!(!signal.is_reserved(), 400);
        require!(rate < self.inner.config.max_tick_rate, 410);
        self.inner.timers.create(target, signal, rate)
    }

    /// Starts a time event: it expires after `n_ticks` ticks, then every
    /// `interval` ticks (never again when `interval` is 0).
    ///
    /// Arming a running time event is fatal; so is `n_ticks == 0`.
    pub fn arm(&self, id: TimeEventId, n_ticks: u32, interval: u32) {
        let timer = self.inner.timers.get(id);
        require!(timer.rate < self.inner.config.max_tick_rate, 420);
        self.inner.timers.arm(id, n_ticks, interval);
        self.trace_timer(records::qf::time_evt::ARM, id);
    }

    /// Stops a time event; returns whether it was running.
    pub fn disarm(&self, id: TimeEventId) -> bool {
        let was_armed = self.inner.timers.disarm(id);
        let record = if was_armed {
            records::qf::time_evt::DISARM
        } else {
            records::qf::time_evt::DISARM_ATTEMPT
        };
        self.trace_timer(record, id);
        was_armed
    }

    /// Restarts the countdown at `n_ticks`, keeping the interval. Returns
    /// whether the time event was running.
    pub fn rearm(&self, id: TimeEventId, n_ticks: u32) -> bool {
        let was_armed = self.inner.timers.rearm(id, n_ticks);
        self.trace_timer(records::qf::time_evt::REARM, id);
        was_armed
    }

    /// Whether the last [`disarm`](Self::disarm) stopped a running time
    /// event. Reading the status sets it, so an event that was never disarmed
    /// reports `true` from the second call on.
    pub fn was_disarmed(&self, id: TimeEventId) -> bool {
        self.inner.timers.was_disarmed(id)
    }

    /// Ticks left until the time event expires; 0 when disarmed.
    pub fn current_ctr(&self, id: TimeEventId) -> u32 {
        self.inner.timers.get(id).ctr
    }

    pub fn no_time_events_active(&self, rate: u8) -> bool {
        require!(rate < self.inner.config.max_tick_rate, 430);
        self.inner.timers.none_active(rate)
    }

    /// Advances every time event of clock `rate` by one tick, posting the
    /// signals of those that expire.
    pub fn tick(&self, rate: u8) {
        require!(rate < self.inner.config.max_tick_rate, 440);
        emit(self.trace_hook(), records::qf::TICK, &[rate]);

        for index in 0..self.inner.timers.count() {
            let (target, signal) = match self.inner.timers.advance(index, rate) {
                None => continue,
                Some(Expiry::Reloaded { target, signal }) => (target, signal),
                Some(Expiry::Disarmed { target, signal }) => {
                    self.trace_signal(records::qf::time_evt::AUTO_DISARM, target, signal);
                    (target, signal)
                }
            };
            self.trace_signal(records::qf::time_evt::POST, target, signal);
            self.post(target, EventRef::signal_only(signal));
        }
    }

    /// Raises the preemption ceiling to `ceiling`.
    pub fn lock_scheduler(&self, ceiling: Priority) -> SchedStatus {
        self.inner.port.lock(ceiling)
    }

    pub fn unlock_scheduler(&self, status: SchedStatus) {
        self.inner.port.unlock(status);
    }

    fn registered(&self, prio: Priority) -> Arc<dyn Active> {
        match self.active(prio) {
            Some(active) => active,
            None => fail!(200, "no active object at this priority"),
        }
    }

    fn check_subscriber(&self, prio: Priority) {
        require!(
            prio.is_valid() && prio.raw() <= self.inner.config.max_active,
            310
        );
    }

    fn trace_signal(&self, record: u8, prio: Priority, signal: Signal) {
        let [lo, hi] = signal.to_le_bytes();
        emit(self.trace_hook(), record, &[prio.raw(), lo, hi]);
    }

    fn trace_timer(&self, record: u8, id: TimeEventId) {
        let timer = self.inner.timers.get(id);
        let [lo, hi] = timer.signal.to_le_bytes();
        let [c0, c1, c2, c3] = timer.ctr.to_le_bytes();
        emit(
            self.trace_hook(),
            record,
            &[timer.target.raw(), lo, hi, timer.rate, c0, c1, c2, c3],
        );
    }
}
