use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use rtk_active::{Active, Framework, FrameworkConfig, SchedStatus};
use rtk_core::{Event, Priority};
use rtk_mem::{EventPools, EventRef};
use rtk_trace::TraceHook;

use crate::error::KernelError;
use crate::hooks::{KernelHooks, NoHooks};
use crate::scheduler::{QkScheduler, ScheduleDecision};

pub struct KernelBuilder {
    config: FrameworkConfig,
    pools: Option<EventPools>,
    trace: Option<TraceHook>,
    hooks: Arc<dyn KernelHooks>,
}

impl KernelBuilder {
    pub fn config(mut self, config: FrameworkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn pools(mut self, pools: EventPools) -> Self {
        self.pools = Some(pools);
        self
    }

    pub fn trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn KernelHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Result<Kernel, KernelError> {
        let scheduler = Arc::new(QkScheduler::new(self.trace.clone()));

        let mut framework = Framework::builder(scheduler.clone()).config(self.config);
        if let Some(pools) = self.pools {
            framework = framework.pools(pools);
        }
        if let Some(trace) = self.trace {
            framework = framework.trace_hook(trace);
        }

        Ok(Kernel {
            framework: framework.build()?,
            scheduler,
            hooks: self.hooks,
            running: AtomicBool::new(false),
        })
    }
}

/// The preemptive kernel: a [`Framework`] driven by a [`QkScheduler`].
///
/// Dispatching happens on one thread of control, the one calling
/// [`dispatch_once`](Self::dispatch_once) or a run loop. Posting, publishing
/// and ticking are safe from anywhere, interrupt context included.
pub struct Kernel {
    framework: Framework,
    scheduler: Arc<QkScheduler>,
    hooks: Arc<dyn KernelHooks>,
    running: AtomicBool,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder {
            config: FrameworkConfig::default(),
            pools: None,
            trace: None,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn framework(&self) -> &Framework {
        &self.framework
    }

    pub fn scheduler(&self) -> &Arc<QkScheduler> {
        &self.scheduler
    }

    /// Registers `active` and runs its initial transition. Events it posts
    /// while initializing are processed once the kernel runs.
    pub fn start_active(&self, active: Arc<dyn Active>, init: &Event<'_>) {
        self.framework.start_active(active, init);
    }

    /// FIFO post; a missing target is reported, overflow is fatal.
    pub fn post(&self, prio: Priority, event: EventRef) -> Result<(), KernelError> {
        if self.framework.active(prio).is_none() {
            self.framework.release(event);
            return Err(KernelError::NotRegistered(prio));
        }
        self.framework.post(prio, event);
        Ok(())
    }

    /// Non-asserting post, see [`Framework::try_post`].
    pub fn try_post(&self, prio: Priority, event: EventRef, margin: u16) -> Result<(), KernelError> {
        Ok(self.framework.try_post(prio, event, margin)?)
    }

    pub fn publish(&self, event: EventRef) {
        self.framework.publish(event);
    }

    pub fn tick(&self, rate: u8) {
        self.framework.tick(rate);
    }

    pub fn lock_scheduler(&self, ceiling: Priority) -> SchedStatus {
        self.scheduler.lock(ceiling)
    }

    /// Restores the ceiling and runs whatever the lock held back.
    pub fn unlock_scheduler(&self, status: SchedStatus) {
        let was_locked = status.is_locked();
        self.scheduler.unlock(status);

        if was_locked {
            if let Some(decision) = self.scheduler.plan_activation() {
                self.activate(decision);
            }
        }
    }

    pub fn has_pending_work(&self) -> bool {
        self.scheduler.has_ready_to_run()
    }

    /// Runs the highest-priority ready work, and everything that became
    /// eligible while it ran. Returns `false` when nothing was ready.
    pub fn dispatch_once(&self) -> bool {
        match self.scheduler.plan_activation() {
            Some(decision) => {
                self.activate(decision);
                true
            }
            None => false,
        }
    }

    pub fn run_until_idle(&self) {
        while self.dispatch_once() {}
    }

    /// Runs until [`stop`](Self::stop) is called or `done` returns `true`.
    pub fn run_until(&self, mut done: impl FnMut() -> bool) {
        self.running.store(true, Ordering::SeqCst);
        self.hooks.on_startup();
        log::debug!("kernel '{}' running", self.framework.config().name);

        while self.running.load(Ordering::SeqCst) && !done() {
            if !self.dispatch_once() {
                self.hooks.on_idle();
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.hooks.on_cleanup();
        log::debug!("kernel '{}' stopped", self.framework.config().name);
    }

    /// Runs forever.
    pub fn run(&self) -> ! {
        self.hooks.on_startup();
        loop {
            if !self.dispatch_once() {
                self.hooks.on_idle();
            }
        }
    }

    /// Ends a [`run_until`](Self::run_until) loop after the current step.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn activate(&self, initial: ScheduleDecision) {
        let restore = initial.previous_prio;
        let mut decision = initial;

        loop {
            let prio = decision.next_prio;
            self.scheduler.commit_activation(&decision);
            if decision.previous_prio != prio {
                self.hooks.on_context_switch(decision.previous_prio, prio);
            }

            match self.framework.active(prio) {
                Some(active) => {
                    active.dispatch_one();
                    critical_section::with(|_| {
                        if !active.has_events() {
                            self.scheduler.mark_not_ready(prio);
                        }
                    });
                }
                None => {
                    log::warn!("{prio} ready without an active object");
                    self.scheduler.mark_not_ready(prio);
                }
            }

            match self.scheduler.next_after_dispatch(restore) {
                Some(next) => decision = next,
                None => {
                    self.scheduler.restore_active(restore);
                    if restore != prio {
                        self.hooks.on_context_switch(prio, restore);
                    }
                    break;
                }
            }
        }
    }
}
