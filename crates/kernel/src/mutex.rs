//! Priority-ceiling mutex on top of the scheduler lock.

use rtk_active::{ActiveContext, Framework, SchedStatus};
use rtk_core::{require, Priority};

use crate::kernel::Kernel;

/// Anything that can raise and restore the preemption ceiling.
pub trait SchedulerLock {
    fn lock_scheduler(&self, ceiling: Priority) -> SchedStatus;

    fn unlock_scheduler(&self, status: SchedStatus);
}

impl SchedulerLock for Kernel {
    fn lock_scheduler(&self, ceiling: Priority) -> SchedStatus {
        Kernel::lock_scheduler(self, ceiling)
    }

    fn unlock_scheduler(&self, status: SchedStatus) {
        Kernel::unlock_scheduler(self, status);
    }
}

impl SchedulerLock for Framework {
    fn lock_scheduler(&self, ceiling: Priority) -> SchedStatus {
        Framework::lock_scheduler(self, ceiling)
    }

    fn unlock_scheduler(&self, status: SchedStatus) {
        Framework::unlock_scheduler(self, status);
    }
}

impl SchedulerLock for ActiveContext {
    fn lock_scheduler(&self, ceiling: Priority) -> SchedStatus {
        ActiveContext::lock_scheduler(self, ceiling)
    }

    fn unlock_scheduler(&self, status: SchedStatus) {
        ActiveContext::unlock_scheduler(self, status);
    }
}

/// Guards a resource shared by active objects at or below `ceiling`.
///
/// While held, no active object at or below the ceiling is scheduled, so
/// the holder never blocks. Nested locks of the same mutex are free: the
/// inner guard finds the ceiling already raised and restores nothing.
#[derive(Debug, Clone, Copy)]
pub struct CeilingMutex {
    ceiling: Priority,
}

impl CeilingMutex {
    pub fn new(ceiling: Priority) -> Self {
        require!(ceiling != Priority::IDLE, 100);
        Self { ceiling }
    }

    pub fn ceiling(&self) -> Priority {
        self.ceiling
    }

    pub fn lock<'a, L: SchedulerLock + ?Sized>(&self, sched: &'a L) -> CeilingGuard<'a, L> {
        CeilingGuard {
            sched,
            status: sched.lock_scheduler(self.ceiling),
        }
    }
}

/// Restores the previous ceiling when dropped.
#[must_use = "the ceiling drops again as soon as the guard is dropped"]
pub struct CeilingGuard<'a, L: SchedulerLock + ?Sized> {
    sched: &'a L,
    status: SchedStatus,
}

impl<L: SchedulerLock + ?Sized> CeilingGuard<'_, L> {
    /// Whether this guard raised the ceiling (the outermost lock does).
    pub fn raised(&self) -> bool {
        self.status.is_locked()
    }
}

impl<L: SchedulerLock + ?Sized> Drop for CeilingGuard<'_, L> {
    fn drop(&mut self) {
        self.sched.unlock_scheduler(self.status);
    }
}
