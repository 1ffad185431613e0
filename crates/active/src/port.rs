//! The seam between the framework and the scheduler that runs it.

use rtk_core::Priority;

/// Scheduler lock state returned by [`SchedulerPort::lock`] and handed back to
/// [`SchedulerPort::unlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedStatus {
    /// The lock raised the ceiling; holds the ceiling to restore.
    Locked(Priority),
    /// The requested ceiling did not exceed the current one; nothing to undo.
    Unlocked,
}

impl SchedStatus {
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Locked(_))
    }
}

/// What the framework needs from a scheduler.
///
/// `on_ready` and `on_empty` are always called inside a critical section,
/// together with the queue change they report.
pub trait SchedulerPort: Send + Sync {
    /// The queue at `prio` became non-empty (or received another event).
    fn on_ready(&self, prio: Priority);

    /// The queue at `prio` drained or its active object went away.
    fn on_empty(&self, prio: Priority);

    /// Raises the preemption ceiling to `ceiling` if that is higher than the
    /// current one.
    fn lock(&self, ceiling: Priority) -> SchedStatus;

    fn unlock(&self, status: SchedStatus);
}
