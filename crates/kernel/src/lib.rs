#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # rtk preemptive kernel
//!
//! A QK-style scheduler: one stack, priority-preemptive between
//! run-to-completion steps. The highest-priority active object with pending
//! events always runs next; a single dispatch is never interrupted by another
//! active object, and the scheduler lock raises the preemption ceiling for
//! code that must not be preempted by objects at or below it.

extern crate alloc;

mod error;
mod hooks;
mod kernel;
mod mutex;
mod scheduler;

pub use error::KernelError;
pub use hooks::{KernelHooks, NoHooks};
pub use kernel::{Kernel, KernelBuilder};
pub use mutex::{CeilingGuard, CeilingMutex, SchedulerLock};
pub use scheduler::{QkScheduler, ScheduleDecision};
