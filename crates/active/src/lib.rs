#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # rtk active objects
//!
//! Everything between the state-machine engine and the scheduler:
//! - [`EventQueue`] and [`DeferQueue`], bounded rings of owned event references
//! - [`ActiveObject`], binding an [`Hsm`](rtk_hsm::Hsm), user data and a queue
//!   to a priority
//! - [`Framework`], the registry with posting, publish-subscribe and time events
//! - [`Ticker`], which runs clock ticks at task level
//!
//! The framework never decides what runs next. It reports readiness through a
//! [`SchedulerPort`]; `rtk-kernel` provides the preemptive implementation.

extern crate alloc;

mod active;
mod config;
mod context;
mod defer;
mod error;
mod framework;
mod port;
mod pubsub;
mod queue;
pub mod sync;
mod ticker;
mod time;

pub use active::{Active, ActiveObject};
pub use config::{FrameworkConfig, FrameworkConfigBuilder, MAX_TICK_RATES};
pub use context::ActiveContext;
pub use defer::DeferQueue;
pub use error::{ConfigError, PostError};
pub use framework::{Framework, FrameworkBuilder};
pub use port::{SchedStatus, SchedulerPort};
pub use queue::EventQueue;
pub use ticker::Ticker;
pub use time::TimeEventId;
