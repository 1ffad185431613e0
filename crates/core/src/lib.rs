#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # rtk core
//!
//! Shared vocabulary of the rtk framework: signals, immutable event views,
//! active-object priorities, the critical-section cell that guards every piece
//! of cross-context state, and the single fatal path taken on contract
//! violations.
//!
//! Without the `std` feature the target must provide a `critical-section`
//! implementation (for example through its HAL or `cortex-m`).

pub mod assert;
pub mod cell;
pub mod event;
pub mod priority;
pub mod signal;

pub use assert::{clear_violation_handler, set_violation_handler, Violation, ViolationHandler};
pub use cell::CritCell;
pub use event::{BlockId, Event};
pub use priority::{Priority, PrioritySet};
pub use signal::Signal;

/// rtk framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
