#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # rtk state machine engine
//!
//! Hierarchical state machines in the UML statechart sense:
//! - entry and exit actions that run exactly once per crossing
//! - transitions through the least common ancestor of source and target
//! - nested initial transitions
//! - shallow and deep history
//!
//! The state tree is plain data. Every [`State`] is a `static` item naming its
//! parent, so the engine walks the hierarchy without invoking any handler;
//! handlers only ever run to perform actions.
//!
//! ```
//! use rtk_core::{Event, Signal};
//! use rtk_hsm::{Hsm, Outcome, State};
//!
//! const TOGGLE: Signal = Signal::user(0);
//!
//! #[derive(Default)]
//! struct Lamp {
//!     switched: u32,
//! }
//!
//! static INITIAL: State<Lamp> = State::new("initial", |_, _, _| Outcome::Initial(&OFF));
//! static OFF: State<Lamp> = State::new("off", |lamp, _, e| match e.signal() {
//!     TOGGLE => Outcome::Tran(&ON),
//!     Signal::ENTRY => {
//!         lamp.switched += 1;
//!         Outcome::Handled
//!     }
//!     _ => Outcome::Super,
//! });
//! static ON: State<Lamp> = State::new("on", |_, _, e| match e.signal() {
//!     TOGGLE => Outcome::Tran(&OFF),
//!     _ => Outcome::Super,
//! });
//!
//! let mut lamp = Lamp::default();
//! let mut hsm = Hsm::new(&INITIAL);
//! hsm.init(&mut lamp, &mut (), &Event::EMPTY);
//! hsm.dispatch(&mut lamp, &mut (), &Event::new(TOGGLE));
//! hsm.dispatch(&mut lamp, &mut (), &Event::new(TOGGLE));
//!
//! assert!(hsm.is_in(&OFF));
//! assert_eq!(lamp.switched, 2);
//! ```

mod hsm;
mod state;

pub use hsm::Hsm;
pub use state::{History, Outcome, State, StateHandler};

#[cfg(test)]
mod tests;

/// Maximum depth of the state hierarchy, counting top-level states as 1.
pub const MAX_NEST_DEPTH: usize = 8;

/// Maximum number of composite states per machine that record history.
pub const MAX_HISTORY: usize = 16;
