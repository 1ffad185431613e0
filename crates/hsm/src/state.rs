//! State descriptors and handler outcomes.

use core::fmt;
use core::ptr;

use rtk_core::Event;

/// A state handler: performs the state's actions for one event and reports
/// how the event was treated.
///
/// `M` is the machine's own data, `C` the execution context supplied by the
/// caller of [`Hsm::dispatch`](crate::Hsm::dispatch).
pub type StateHandler<M, C> = fn(&mut M, &mut C, &Event<'_>) -> Outcome<M, C>;

/// Kind of history a composite state keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum History {
    #[default]
    None,
    /// Remembers the direct child that was active when the state was exited.
    Shallow,
    /// Remembers the innermost state that was active when the state was exited.
    Deep,
}

/// A node of the state tree.
///
/// States must be `static` items: identity is the item's address.
pub struct State<M: 'static, C: 'static = ()> {
    pub name: &'static str,
    /// Enclosing state; `None` places the state directly under the implicit top.
    pub parent: Option<&'static State<M, C>>,
    pub handler: StateHandler<M, C>,
    pub history: History,
}

impl<M: 'static, C: 'static> State<M, C> {
    pub const fn new(name: &'static str, handler: StateHandler<M, C>) -> Self {
        Self {
            name,
            parent: None,
            handler,
            history: History::None,
        }
    }

    pub const fn child_of(mut self, parent: &'static State<M, C>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub const fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&'static self, other: &'static State<M, C>) -> bool {
        let mut cursor = Some(other);
        for _ in 0..=crate::MAX_NEST_DEPTH {
            match cursor {
                Some(state) if ptr::eq(state, self) => return true,
                Some(state) => cursor = state.parent,
                None => return false,
            }
        }
        false
    }
}

impl<M: 'static, C: 'static> fmt::Debug for State<M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|parent| parent.name))
            .field("history", &self.history)
            .finish()
    }
}

/// What a handler did with an event.
pub enum Outcome<M: 'static, C: 'static = ()> {
    /// Consumed; no state change (internal transition).
    Handled,
    /// Consumed without effect. The implicit top treats every event this way.
    Ignored,
    /// Not handled here; the engine retries in the parent state.
    Super,
    /// Transition to the given state.
    Tran(&'static State<M, C>),
    /// Transition to the history recorded for the given composite state, or to
    /// the composite itself when it has none yet.
    TranHist(&'static State<M, C>),
    /// Initial transition; only valid as the answer to the INIT signal.
    Initial(&'static State<M, C>),
}

impl<M: 'static, C: 'static> Clone for Outcome<M, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: 'static, C: 'static> Copy for Outcome<M, C> {}

impl<M: 'static, C: 'static> PartialEq for Outcome<M, C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Handled, Self::Handled)
            | (Self::Ignored, Self::Ignored)
            | (Self::Super, Self::Super) => true,
            (Self::Tran(a), Self::Tran(b))
            | (Self::TranHist(a), Self::TranHist(b))
            | (Self::Initial(a), Self::Initial(b)) => ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl<M: 'static, C: 'static> Eq for Outcome<M, C> {}

impl<M: 'static, C: 'static> fmt::Debug for Outcome<M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handled => f.write_str("Handled"),
            Self::Ignored => f.write_str("Ignored"),
            Self::Super => f.write_str("Super"),
            Self::Tran(state) => write!(f, "Tran({})", state.name),
            Self::TranHist(state) => write!(f, "TranHist({})", state.name),
            Self::Initial(state) => write!(f, "Initial({})", state.name),
        }
    }
}
