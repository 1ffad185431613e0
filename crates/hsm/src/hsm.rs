//! The dispatch engine.

use core::fmt;
use core::ptr;

use heapless::Vec;
use rtk_core::{fail, require, Event, Signal};
use rtk_trace::{emit, records, TraceHook, MAX_RECORD_LEN};

use crate::state::{History, Outcome, State};
use crate::{MAX_HISTORY, MAX_NEST_DEPTH};

/// Chain from a state up to its top-level ancestor, innermost first.
type Path<M, C> = Vec<&'static State<M, C>, MAX_NEST_DEPTH>;

/// Running instance of a hierarchical state machine.
///
/// The machine's data `M` and the context `C` live outside the engine and are
/// passed to every call, so one `Hsm` can be embedded next to the data it
/// drives.
pub struct Hsm<M: 'static, C: 'static = ()> {
    /// Initial pseudo-state before [`init`](Self::init), then the active leaf.
    state: &'static State<M, C>,
    started: bool,
    history: Vec<(&'static State<M, C>, &'static State<M, C>), MAX_HISTORY>,
    trace: Option<TraceHook>,
}

/// Bookkeeping for one exit sequence.
struct ExitSeq<M: 'static, C: 'static> {
    leaf: &'static State<M, C>,
    below: Option<&'static State<M, C>>,
}

impl<M: 'static, C: 'static> Hsm<M, C> {
    /// Creates a machine whose top-most initial transition is taken by
    /// `initial`, a pseudo-state outside the tree that answers with
    /// [`Outcome::Initial`].
    pub const fn new(initial: &'static State<M, C>) -> Self {
        Self {
            state: initial,
            started: false,
            history: Vec::new(),
            trace: None,
        }
    }

    pub fn set_trace_hook(&mut self, hook: Option<TraceHook>) {
        self.trace = hook;
    }

    /// Current leaf state (the initial pseudo-state before `init`).
    pub fn state(&self) -> &'static State<M, C> {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether `state` is the active leaf or one of its ancestors.
    pub fn is_in(&self, state: &'static State<M, C>) -> bool {
        self.started && state.contains(self.state)
    }

    /// The direct child of `parent` on the active chain.
    ///
    /// Fatal when `parent` is not an active composite state.
    pub fn child_state(&self, parent: &'static State<M, C>) -> &'static State<M, C> {
        let mut child = None;
        for state in path_to_top(self.state) {
            if ptr::eq(state, parent) {
                match child {
                    Some(child) => return child,
                    None => fail!(100, "state has no active child"),
                }
            }
            child = Some(state);
        }
        fail!(110, "state is not active")
    }

    /// History recorded for `composite` when it was last exited.
    pub fn history(&self, composite: &'static State<M, C>) -> Option<&'static State<M, C>> {
        self.history
            .iter()
            .find(|(owner, _)| ptr::eq(*owner, composite))
            .map(|&(_, recorded)| recorded)
    }

    /// Takes the top-most initial transition. `event` is handed to the initial
    /// pseudo-state, typically carrying start-up parameters.
    pub fn init(&mut self, me: &mut M, ctx: &mut C, event: &Event<'_>) {
        require!(!self.started, 200);

        let target = match (self.state.handler)(me, ctx, event) {
            Outcome::Initial(target) => target,
            _ => fail!(210, "initial pseudo-state must take an initial transition"),
        };
        self.started = true;
        self.trace(records::qep::INIT_TRAN, None, target);
        log::trace!("init -> {}", target.name);

        for state in path_to_top(target).iter().rev().copied() {
            self.enter(state, me, ctx);
        }
        self.state = self.drill(target, me, ctx);
    }

    /// Processes one event to completion.
    pub fn dispatch(&mut self, me: &mut M, ctx: &mut C, event: &Event<'_>) {
        require!(self.started, 300);
        require!(!event.signal().is_reserved(), 310);

        let signal = event.signal();
        let leaf = self.state;
        self.trace(records::qep::DISPATCH, Some(signal), leaf);

        let mut cursor = Some(leaf);
        let mut depth = 0;
        let (source, target) = loop {
            let Some(state) = cursor else {
                self.trace(records::qep::IGNORED, Some(signal), leaf);
                return;
            };
            depth += 1;
            require!(depth <= MAX_NEST_DEPTH, 320);

            match (state.handler)(me, ctx, event) {
                Outcome::Super => cursor = state.parent,
                Outcome::Handled => {
                    self.trace(records::qep::INTERN_TRAN, Some(signal), state);
                    return;
                }
                Outcome::Ignored => {
                    self.trace(records::qep::IGNORED, Some(signal), state);
                    return;
                }
                Outcome::Tran(target) => {
                    self.trace(records::qep::TRAN, Some(signal), target);
                    break (state, target);
                }
                Outcome::TranHist(composite) => {
                    self.trace(records::qep::TRAN_HIST, Some(signal), composite);
                    break (state, self.history(composite).unwrap_or(composite));
                }
                Outcome::Initial(_) => fail!(330, "initial transition outside of INIT"),
            }
        };

        log::trace!("{signal}: {} -> {}", source.name, target.name);
        self.transition(leaf, source, target, me, ctx);
    }

    fn transition(
        &mut self,
        leaf: &'static State<M, C>,
        source: &'static State<M, C>,
        target: &'static State<M, C>,
        me: &mut M,
        ctx: &mut C,
    ) {
        let mut seq = ExitSeq { leaf, below: None };

        // States nested inside the one that took the transition go first.
        for state in path_to_top(leaf) {
            if ptr::eq(state, source) {
                break;
            }
            self.exit(state, &mut seq, me, ctx);
        }

        let target_path = path_to_top(target);
        if ptr::eq(source, target) {
            self.exit(source, &mut seq, me, ctx);
            self.enter(target, me, ctx);
        } else {
            let mut entries = &target_path[..];
            for state in path_to_top(source) {
                if let Some(lca) = position(&target_path, state) {
                    entries = &target_path[..lca];
                    break;
                }
                self.exit(state, &mut seq, me, ctx);
            }
            for state in entries.iter().rev().copied() {
                self.enter(state, me, ctx);
            }
        }

        self.state = self.drill(target, me, ctx);
    }

    /// Follows nested initial transitions from `state` down to a leaf.
    fn drill(&mut self, mut state: &'static State<M, C>, me: &mut M, ctx: &mut C) -> &'static State<M, C> {
        for _ in 0..MAX_NEST_DEPTH {
            match (state.handler)(me, ctx, &Event::INIT) {
                Outcome::Initial(child) => {
                    require!(!ptr::eq(child, state) && state.contains(child), 600);
                    let path = path_to_top(child);
                    let below = position(&path, state).unwrap_or(path.len());
                    for entered in path[..below].iter().rev().copied() {
                        self.enter(entered, me, ctx);
                    }
                    self.trace(records::qep::STATE_INIT, None, child);
                    state = child;
                }
                Outcome::Tran(_) | Outcome::TranHist(_) => {
                    fail!(610, "INIT must answer with an initial transition")
                }
                _ => return state,
            }
        }
        fail!(620, "initial transitions nest deeper than MAX_NEST_DEPTH")
    }

    fn enter(&mut self, state: &'static State<M, C>, me: &mut M, ctx: &mut C) {
        let outcome = (state.handler)(me, ctx, &Event::ENTRY);
        require!(is_action_outcome(&outcome), 500);
        self.trace(records::qep::STATE_ENTRY, None, state);
    }

    fn exit(&mut self, state: &'static State<M, C>, seq: &mut ExitSeq<M, C>, me: &mut M, ctx: &mut C) {
        let outcome = (state.handler)(me, ctx, &Event::EXIT);
        require!(is_action_outcome(&outcome), 510);
        self.trace(records::qep::STATE_EXIT, None, state);

        let recorded = match state.history {
            History::None => None,
            History::Shallow => seq.below,
            History::Deep => Some(seq.leaf).filter(|leaf| !ptr::eq(*leaf, state)),
        };
        if let Some(recorded) = recorded {
            self.record_history(state, recorded);
        }
        seq.below = Some(state);
    }

    fn record_history(&mut self, composite: &'static State<M, C>, recorded: &'static State<M, C>) {
        match self.history.iter().position(|(owner, _)| ptr::eq(*owner, composite)) {
            Some(index) => self.history[index].1 = recorded,
            None => {
                if self.history.push((composite, recorded)).is_err() {
                    fail!(400, "more composite states with history than MAX_HISTORY");
                }
            }
        }
    }

    fn trace(&self, record: u8, signal: Option<Signal>, state: &State<M, C>) {
        if self.trace.is_none() {
            return;
        }
        let mut payload: Vec<u8, MAX_RECORD_LEN> = Vec::new();
        if let Some(signal) = signal {
            let _ = payload.extend_from_slice(&signal.to_le_bytes());
        }
        let name = state.name.as_bytes();
        let room = payload.capacity() - payload.len();
        let _ = payload.extend_from_slice(&name[..name.len().min(room)]);
        emit(self.trace.as_ref(), record, &payload);
    }
}

impl<M: 'static, C: 'static> fmt::Debug for Hsm<M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hsm")
            .field("state", &self.state.name)
            .field("started", &self.started)
            .finish()
    }
}

fn path_to_top<M: 'static, C: 'static>(state: &'static State<M, C>) -> Path<M, C> {
    let mut path = Path::new();
    let mut cursor = Some(state);
    while let Some(state) = cursor {
        if path.push(state).is_err() {
            fail!(700, "state nesting exceeds MAX_NEST_DEPTH");
        }
        cursor = state.parent;
    }
    path
}

fn position<M: 'static, C: 'static>(path: &[&'static State<M, C>], state: &State<M, C>) -> Option<usize> {
    path.iter().position(|candidate| ptr::eq(*candidate, state))
}

fn is_action_outcome<M: 'static, C: 'static>(outcome: &Outcome<M, C>) -> bool {
    matches!(outcome, Outcome::Handled | Outcome::Ignored | Outcome::Super)
}
