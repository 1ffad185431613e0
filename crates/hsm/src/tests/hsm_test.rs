//! Transition topology tests on a small nested machine:
//!
//! ```text
//! s
//! +-- s1 ----- s11
//! +-- s2 ----- s21 ----- s211
//! ```

use rtk_core::{Event, Signal};
use rtk_trace::{records, RecordLog};

use crate::{Hsm, Outcome, State};

const A: Signal = Signal::user(0);
const B: Signal = Signal::user(1);
const C: Signal = Signal::user(2);
const D: Signal = Signal::user(3);
const E: Signal = Signal::user(4);
const F: Signal = Signal::user(5);

#[derive(Default)]
struct Model {
    log: Vec<String>,
    foo: bool,
}

impl Model {
    fn note(&mut self, state: &str, e: &Event<'_>) {
        let what = match e.signal() {
            Signal::ENTRY => "entry",
            Signal::EXIT => "exit",
            Signal::INIT => "init",
            _ => "handled",
        };
        self.log.push(format!("{state}-{what}"));
    }

    fn take(&mut self) -> Vec<String> {
        core::mem::take(&mut self.log)
    }
}

static INITIAL: State<Model> = State::new("initial", |_, _, _| Outcome::Initial(&S));

static S: State<Model> = State::new("s", s);
static S1: State<Model> = State::new("s1", s1).child_of(&S);
static S11: State<Model> = State::new("s11", s11).child_of(&S1);
static S2: State<Model> = State::new("s2", s2).child_of(&S);
static S21: State<Model> = State::new("s21", s21).child_of(&S2);
static S211: State<Model> = State::new("s211", s211).child_of(&S21);

fn s(m: &mut Model, _: &mut (), e: &Event<'_>) -> Outcome<Model> {
    match e.signal() {
        Signal::ENTRY | Signal::EXIT => {
            m.note("s", e);
            Outcome::Handled
        }
        Signal::INIT => {
            m.note("s", e);
            Outcome::Initial(&S11)
        }
        E => Outcome::Tran(&S11),
        _ => Outcome::Super,
    }
}

fn s1(m: &mut Model, _: &mut (), e: &Event<'_>) -> Outcome<Model> {
    match e.signal() {
        Signal::ENTRY | Signal::EXIT => {
            m.note("s1", e);
            Outcome::Handled
        }
        Signal::INIT => {
            m.note("s1", e);
            Outcome::Initial(&S11)
        }
        B => Outcome::Tran(&S1),
        D => Outcome::Tran(&S11),
        F if m.foo => {
            m.foo = false;
            m.note("s1", e);
            Outcome::Handled
        }
        _ => Outcome::Super,
    }
}

fn s11(m: &mut Model, _: &mut (), e: &Event<'_>) -> Outcome<Model> {
    match e.signal() {
        Signal::ENTRY | Signal::EXIT => {
            m.note("s11", e);
            Outcome::Handled
        }
        A => Outcome::Tran(&S211),
        _ => Outcome::Super,
    }
}

fn s2(m: &mut Model, _: &mut (), e: &Event<'_>) -> Outcome<Model> {
    match e.signal() {
        Signal::ENTRY | Signal::EXIT => {
            m.note("s2", e);
            Outcome::Handled
        }
        Signal::INIT => {
            m.note("s2", e);
            Outcome::Initial(&S211)
        }
        _ => Outcome::Super,
    }
}

fn s21(m: &mut Model, _: &mut (), e: &Event<'_>) -> Outcome<Model> {
    match e.signal() {
        Signal::ENTRY | Signal::EXIT => {
            m.note("s21", e);
            Outcome::Handled
        }
        Signal::INIT => {
            m.note("s21", e);
            Outcome::Initial(&S211)
        }
        _ => Outcome::Super,
    }
}

fn s211(m: &mut Model, _: &mut (), e: &Event<'_>) -> Outcome<Model> {
    match e.signal() {
        Signal::ENTRY | Signal::EXIT => {
            m.note("s211", e);
            Outcome::Handled
        }
        C => Outcome::Tran(&S),
        F => Outcome::Ignored,
        _ => Outcome::Super,
    }
}

fn started() -> (Hsm<Model>, Model) {
    let mut hsm = Hsm::new(&INITIAL);
    let mut model = Model::default();
    hsm.init(&mut model, &mut (), &Event::EMPTY);
    model.take();
    (hsm, model)
}

fn send(hsm: &mut Hsm<Model>, model: &mut Model, signal: Signal) -> Vec<String> {
    hsm.dispatch(model, &mut (), &Event::new(signal));
    model.take()
}

#[test]
fn init_enters_from_the_top_and_drills_to_a_leaf() {
    let mut hsm = Hsm::new(&INITIAL);
    let mut model = Model::default();
    assert!(!hsm.is_started());

    hsm.init(&mut model, &mut (), &Event::EMPTY);

    assert_eq!(model.log, ["s-entry", "s-init", "s1-entry", "s11-entry"]);
    assert!(core::ptr::eq(hsm.state(), &S11));
    assert!(hsm.is_in(&S) && hsm.is_in(&S1) && !hsm.is_in(&S2));
}

#[test]
fn transition_across_subtrees_stops_at_the_lca() {
    let (mut hsm, mut model) = started();

    let log = send(&mut hsm, &mut model, A);

    assert_eq!(
        log,
        ["s11-exit", "s1-exit", "s2-entry", "s21-entry", "s211-entry"]
    );
    assert!(core::ptr::eq(hsm.state(), &S211));
}

#[test]
fn self_transition_exits_and_reenters_the_source() {
    let (mut hsm, mut model) = started();

    let log = send(&mut hsm, &mut model, B);

    assert_eq!(
        log,
        ["s11-exit", "s1-exit", "s1-entry", "s1-init", "s11-entry"]
    );
    assert!(core::ptr::eq(hsm.state(), &S11));
}

#[test]
fn transition_to_an_ancestor_does_not_exit_it() {
    let (mut hsm, mut model) = started();
    send(&mut hsm, &mut model, A);

    let log = send(&mut hsm, &mut model, C);

    assert_eq!(
        log,
        ["s211-exit", "s21-exit", "s2-exit", "s-init", "s1-entry", "s11-entry"]
    );
}

#[test]
fn transition_from_superstate_into_its_own_leaf() {
    let (mut hsm, mut model) = started();

    let log = send(&mut hsm, &mut model, D);

    assert_eq!(log, ["s11-exit", "s11-entry"]);
}

#[test]
fn transition_handled_high_up_exits_the_whole_subtree() {
    let (mut hsm, mut model) = started();
    send(&mut hsm, &mut model, A);

    let log = send(&mut hsm, &mut model, E);

    assert_eq!(
        log,
        ["s211-exit", "s21-exit", "s2-exit", "s1-entry", "s11-entry"]
    );
}

#[test]
fn guard_and_ignore_leave_the_configuration_alone() {
    let (mut hsm, mut model) = started();

    assert!(send(&mut hsm, &mut model, F).is_empty());
    model.foo = true;
    assert_eq!(send(&mut hsm, &mut model, F), ["s1-handled"]);

    send(&mut hsm, &mut model, A);
    model.foo = true;
    assert!(send(&mut hsm, &mut model, F).is_empty());
    assert!(model.foo, "s211 ignores F before s1 sees it");
    assert!(core::ptr::eq(hsm.state(), &S211));
}

#[test]
fn child_state_follows_the_active_chain() {
    let (mut hsm, mut model) = started();
    assert!(core::ptr::eq(hsm.child_state(&S), &S1));

    send(&mut hsm, &mut model, A);
    assert!(core::ptr::eq(hsm.child_state(&S), &S2));
    assert!(core::ptr::eq(hsm.child_state(&S2), &S21));
}

#[test]
#[should_panic(expected = "state is not active")]
fn child_state_of_inactive_state_is_fatal() {
    let (hsm, _model) = started();
    hsm.child_state(&S2);
}

#[test]
fn trace_reports_dispatch_and_transition_records() {
    let log = RecordLog::new();
    let mut hsm = Hsm::new(&INITIAL);
    hsm.set_trace_hook(Some(log.hook()));
    let mut model = Model::default();
    hsm.init(&mut model, &mut (), &Event::EMPTY);
    assert_eq!(
        log.ids(),
        [
            records::qep::INIT_TRAN,
            records::qep::STATE_ENTRY,
            records::qep::STATE_ENTRY,
            records::qep::STATE_ENTRY,
            records::qep::STATE_INIT,
        ]
    );

    log.clear();
    hsm.dispatch(&mut model, &mut (), &Event::new(D));
    assert_eq!(
        log.ids(),
        [
            records::qep::DISPATCH,
            records::qep::TRAN,
            records::qep::STATE_EXIT,
            records::qep::STATE_ENTRY,
        ]
    );
    assert_eq!(log.records()[0].payload[..2], D.to_le_bytes());
}

#[test]
#[should_panic(expected = "contract violation")]
fn dispatch_before_init_is_fatal() {
    let mut hsm = Hsm::new(&INITIAL);
    hsm.dispatch(&mut Model::default(), &mut (), &Event::new(A));
}

#[test]
#[should_panic(expected = "contract violation")]
fn second_init_is_fatal() {
    let (mut hsm, mut model) = started();
    hsm.init(&mut model, &mut (), &Event::EMPTY);
}

#[test]
#[should_panic(expected = "contract violation")]
fn dispatching_a_reserved_signal_is_fatal() {
    let (mut hsm, mut model) = started();
    hsm.dispatch(&mut model, &mut (), &Event::ENTRY);
}
