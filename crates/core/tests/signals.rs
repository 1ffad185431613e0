//! Signal and event view tests for rtk-core

use rtk_core::{BlockId, Event, Signal};

#[test]
fn reserved_signals_precede_user_range() {
    for reserved in [Signal::EMPTY, Signal::ENTRY, Signal::EXIT, Signal::INIT] {
        assert!(reserved.is_reserved());
        assert!(reserved < Signal::USER);
    }
    assert!(!Signal::USER.is_reserved());
    assert_eq!(Signal::user(3), Signal(7));
}

#[test]
fn signal_display_names_lifecycle_signals() {
    assert_eq!(Signal::ENTRY.to_string(), "ENTRY");
    assert_eq!(Signal(42).to_string(), "Signal(42)");
}

#[test]
fn static_events_report_pool_zero() {
    let event = Event::new(Signal(10));
    assert!(event.is_static());
    assert_eq!(event.pool_id(), 0);
    assert!(event.payload().is_empty());
}

#[test]
fn static_payload_survives_to_static() {
    static BYTES: [u8; 2] = [7, 8];
    let event = Event::with_static_payload(Signal(12), &BYTES);
    let again = event.to_static().expect("static event");
    assert_eq!(again, event);
    assert_eq!(again.payload(), &[7, 8]);
}

#[test]
fn transient_events_are_neither_static_nor_pooled() {
    let bytes = [5u8];
    let event = Event::transient(Signal(13), &bytes);
    assert!(event.is_transient());
    assert!(!event.is_static());
    assert_eq!(event.origin(), None);
    assert_eq!(event.to_static(), None);
}

#[test]
fn pooled_view_keeps_origin() {
    let bytes = [1u8, 2, 3];
    let block = BlockId::new(2, 7, 41);
    let event = Event::pooled(Signal(11), &bytes, block);

    assert!(!event.is_static());
    assert_eq!(event.pool_id(), 2);
    assert_eq!(event.origin(), Some(block));
    assert_eq!(event.payload(), &[1, 2, 3]);
}

#[test]
fn lifecycle_constants_carry_reserved_signals() {
    assert_eq!(Event::ENTRY.signal(), Signal::ENTRY);
    assert_eq!(Event::EXIT.signal(), Signal::EXIT);
    assert_eq!(Event::INIT.signal(), Signal::INIT);
    assert_eq!(Event::EMPTY.signal(), Signal::EMPTY);
}
