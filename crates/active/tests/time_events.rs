mod common;

use std::sync::Arc;

use common::{framework, recorder, run_until_idle, signals, small_pools, RecordingPort};
use rtk_active::{Active, Framework, FrameworkConfig, Ticker};
use rtk_core::{Event, Priority, Signal};
use rtk_mem::{EventPools, EventRef};
use rtk_trace::{records, RecordLog};

const TIMEOUT: Signal = Signal::user(0);
const BLINK: Signal = Signal::user(1);
const TICK: Signal = Signal::user(2);

/// Ticks `ticks` times and reports on which ticks `signal` reached the
/// recorder.
fn firing_ticks(fw: &Framework, port: &RecordingPort, ao: &common::Recorder, ticks: u32) -> Vec<u32> {
    let mut fired = Vec::new();
    for tick in 1..=ticks {
        let before = signals(ao).len();
        fw.tick(0);
        run_until_idle(fw, port);
        if signals(ao).len() > before {
            fired.push(tick);
        }
    }
    fired
}

fn multi_rate_framework() -> (Framework, Arc<RecordingPort>) {
    let port = Arc::new(RecordingPort::default());
    let fw = Framework::builder(port.clone())
        .config(FrameworkConfig::builder().max_tick_rate(2).build().unwrap())
        .pools(small_pools())
        .build()
        .unwrap();
    (fw, port)
}

#[test]
fn periodic_time_event_fires_every_interval() {
    let (fw, port) = framework(small_pools());
    let ao = recorder(&fw, 2);
    let timer = fw.new_time_event(Priority::new(2), BLINK, 0);

    fw.arm(timer, 5, 3);
    assert_eq!(firing_ticks(&fw, &port, &ao, 15), [5, 8, 11, 14]);
    assert_eq!(fw.current_ctr(timer), 2);
    assert!(!fw.no_time_events_active(0));

    assert!(fw.disarm(timer));
    assert!(firing_ticks(&fw, &port, &ao, 10).is_empty());
}

#[test]
fn one_shot_time_event_fires_once_and_disarms() {
    let (fw, port) = framework(small_pools());
    let ao = recorder(&fw, 2);
    let timer = fw.new_time_event(Priority::new(2), TIMEOUT, 0);

    fw.arm(timer, 5, 0);
    assert_eq!(firing_ticks(&fw, &port, &ao, 20), [5]);
    assert_eq!(signals(&ao), [TIMEOUT]);
    assert!(fw.no_time_events_active(0));
    assert_eq!(fw.current_ctr(timer), 0);

    // Disarmed by expiry, so it may be armed again.
    fw.arm(timer, 2, 0);
    assert_eq!(firing_ticks(&fw, &port, &ao, 4), [2]);
}

#[test]
fn disarm_and_was_disarmed_report_the_running_state() {
    let (fw, _port) = framework(small_pools());
    let _ao = recorder(&fw, 2);
    let timer = fw.new_time_event(Priority::new(2), TIMEOUT, 0);

    fw.arm(timer, 10, 0);
    assert!(fw.disarm(timer));
    assert!(fw.was_disarmed(timer));

    assert!(!fw.disarm(timer));
    assert!(!fw.was_disarmed(timer));
    assert!(fw.was_disarmed(timer));
}

#[test]
fn rearm_restarts_the_countdown() {
    let (fw, port) = framework(small_pools());
    let ao = recorder(&fw, 2);
    let timer = fw.new_time_event(Priority::new(2), TIMEOUT, 0);

    assert!(!fw.rearm(timer, 3));
    assert_eq!(firing_ticks(&fw, &port, &ao, 2), Vec::<u32>::new());
    assert!(fw.rearm(timer, 3));
    assert_eq!(firing_ticks(&fw, &port, &ao, 5), [3]);
}

#[test]
fn rates_tick_independently() {
    let (fw, port) = multi_rate_framework();
    let ao = recorder(&fw, 1);
    let fast = fw.new_time_event(Priority::new(1), TIMEOUT, 0);
    let slow = fw.new_time_event(Priority::new(1), BLINK, 1);
    fw.arm(fast, 1, 1);
    fw.arm(slow, 1, 1);

    for _ in 0..3 {
        fw.tick(0);
    }
    fw.tick(1);
    run_until_idle(&fw, &port);

    assert_eq!(signals(&ao), [TIMEOUT, TIMEOUT, TIMEOUT, BLINK]);
}

#[test]
fn unregister_disarms_the_owners_time_events() {
    let (fw, _port) = framework(small_pools());
    let _ao = recorder(&fw, 2);
    let timer = fw.new_time_event(Priority::new(2), TIMEOUT, 0);
    fw.arm(timer, 4, 4);

    fw.unregister(Priority::new(2));
    assert!(fw.no_time_events_active(0));
    fw.tick(0);
}

#[test]
fn time_event_traffic_is_traced() {
    let log = RecordLog::new();
    let port = Arc::new(RecordingPort::default());
    let fw = Framework::builder(port.clone())
        .trace_hook(log.hook())
        .build()
        .unwrap();
    let _ao = recorder(&fw, 2);
    let timer = fw.new_time_event(Priority::new(2), TIMEOUT, 0);

    log.clear();
    fw.arm(timer, 1, 0);
    fw.tick(0);
    fw.disarm(timer);

    assert_eq!(
        log.ids(),
        [
            records::qf::time_evt::ARM,
            records::qf::TICK,
            records::qf::time_evt::AUTO_DISARM,
            records::qf::time_evt::POST,
            records::qf::ACTIVE_POST_FIFO,
            records::qf::time_evt::DISARM_ATTEMPT,
        ]
    );
}

#[test]
#[should_panic(expected = "contract violation")]
fn arming_a_running_time_event_is_fatal() {
    let (fw, _port) = framework(small_pools());
    let timer = fw.new_time_event(Priority::new(2), TIMEOUT, 0);
    fw.arm(timer, 5, 0);
    fw.arm(timer, 5, 0);
}

#[test]
#[should_panic(expected = "contract violation")]
fn arming_for_zero_ticks_is_fatal() {
    let (fw, _port) = framework(small_pools());
    let timer = fw.new_time_event(Priority::new(2), TIMEOUT, 0);
    fw.arm(timer, 0, 0);
}

#[test]
#[should_panic(expected = "contract violation")]
fn time_event_on_missing_rate_is_fatal() {
    let (fw, _port) = framework(small_pools());
    fw.new_time_event(Priority::new(2), TIMEOUT, 1);
}

#[test]
#[should_panic(expected = "contract violation")]
fn time_event_with_reserved_signal_is_fatal() {
    let (fw, _port) = framework(small_pools());
    fw.new_time_event(Priority::new(2), Signal::EXIT, 0);
}

#[test]
fn ticker_runs_pending_ticks_at_task_level() {
    let (fw, port) = framework(EventPools::builder().pool(4, 2).build().unwrap());
    let ao = recorder(&fw, 1);
    let ticker = Ticker::new(Priority::new(5), 0);
    fw.start_active(ticker.clone(), &Event::EMPTY);

    let timer = fw.new_time_event(Priority::new(1), TIMEOUT, 0);
    fw.arm(timer, 2, 2);

    fw.post(ticker.priority(), EventRef::signal_only(TICK));
    fw.post(ticker.priority(), EventRef::signal_only(TICK));
    fw.post(ticker.priority(), fw.new_event(TICK, &[0]));
    assert_eq!(ticker.pending(), 3);
    assert_eq!(fw.pools().stats(1).used_blocks, 0);
    assert!(signals(&ao).is_empty());

    run_until_idle(&fw, &port);
    assert_eq!(ticker.pending(), 0);
    assert_eq!(ticker.queue_min(), 3);
    assert_eq!(signals(&ao), [TIMEOUT]);
    assert_eq!(fw.current_ctr(timer), 1);
}
