//! Pool registry behavior seen from outside the crate.

use rtk_core::{Event, Signal};
use rtk_mem::{EventPools, EventRef};
use rtk_trace::{records, RecordLog};

const DATA: Signal = Signal::user(0);

#[test]
fn retained_event_survives_first_release() {
    let pools = EventPools::builder().pool(8, 2).build().unwrap();

    let original = pools.allocate(DATA, &42u32.to_le_bytes());
    let copy = pools.retain(&original);
    assert_eq!(pools.ref_count(&copy), Some(2));

    pools.release(original);
    assert_eq!(pools.ref_count(&copy), Some(1));
    {
        let guard = pools.read(&copy);
        assert_eq!(guard.signal(), DATA);
        assert_eq!(guard.event().payload(), &42u32.to_le_bytes());
    }

    pools.release(copy);
    assert!(pools.stats(1).is_idle());
}

#[test]
fn retain_from_view_counts_the_backing_block() {
    let pools = EventPools::builder().pool(8, 1).build().unwrap();
    let event = pools.allocate(DATA, &[7]);

    let kept = {
        let guard = pools.read(&event);
        pools.retain_event(&guard.event())
    };
    assert_eq!(kept.block(), event.block());
    assert_eq!(pools.ref_count(&kept), Some(2));

    pools.release(event);
    pools.release(kept);
    assert_eq!(pools.stats(1).free_blocks, 1);
}

#[test]
fn static_views_round_trip_without_pools() {
    let pools = EventPools::empty();
    static PAYLOAD: [u8; 2] = [1, 2];

    let kept = pools.retain_event(&Event::with_static_payload(DATA, &PAYLOAD));
    assert!(kept.is_static());
    assert_eq!(pools.read(&kept).event().payload(), &PAYLOAD);
    assert_eq!(pools.max_block_size(), 0);
    pools.release(kept);
}

#[test]
fn low_water_mark_survives_releases() {
    let pools = EventPools::builder().pool(4, 3).pool(32, 1).build().unwrap();

    let held: Vec<EventRef> = (0..3).map(|_| pools.allocate(DATA, &[])).collect();
    assert!(pools.stats(1).is_exhausted());
    held.into_iter().for_each(|event| pools.release(event));

    assert_eq!(pools.pool_min(1), 0);
    assert_eq!(pools.pool_min(2), 1);
    assert_eq!(pools.stats(1).free_blocks, 3);
    assert_eq!(pools.pool_count(), 2);
    assert_eq!(pools.block_size(2), 32);
    assert_eq!(pools.max_block_size(), 32);
}

#[test]
fn allocation_lifecycle_is_traced() {
    let log = RecordLog::new();
    let pools = EventPools::builder()
        .pool(4, 1)
        .trace_hook(log.hook())
        .build()
        .unwrap();

    let event = pools.allocate(DATA, &[]);
    let copy = pools.retain(&event);
    assert!(pools.try_allocate(DATA, &[], 0).is_none());
    pools.release(copy);
    pools.release(event);

    assert_eq!(
        log.ids(),
        vec![
            records::qf::MPOOL_GET,
            records::qf::NEW,
            records::qf::NEW_REF,
            records::qf::MPOOL_GET_ATTEMPT,
            records::qf::DELETE_REF,
            records::qf::GC,
            records::qf::MPOOL_PUT,
        ]
    );
}
