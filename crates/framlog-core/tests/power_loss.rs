//! Power loss during append.
//!
//! Every cut point inside one append is replayed: the link dies after N
//! successful transmit/receive calls, the device is power cycled, and a fresh
//! store bootstraps from whatever reached the medium.

use framlog_core::format::{CURSOR_ADDRESS, RING_START};
use framlog_core::{Config, FramError, FramStore, LogRecord, MediumHandle, SimulatedFram, TransportFault};

/// Link operations in one append: 6 verified bytes, 5 calls each
const APPEND_OPS: u64 = 30;

fn committed() -> Vec<LogRecord> {
    (1..=3).map(|code| LogRecord::new(4, 2, code).unwrap()).collect()
}

fn seeded(capacity: u16) -> (FramStore<SimulatedFram>, MediumHandle) {
    let sim = SimulatedFram::new();
    let medium = sim.handle();
    let mut store = FramStore::open(sim, Config::compact(capacity)).unwrap();
    for record in committed() {
        store.append_record(record).unwrap();
    }
    (store, medium)
}

fn reboot(medium: &MediumHandle, capacity: u16) -> FramStore<SimulatedFram> {
    medium.power_cycle();
    FramStore::open(medium.transport(), Config::compact(capacity)).unwrap()
}

#[test]
fn test_every_cut_point_keeps_committed_records() {
    let fresh = LogRecord::new(1, 1, 900).unwrap();

    for cut in 0..=APPEND_OPS {
        let (mut store, medium) = seeded(8);
        let cursor_before = store.write_cursor().unwrap();

        medium.fail_after(cut, TransportFault::Error);
        let result = store.append_record(fresh);
        if cut < APPEND_OPS {
            assert_eq!(result, Err(FramError::TransportError), "cut {}", cut);
        } else {
            assert_eq!(result, Ok(()));
        }
        drop(store);

        let mut store = reboot(&medium, 8);
        let records = store.all_from_oldest().unwrap();
        let count = store.count().unwrap();

        if store.write_cursor().unwrap() == cursor_before {
            // Append did not complete: committed records are still the newest
            assert!(count == 3 || count == 4, "cut {} count {}", cut, count);
            assert_eq!(records[records.len() - 3..], committed()[..], "cut {}", cut);
        } else {
            let mut expected = committed();
            expected.push(fresh);
            assert_eq!(records, expected, "cut {}", cut);
        }
    }
}

#[test]
fn test_cut_before_count_leaves_ring_unchanged() {
    let (mut store, medium) = seeded(8);

    // Payload fully written, count untouched
    medium.fail_after(10, TransportFault::Timeout);
    assert_eq!(store.append(0, 0, 77), Err(FramError::TransportTimeout));
    assert_eq!(store.count().unwrap(), 3);
    drop(store);

    let mut store = reboot(&medium, 8);
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.all_from_oldest().unwrap(), committed());

    // The orphaned payload is simply overwritten by the next append
    store.append(0, 0, 78).unwrap();
    assert_eq!(store.last_record().unwrap(), LogRecord::new(0, 0, 78).unwrap());
}

#[test]
fn test_cut_after_count_keeps_last_record() {
    let (mut store, medium) = seeded(8);

    // Payload and count written, cursor untouched
    medium.fail_after(20, TransportFault::Error);
    assert!(store.append(0, 0, 77).is_err());
    drop(store);

    let mut store = reboot(&medium, 8);
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(store.last_record().unwrap(), committed()[2]);
    assert_eq!(medium.peek_u16(CURSOR_ADDRESS), RING_START + 6);
}

#[test]
fn test_busy_link_then_retry() {
    let (mut store, medium) = seeded(8);

    medium.fail_after(0, TransportFault::Busy);
    assert_eq!(store.append(5, 5, 5), Err(FramError::TransportBusy));

    medium.power_cycle();
    store.append(5, 5, 5).unwrap();
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(store.last_record().unwrap(), LogRecord::new(5, 5, 5).unwrap());
}

#[test]
fn test_stuck_cursor_cell_fails_append_and_next_boot_heals() {
    let (mut store, medium) = seeded(8);
    // Low cursor byte frozen at an odd value
    medium.stick(CURSOR_ADDRESS + 1, 0xC9);

    assert!(matches!(
        store.append(0, 0, 9),
        Err(FramError::WriteFailed { address, .. }) if address == CURSOR_ADDRESS + 1
    ));
    drop(store);

    medium.unstick(CURSOR_ADDRESS + 1);
    medium.poke(CURSOR_ADDRESS + 1, 0xC9);
    let store = reboot(&medium, 8);
    assert_eq!(store.write_cursor().unwrap(), RING_START);
}
