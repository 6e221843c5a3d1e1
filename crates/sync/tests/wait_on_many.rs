//! Cross-thread acquire/release over every facility the running kernel offers.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mw_sync::facility::{self, FacilityKind};
use mw_sync::{probe, BlockingWait, CellState, Deadline, SemaphoreArena, SyncError};

const ROUNDS: usize = 200;

fn available_facilities() -> Vec<Arc<dyn BlockingWait>> {
    [FacilityKind::WaitMultiple, FacilityKind::Waitv, FacilityKind::Park]
        .into_iter()
        .filter_map(|kind| match facility::select(kind) {
            Ok(f) => Some(f),
            Err(_) => {
                eprintln!("skipping {kind}: not supported here");
                None
            }
        })
        .collect()
}

/// Two threads hand a token back and forth through two sets. Any lost wake
/// hangs the test; the deadline turns that into a failure instead.
fn ping_pong(facility: Arc<dyn BlockingWait>) {
    let arena = Arc::new(
        SemaphoreArena::new(&[CellState::Available, CellState::Unavailable], 10).unwrap(),
    );

    let peer = {
        let arena = Arc::clone(&arena);
        let facility = Arc::clone(&facility);
        thread::spawn(move || -> Result<(), SyncError> {
            let inbox = arena.set(1).unwrap();
            let outbox = arena.set(0).unwrap();
            for round in 0..ROUNDS {
                let deadline = Deadline::after(Duration::from_secs(10))?;
                inbox.acquire_until(facility.as_ref(), Some(&deadline))?;
                outbox.release(facility.as_ref(), (round * 7) % 10)?;
            }
            Ok(())
        })
    };

    let inbox = arena.set(0).unwrap();
    let outbox = arena.set(1).unwrap();
    for round in 0..ROUNDS {
        let deadline = Deadline::after(Duration::from_secs(10)).unwrap();
        inbox
            .acquire_until(facility.as_ref(), Some(&deadline))
            .unwrap_or_else(|e| panic!("{} round {round}: {e}", facility.kind()));
        outbox.release(facility.as_ref(), (round * 3) % 10).unwrap();
    }

    peer.join().unwrap().unwrap();
    // The peer's last release is never consumed.
    assert_eq!(arena.set(0).unwrap().available(), 1);
    assert_eq!(arena.set(1).unwrap().available(), 0);
}

#[test]
fn ping_pong_on_every_supported_facility() {
    let facilities = available_facilities();
    assert!(!facilities.is_empty(), "park facility is always available");
    for facility in facilities {
        ping_pong(facility);
    }
}

#[test]
fn acquire_times_out_without_release() {
    for facility in available_facilities() {
        let arena = SemaphoreArena::new(&[CellState::Unavailable], 4).unwrap();
        let set = arena.set(0).unwrap();
        let deadline = Deadline::after(Duration::from_millis(30)).unwrap();
        assert_eq!(
            set.acquire_until(facility.as_ref(), Some(&deadline)),
            Err(SyncError::Timeout),
            "{}",
            facility.kind()
        );
    }
}

#[test]
fn unsupported_probe_blocks_selection() {
    for kind in [FacilityKind::WaitMultiple, FacilityKind::Waitv] {
        if !probe::probe(kind) {
            assert_eq!(facility::select(kind).err(), Some(SyncError::Unsupported));
        }
    }
}
