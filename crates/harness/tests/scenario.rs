//! Scripted end-to-end alternation replayed on one thread.

use mw_harness::sim::{Simulation, TraceKind};
use mw_harness::{HarnessError, Role};
use mw_sync::CellState;

const SET: usize = 10;

#[test]
fn five_scripted_rounds() {
    let outcome = Simulation::new(5)
        .scripts(vec![2, 4, 6, 8, 0], vec![3, 7, 1, 9, 0])
        .run()
        .unwrap();

    assert_eq!(outcome.turns, 10);
    assert_eq!(outcome.trace.len(), 20);

    // Strict lock-step: I0 R0 I1 R1 ...
    let acquires: Vec<(Role, u32, usize)> = outcome
        .trace
        .iter()
        .filter_map(|e| match e.kind {
            TraceKind::Acquire { claimed } => Some((e.role, e.round, claimed)),
            TraceKind::Release { .. } => None,
        })
        .collect();
    let mut expected = Vec::new();
    for round in 0..5 {
        // First initiator round drains all ten seeded cells; afterwards
        // exactly one cell arrives per round.
        expected.push((Role::Initiator, round, if round == 0 { SET } else { 1 }));
        expected.push((Role::Respondent, round, 1));
    }
    assert_eq!(acquires, expected);

    let releases: Vec<usize> = outcome
        .trace
        .iter()
        .filter_map(|e| match e.kind {
            TraceKind::Release { index } => Some(index),
            TraceKind::Acquire { .. } => None,
        })
        .collect();
    assert_eq!(releases, vec![2, 3, 4, 7, 6, 1, 8, 9, 0, 0]);

    // The respondent's final release has no initiator round left to consume
    // it, so exactly one cell of the initiator's inbox is left over.
    let set0 = outcome.set_state(0, SET);
    assert_eq!(set0[0], CellState::Available);
    assert!(set0[1..].iter().all(|s| *s == CellState::Unavailable));
    assert!(outcome
        .set_state(1, SET)
        .iter()
        .all(|s| *s == CellState::Unavailable));

    assert_eq!(outcome.initiator.claimed, 14);
    assert_eq!(outcome.respondent.claimed, 5);
}

#[test]
fn duplicate_release_is_absorbed() {
    // Every release targets cell 0, which is always consumed before the next
    // one arrives, so nothing stalls.
    let outcome = Simulation::new(20).set_size(3).run().unwrap();
    assert_eq!(outcome.turns, 40);
    assert_eq!(outcome.initiator.wakes, 20);
}

#[test]
fn script_indices_wrap_into_the_set() {
    let outcome = Simulation::new(2)
        .set_size(2)
        .scripts(vec![5], vec![3])
        .run()
        .unwrap();
    assert_eq!(outcome.turns, 4);
    assert!(outcome.trace.iter().all(|e| match e.kind {
        TraceKind::Release { index } => index == 1,
        TraceKind::Acquire { .. } => true,
    }));
}

#[test]
fn empty_inboxes_stall() {
    let err = Simulation::new(1)
        .seeds([CellState::Unavailable, CellState::Unavailable])
        .run()
        .unwrap_err();
    assert_eq!(err, HarnessError::Stalled);
}

#[test]
fn invalid_set_size_is_rejected() {
    let err = Simulation::new(1).set_size(0).run().unwrap_err();
    assert!(matches!(err, HarnessError::Protocol(_)));
}
