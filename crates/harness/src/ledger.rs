//! Shared bookkeeping for one alternation run.
//!
//! Lives in the same shared mapping discipline as the semaphores, so a forked
//! respondent's counters are readable by the initiator after join.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use mw_sync::{Acquired, Released};
use serde::Serialize;

use crate::party::Role;
use crate::HarnessError;

#[repr(C)]
#[derive(Debug)]
struct PartyCounters {
    acquires: AtomicU32,
    releases: AtomicU32,
    claimed: AtomicU32,
    waits: AtomicU32,
    spurious: AtomicU32,
    wakes: AtomicU32,
}

/// Plain copy of one party's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartyStats {
    /// Successful acquires (one per round).
    pub acquires: u32,
    /// Successful releases (one per round).
    pub releases: u32,
    /// Cells claimed across all acquires.
    pub claimed: u32,
    /// Blocking calls that returned with a wake.
    pub waits: u32,
    pub spurious: u32,
    /// Releases that flipped a cell and issued a wake.
    pub wakes: u32,
}

#[repr(C)]
#[derive(Debug)]
pub struct Ledger {
    turn: AtomicU64,
    parties: [PartyCounters; 2],
}

// SAFETY: every field is an atomic integer, for which all-zero is valid.
unsafe impl bytemuck::Zeroable for Ledger {}

impl Ledger {
    fn counters(&self, role: Role) -> &PartyCounters {
        &self.parties[role.slot()]
    }

    /// Claim the shared turn for `role` in `round`.
    ///
    /// Turns go initiator 0, respondent 0, initiator 1, ... so the previous
    /// value must be `2 * round + slot`.
    pub fn take_turn(&self, role: Role, round: u32) -> Result<(), HarnessError> {
        let seen = self.turn.fetch_add(1, Ordering::SeqCst);
        let expected = 2 * u64::from(round) + role.slot() as u64;
        if seen == expected {
            Ok(())
        } else {
            log::error!(
                "[HARNESS] {} took turn {} in round {}, expected turn {}",
                role,
                seen,
                round,
                expected
            );
            Err(HarnessError::AlternationViolated)
        }
    }

    pub fn turns(&self) -> u64 {
        self.turn.load(Ordering::SeqCst)
    }

    pub fn record_acquire(&self, role: Role, acquired: &Acquired) {
        let c = self.counters(role);
        c.acquires.fetch_add(1, Ordering::Relaxed);
        c.claimed
            .fetch_add(u32::try_from(acquired.claimed).unwrap_or(u32::MAX), Ordering::Relaxed);
        c.waits.fetch_add(acquired.waits, Ordering::Relaxed);
        c.spurious.fetch_add(acquired.spurious, Ordering::Relaxed);
    }

    pub fn record_release(&self, role: Role, released: &Released) {
        let c = self.counters(role);
        c.releases.fetch_add(1, Ordering::Relaxed);
        if let Released::Signaled { .. } = released {
            c.wakes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self, role: Role) -> PartyStats {
        let c = self.counters(role);
        PartyStats {
            acquires: c.acquires.load(Ordering::SeqCst),
            releases: c.releases.load(Ordering::SeqCst),
            claimed: c.claimed.load(Ordering::SeqCst),
            waits: c.waits.load(Ordering::SeqCst),
            spurious: c.spurious.load(Ordering::SeqCst),
            wakes: c.wakes.load(Ordering::SeqCst),
        }
    }
}
