//! One side of the alternation.

use core::fmt;
use std::time::Duration;

use mw_sync::{Acquired, BlockingWait, Deadline, SemaphoreSet};
use serde::Serialize;

use crate::ledger::Ledger;
use crate::rng::IndexSource;
use crate::HarnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Owns the all-AVAILABLE inbox and moves first.
    Initiator,
    /// Owns the all-UNAVAILABLE inbox and waits first.
    Respondent,
}

impl Role {
    /// Ledger slot, also this role's offset in the turn sequence.
    pub const fn slot(self) -> usize {
        match self {
            Self::Initiator => 0,
            Self::Respondent => 1,
        }
    }

    pub const fn peer(self) -> Self {
        match self {
            Self::Initiator => Self::Respondent,
            Self::Respondent => Self::Initiator,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Initiator => "Initiator",
            Self::Respondent => "Respondent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one non-blocking [`Party::poll_round`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A round completed: `claimed` cells taken from the inbox, then outbox
    /// cell `released` signalled.
    Advanced {
        round: u32,
        claimed: usize,
        released: usize,
    },
    /// Nothing in the inbox yet.
    Blocked,
    /// Iteration budget spent.
    Finished,
}

pub struct Party<'a, W: BlockingWait + ?Sized, R: IndexSource> {
    role: Role,
    inbox: SemaphoreSet<'a>,
    outbox: SemaphoreSet<'a>,
    facility: &'a W,
    ledger: &'a Ledger,
    indices: R,
    iterations: u32,
    round: u32,
    verbose: bool,
    timeout: Option<Duration>,
}

impl<'a, W: BlockingWait + ?Sized, R: IndexSource> Party<'a, W, R> {
    pub fn new(
        role: Role,
        inbox: SemaphoreSet<'a>,
        outbox: SemaphoreSet<'a>,
        facility: &'a W,
        ledger: &'a Ledger,
        indices: R,
        iterations: u32,
    ) -> Self {
        Self {
            role,
            inbox,
            outbox,
            facility,
            ledger,
            indices,
            iterations,
            round: 0,
            verbose: false,
            timeout: None,
        }
    }

    /// Print one line per round to stdout.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Bound every acquire by `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> u32 {
        self.round
    }

    pub fn is_finished(&self) -> bool {
        self.round >= self.iterations
    }

    /// Run every remaining round, blocking in acquire as needed. Stops at the
    /// first failure.
    pub fn run(&mut self) -> Result<(), HarnessError> {
        log::debug!("[HARNESS] {} starting {} rounds", self.role, self.iterations);
        while !self.is_finished() {
            let deadline = self.timeout.map(Deadline::after).transpose()?;
            let acquired = self.inbox.acquire_until(self.facility, deadline.as_ref())?;
            self.complete_round(acquired)?;
        }
        log::debug!("[HARNESS] {} finished", self.role);
        Ok(())
    }

    /// Attempt one round without blocking.
    pub fn poll_round(&mut self) -> Result<Step, HarnessError> {
        if self.is_finished() {
            return Ok(Step::Finished);
        }
        let claimed = self.inbox.try_acquire();
        if claimed == 0 {
            return Ok(Step::Blocked);
        }
        let round = self.round;
        let released = self.complete_round(Acquired {
            claimed,
            ..Acquired::default()
        })?;
        Ok(Step::Advanced {
            round,
            claimed,
            released,
        })
    }

    /// Everything after a successful acquire: ledger, progress line, release.
    fn complete_round(&mut self, acquired: Acquired) -> Result<usize, HarnessError> {
        self.ledger.record_acquire(self.role, &acquired);
        self.ledger.take_turn(self.role, self.round)?;

        if self.verbose {
            libsyscall::println!(
                "{:<10} (pid {}) round {}",
                self.role.label(),
                libsyscall::process::getpid(),
                self.round
            );
        }

        let index = self.indices.next_index(self.outbox.len());
        let released = self.outbox.release(self.facility, index)?;
        self.ledger.record_release(self.role, &released);
        log::trace!("[HARNESS] {} round {} -> {} cell {}", self.role, self.round, self.role.peer(), index);

        self.round += 1;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedIndices;
    use mw_sync::facility::ParkWait;
    use mw_sync::{CellState, SemaphoreArena};

    fn ledger() -> Ledger {
        bytemuck::Zeroable::zeroed()
    }

    #[test]
    fn test_zero_iterations_finishes_immediately() {
        let arena = SemaphoreArena::new(&[CellState::Unavailable, CellState::Unavailable], 4).unwrap();
        let park = ParkWait::new();
        let l = ledger();
        let mut party = Party::new(
            Role::Respondent,
            arena.set(1).unwrap(),
            arena.set(0).unwrap(),
            &park,
            &l,
            ScriptedIndices::new(vec![0]),
            0,
        );
        // Inbox is empty, so this would block forever if a round were attempted.
        party.run().unwrap();
        assert_eq!(party.poll_round().unwrap(), Step::Finished);
        assert_eq!(l.turns(), 0);
    }

    #[test]
    fn test_poll_round_blocks_on_empty_inbox() {
        let arena = SemaphoreArena::new(&[CellState::Unavailable, CellState::Unavailable], 4).unwrap();
        let park = ParkWait::new();
        let l = ledger();
        let mut party = Party::new(
            Role::Initiator,
            arena.set(0).unwrap(),
            arena.set(1).unwrap(),
            &park,
            &l,
            ScriptedIndices::new(vec![1]),
            3,
        );
        assert_eq!(party.poll_round().unwrap(), Step::Blocked);
        assert_eq!(party.rounds(), 0);
    }

    #[test]
    fn test_initiator_first_round() {
        let arena = SemaphoreArena::new(&[CellState::Available, CellState::Unavailable], 4).unwrap();
        let park = ParkWait::new();
        let l = ledger();
        let mut party = Party::new(
            Role::Initiator,
            arena.set(0).unwrap(),
            arena.set(1).unwrap(),
            &park,
            &l,
            ScriptedIndices::new(vec![2]),
            1,
        );
        assert_eq!(
            party.poll_round().unwrap(),
            Step::Advanced {
                round: 0,
                claimed: 4,
                released: 2,
            }
        );
        assert!(party.is_finished());
        assert_eq!(arena.set(0).unwrap().available(), 0);
        assert_eq!(arena.set(1).unwrap().cell(2).unwrap().load(), CellState::Available);
    }

    #[test]
    fn test_bounded_run_times_out() {
        let arena = SemaphoreArena::new(&[CellState::Unavailable, CellState::Unavailable], 2).unwrap();
        let park = ParkWait::new();
        let l = ledger();
        let mut party = Party::new(
            Role::Respondent,
            arena.set(1).unwrap(),
            arena.set(0).unwrap(),
            &park,
            &l,
            ScriptedIndices::new(vec![0]),
            1,
        )
        .timeout(Some(Duration::from_millis(20)));
        assert_eq!(party.run(), Err(HarnessError::Timeout));
    }

    #[test]
    fn test_role_helpers() {
        assert_eq!(Role::Initiator.peer(), Role::Respondent);
        assert_eq!(Role::Respondent.slot(), 1);
        assert_eq!(Role::Respondent.to_string(), "Respondent");
    }
}
