//! TEAM_457: Semaphore sets and the acquire/release protocol.
//!
//! `acquire` scans every cell with `try_claim`; if nothing was available it
//! suspends in the facility's wait-on-many call and rescans on every return.
//! Only a facility error other than retry/interrupt, or an expired deadline,
//! leaves the loop without a claim.

use crate::cell::{CellState, SemaphoreCell};
use crate::deadline::Deadline;
use crate::facility::{BlockingWait, WaitOutcome};
use crate::{SyncError, MAX_SET_SIZE};

/// Result of a successful acquire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Acquired {
    /// Cells claimed by the final scan (at least one).
    pub claimed: usize,
    /// Blocking calls that returned with a wake.
    pub waits: u32,
    /// Wakes after which the rescan found nothing to claim.
    pub spurious: u32,
}

/// Result of a successful release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// The cell flipped to AVAILABLE and a wake was issued.
    Signaled { woken: u32 },
    /// The cell was already AVAILABLE; no wake was issued.
    AlreadyAvailable,
}

/// A fixed-size view of cells that is blocked on as one unit.
#[derive(Debug, Clone, Copy)]
pub struct SemaphoreSet<'a> {
    cells: &'a [SemaphoreCell],
}

impl<'a> SemaphoreSet<'a> {
    /// View `cells` as a set. Accepts 1..=[`MAX_SET_SIZE`] cells.
    pub fn new(cells: &'a [SemaphoreCell]) -> Result<Self, SyncError> {
        if cells.is_empty() || cells.len() > MAX_SET_SIZE {
            return Err(SyncError::InvalidSetSize);
        }
        Ok(Self { cells })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &'a [SemaphoreCell] {
        self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&'a SemaphoreCell> {
        self.cells.get(index)
    }

    /// Number of cells currently AVAILABLE. A snapshot, not a claim.
    pub fn available(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.load() == CellState::Available)
            .count()
    }

    /// One scan pass: claim every available cell. Returns how many were claimed.
    pub fn try_acquire(&self) -> usize {
        let claimed = self.cells.iter().filter(|c| c.try_claim()).count();
        log::trace!("[SYNC] scan claimed {} of {}", claimed, self.cells.len());
        claimed
    }

    /// Block until at least one cell could be claimed.
    pub fn acquire<W: BlockingWait + ?Sized>(&self, facility: &W) -> Result<Acquired, SyncError> {
        self.acquire_until(facility, None)
    }

    /// Like [`acquire`](Self::acquire), failing with [`SyncError::Timeout`]
    /// once `deadline` passes.
    pub fn acquire_until<W: BlockingWait + ?Sized>(
        &self,
        facility: &W,
        deadline: Option<&Deadline>,
    ) -> Result<Acquired, SyncError> {
        let mut stats = Acquired::default();
        let mut after_wake = false;

        loop {
            let claimed = self.try_acquire();
            if claimed > 0 {
                stats.claimed = claimed;
                return Ok(stats);
            }
            if after_wake {
                stats.spurious += 1;
                log::debug!("[SYNC] spurious wake on {:?}", facility.kind());
            }

            match facility.wait_any(self, deadline) {
                Ok(WaitOutcome::Woken) => {
                    stats.waits += 1;
                    after_wake = true;
                }
                Ok(WaitOutcome::ValueChanged | WaitOutcome::Interrupted) => after_wake = false,
                Ok(WaitOutcome::TimedOut) => return Err(SyncError::Timeout),
                Err(e) => {
                    log::error!("[SYNC] {:?} wait failed: {}", facility.kind(), e);
                    return Err(e);
                }
            }
        }
    }

    /// Make cell `index` available and wake a waiter if it flipped.
    pub fn release<W: BlockingWait + ?Sized>(
        &self,
        facility: &W,
        index: usize,
    ) -> Result<Released, SyncError> {
        let cell = self.cell(index).ok_or(SyncError::IndexOutOfRange)?;
        if !cell.try_signal() {
            return Ok(Released::AlreadyAvailable);
        }
        match facility.wake_one(cell) {
            Ok(woken) => Ok(Released::Signaled { woken }),
            Err(e) => {
                log::error!("[SYNC] {:?} wake of cell {} failed: {}", facility.kind(), index, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::FacilityKind;
    use core::sync::atomic::{AtomicU32, Ordering};

    /// Facility that never expects to block and counts wakes.
    struct CountingWait {
        waits: AtomicU32,
        wakes: AtomicU32,
        outcome: Result<WaitOutcome, SyncError>,
    }

    impl CountingWait {
        fn returning(outcome: Result<WaitOutcome, SyncError>) -> Self {
            Self {
                waits: AtomicU32::new(0),
                wakes: AtomicU32::new(0),
                outcome,
            }
        }
    }

    impl BlockingWait for CountingWait {
        fn kind(&self) -> FacilityKind {
            FacilityKind::Park
        }

        fn wait_any(
            &self,
            _set: &SemaphoreSet<'_>,
            _deadline: Option<&Deadline>,
        ) -> Result<WaitOutcome, SyncError> {
            self.waits.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }

        fn wake_one(&self, _cell: &SemaphoreCell) -> Result<u32, SyncError> {
            self.wakes.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    fn cells(n: usize, state: CellState) -> Vec<SemaphoreCell> {
        (0..n).map(|_| SemaphoreCell::new(state)).collect()
    }

    #[test]
    fn test_set_size_bounds() {
        assert_eq!(SemaphoreSet::new(&[]).unwrap_err(), SyncError::InvalidSetSize);
        let too_many = cells(MAX_SET_SIZE + 1, CellState::Unavailable);
        assert_eq!(
            SemaphoreSet::new(&too_many).unwrap_err(),
            SyncError::InvalidSetSize
        );
        let one = cells(1, CellState::Unavailable);
        assert_eq!(SemaphoreSet::new(&one).unwrap().len(), 1);
    }

    #[test]
    fn test_release_then_acquire_does_not_block() {
        let backing = cells(10, CellState::Unavailable);
        let set = SemaphoreSet::new(&backing).unwrap();
        let facility = CountingWait::returning(Err(SyncError::Unsupported));

        assert_eq!(set.release(&facility, 4).unwrap(), Released::Signaled { woken: 1 });
        let acquired = set.acquire(&facility).unwrap();

        assert_eq!(acquired.claimed, 1);
        assert_eq!(acquired.waits, 0);
        assert_eq!(facility.waits.load(Ordering::SeqCst), 0);
        assert_eq!(set.available(), 0);
    }

    #[test]
    fn test_release_on_available_issues_no_wake() {
        let backing = cells(3, CellState::Available);
        let set = SemaphoreSet::new(&backing).unwrap();
        let facility = CountingWait::returning(Ok(WaitOutcome::Woken));

        assert_eq!(set.release(&facility, 1).unwrap(), Released::AlreadyAvailable);
        assert_eq!(facility.wakes.load(Ordering::SeqCst), 0);
        assert_eq!(set.available(), 3);
    }

    #[test]
    fn test_release_index_out_of_range() {
        let backing = cells(2, CellState::Unavailable);
        let set = SemaphoreSet::new(&backing).unwrap();
        let facility = CountingWait::returning(Ok(WaitOutcome::Woken));
        assert_eq!(set.release(&facility, 2).unwrap_err(), SyncError::IndexOutOfRange);
    }

    #[test]
    fn test_acquire_claims_every_available_cell() {
        let backing = cells(10, CellState::Available);
        let set = SemaphoreSet::new(&backing).unwrap();
        let facility = CountingWait::returning(Err(SyncError::Unsupported));

        let acquired = set.acquire(&facility).unwrap();
        assert_eq!(acquired.claimed, 10);
        assert_eq!(set.available(), 0);
    }

    #[test]
    fn test_fatal_wait_error_propagates() {
        let backing = cells(2, CellState::Unavailable);
        let set = SemaphoreSet::new(&backing).unwrap();
        let err = SyncError::Wait(libsyscall::Errno::EINVAL);
        let facility = CountingWait::returning(Err(err));

        assert_eq!(set.acquire(&facility).unwrap_err(), err);
        assert_eq!(facility.waits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_timeout_surfaces_as_error() {
        let backing = cells(2, CellState::Unavailable);
        let set = SemaphoreSet::new(&backing).unwrap();
        let facility = CountingWait::returning(Ok(WaitOutcome::TimedOut));
        assert_eq!(set.acquire(&facility).unwrap_err(), SyncError::Timeout);
    }

    /// Returns a benign outcome a few times, then makes a cell available.
    struct FlakyWait<'a> {
        calls: AtomicU32,
        benign: WaitOutcome,
        target: &'a SemaphoreCell,
    }

    impl BlockingWait for FlakyWait<'_> {
        fn kind(&self) -> FacilityKind {
            FacilityKind::Park
        }

        fn wait_any(
            &self,
            _set: &SemaphoreSet<'_>,
            _deadline: Option<&Deadline>,
        ) -> Result<WaitOutcome, SyncError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 2 {
                self.target.try_signal();
            }
            Ok(self.benign)
        }

        fn wake_one(&self, _cell: &SemaphoreCell) -> Result<u32, SyncError> {
            Ok(0)
        }
    }

    #[test]
    fn test_benign_outcomes_are_retried() {
        for benign in [
            WaitOutcome::Woken,
            WaitOutcome::ValueChanged,
            WaitOutcome::Interrupted,
        ] {
            let backing = cells(4, CellState::Unavailable);
            let set = SemaphoreSet::new(&backing).unwrap();
            let facility = FlakyWait {
                calls: AtomicU32::new(0),
                benign,
                target: &backing[3],
            };

            let acquired = set.acquire(&facility).unwrap();
            assert_eq!(acquired.claimed, 1);
            assert_eq!(facility.calls.load(Ordering::SeqCst), 3);
            if benign == WaitOutcome::Woken {
                assert_eq!(acquired.waits, 3);
                assert_eq!(acquired.spurious, 2);
            } else {
                assert_eq!(acquired.waits, 0);
                assert_eq!(acquired.spurious, 0);
            }
        }
    }
}
