//! TEAM_458: futex_waitv (Linux 5.16+).

use libsyscall::sync::{futex_ops::FUTEX2_SIZE_U32, futex_waitv, FutexWaitv};
use libsyscall::time::CLOCK_MONOTONIC;

use super::{classify_wait, futex_wake_cell, BlockingWait, FacilityKind, WaitOutcome};
use crate::cell::{SemaphoreCell, UNAVAILABLE};
use crate::deadline::Deadline;
use crate::set::SemaphoreSet;
use crate::{SyncError, MAX_SET_SIZE};

/// Wait-on-many through the mainline vectorized `futex_waitv` call.
///
/// Waiters are registered without `FUTEX2_PRIVATE` so that wakes from another
/// process sharing the mapping are delivered.
#[derive(Debug, Default, Clone, Copy)]
pub struct Waitv;

impl BlockingWait for Waitv {
    fn kind(&self) -> FacilityKind {
        FacilityKind::Waitv
    }

    fn wait_any(
        &self,
        set: &SemaphoreSet<'_>,
        deadline: Option<&Deadline>,
    ) -> Result<WaitOutcome, SyncError> {
        let mut waiters = [FutexWaitv::default(); MAX_SET_SIZE];
        for (waiter, cell) in waiters.iter_mut().zip(set.cells()) {
            *waiter = FutexWaitv {
                val: u64::from(UNAVAILABLE),
                uaddr: cell.addr() as u64,
                flags: FUTEX2_SIZE_U32,
                reserved: 0,
            };
        }

        log::debug!("[SYNC] futex_waitv on {} cells", set.len());
        classify_wait(futex_waitv(
            &waiters[..set.len()],
            deadline.map(Deadline::as_timespec),
            CLOCK_MONOTONIC,
        ))
    }

    fn wake_one(&self, cell: &SemaphoreCell) -> Result<u32, SyncError> {
        futex_wake_cell(cell)
    }
}
