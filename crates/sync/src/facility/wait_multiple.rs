//! TEAM_458: FUTEX_WAIT_MULTIPLE (op 31).

use libsyscall::sync::{futex_ops::FUTEX_BITSET_MATCH_ANY, futex_wait_multiple, FutexWaitBlock};

use super::{classify_wait, futex_wake_cell, BlockingWait, FacilityKind, WaitOutcome};
use crate::cell::{SemaphoreCell, UNAVAILABLE};
use crate::deadline::Deadline;
use crate::set::SemaphoreSet;
use crate::{SyncError, MAX_SET_SIZE};

/// Wait-on-many through the out-of-tree `FUTEX_WAIT_MULTIPLE` operation.
///
/// The timeout argument of this op is relative, so a deadline is converted to
/// the time left right before each call.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaitMultiple;

impl BlockingWait for WaitMultiple {
    fn kind(&self) -> FacilityKind {
        FacilityKind::WaitMultiple
    }

    fn wait_any(
        &self,
        set: &SemaphoreSet<'_>,
        deadline: Option<&Deadline>,
    ) -> Result<WaitOutcome, SyncError> {
        let mut blocks = [FutexWaitBlock::EMPTY; MAX_SET_SIZE];
        for (block, cell) in blocks.iter_mut().zip(set.cells()) {
            *block = FutexWaitBlock {
                uaddr: cell.addr(),
                val: UNAVAILABLE,
                bitset: FUTEX_BITSET_MATCH_ANY,
            };
        }

        let timeout = match deadline {
            None => None,
            Some(deadline) => match deadline.remaining()? {
                Some(left) => Some(left),
                None => return Ok(WaitOutcome::TimedOut),
            },
        };

        log::debug!("[SYNC] FUTEX_WAIT_MULTIPLE on {} cells", set.len());
        classify_wait(futex_wait_multiple(&blocks[..set.len()], timeout.as_ref()))
    }

    fn wake_one(&self, cell: &SemaphoreCell) -> Result<u32, SyncError> {
        futex_wake_cell(cell)
    }
}
