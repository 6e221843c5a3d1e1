//! TEAM_459: In-process fallback facility for thread-based parties.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::{BlockingWait, FacilityKind, WaitOutcome};
use crate::cell::{CellState, SemaphoreCell};
use crate::deadline::Deadline;
use crate::set::SemaphoreSet;
use crate::SyncError;

/// Mutex/condvar wait-on-many.
///
/// The availability check in `wait_any` and the notify in `wake_one` both
/// happen under the same lock, so a release between check and sleep cannot be
/// lost. Every wake notifies all sleepers because one instance serves every
/// set; sleepers on other sets just rescan and come back.
///
/// Only valid when both parties are threads of one process.
#[derive(Debug, Default)]
pub struct ParkWait {
    lock: Mutex<()>,
    cond: Condvar,
}

impl ParkWait {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlockingWait for ParkWait {
    fn kind(&self) -> FacilityKind {
        FacilityKind::Park
    }

    fn wait_any(
        &self,
        set: &SemaphoreSet<'_>,
        deadline: Option<&Deadline>,
    ) -> Result<WaitOutcome, SyncError> {
        let guard = self.guard();
        if set.cells().iter().any(|c| c.load() == CellState::Available) {
            return Ok(WaitOutcome::ValueChanged);
        }

        match deadline {
            None => {
                drop(self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner));
                Ok(WaitOutcome::Woken)
            }
            Some(deadline) => {
                let Some(left) = deadline.remaining_duration()? else {
                    return Ok(WaitOutcome::TimedOut);
                };
                let (_guard, result) = self
                    .cond
                    .wait_timeout(guard, left)
                    .unwrap_or_else(PoisonError::into_inner);
                if result.timed_out() {
                    Ok(WaitOutcome::TimedOut)
                } else {
                    Ok(WaitOutcome::Woken)
                }
            }
        }
    }

    /// Always reports 0 woken: a condvar does not say who was waiting.
    fn wake_one(&self, _cell: &SemaphoreCell) -> Result<u32, SyncError> {
        let _guard = self.guard();
        self.cond.notify_all();
        Ok(0)
    }
}
