//! TEAM_458: Blocking Wait Facility.
//!
//! The acquire/release protocol is written against [`BlockingWait`] only.
//! Variants:
//! - [`WaitMultiple`]: `FUTEX_WAIT_MULTIPLE` (op 31, out-of-tree fsync patch)
//! - [`Waitv`]: `futex_waitv` (mainline, Linux 5.16+)
//! - [`ParkWait`]: in-process mutex/condvar, threads only
//!
//! Both futex variants wake through the classic shared `FUTEX_WAKE`, so a
//! cell in a `MAP_SHARED` mapping can be released from another process.

mod park;
mod wait_multiple;
mod waitv;

use std::fmt;
use std::sync::Arc;

use libsyscall::sync::futex_wake;
use libsyscall::Errno;

use crate::cell::SemaphoreCell;
use crate::deadline::Deadline;
use crate::set::SemaphoreSet;
use crate::probe::{self, Capabilities};
use crate::SyncError;

pub use park::ParkWait;
pub use wait_multiple::WaitMultiple;
pub use waitv::Waitv;

/// How a blocking call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Woken by a waker, or spuriously. The caller rescans.
    Woken,
    /// A watched word was not UNAVAILABLE when the call was made (EAGAIN).
    ValueChanged,
    /// Interrupted by a signal (EINTR).
    Interrupted,
    /// The deadline passed.
    TimedOut,
}

/// The kernel (or in-process) facilities this crate knows how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacilityKind {
    WaitMultiple,
    /// Out-of-tree futex2 patch set, detected through sysfs only.
    Futex2Sysfs,
    Waitv,
    Park,
}

impl FacilityKind {
    /// Name used in console summaries.
    pub const fn label(self) -> &'static str {
        match self {
            Self::WaitMultiple => "FUTEX_WAIT_MULTIPLE",
            Self::Futex2Sysfs => "futex2",
            Self::Waitv => "Mainline (kernel 5.16+) futex2",
            Self::Park => "In-process park",
        }
    }

    /// Whether a cell released in one process can wake a waiter in another.
    pub const fn is_process_shared(self) -> bool {
        matches!(self, Self::WaitMultiple | Self::Waitv)
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A way to suspend until any cell of a set may have become available.
pub trait BlockingWait: Send + Sync {
    fn kind(&self) -> FacilityKind;

    /// Suspend until some cell of `set` may have left UNAVAILABLE.
    ///
    /// Must not return `Woken` without having actually suspended, except for
    /// kernel-level spurious wakes. Errors other than the benign outcomes are
    /// fatal to the caller.
    fn wait_any(
        &self,
        set: &SemaphoreSet<'_>,
        deadline: Option<&Deadline>,
    ) -> Result<WaitOutcome, SyncError>;

    /// Wake at least one waiter blocked on `cell`. Returns the number woken
    /// when the facility can tell.
    fn wake_one(&self, cell: &SemaphoreCell) -> Result<u32, SyncError>;
}

/// Instantiate the facility of `kind`, or `Unsupported` if the startup probe
/// found the running system lacks it.
pub fn select(kind: FacilityKind) -> Result<Arc<dyn BlockingWait>, SyncError> {
    if !probe::capabilities().contains(Capabilities::for_kind(kind)) {
        log::info!("[SYNC] {} not available on this system", kind);
        return Err(SyncError::Unsupported);
    }
    let facility: Arc<dyn BlockingWait> = match kind {
        FacilityKind::WaitMultiple => Arc::new(WaitMultiple),
        FacilityKind::Waitv => Arc::new(Waitv),
        FacilityKind::Park => Arc::new(ParkWait::new()),
        FacilityKind::Futex2Sysfs => return Err(SyncError::Unsupported),
    };
    log::debug!("[SYNC] selected {}", kind);
    Ok(facility)
}

/// Map a futex wait return value onto [`WaitOutcome`].
fn classify_wait(ret: i64) -> Result<WaitOutcome, SyncError> {
    match Errno::result(ret) {
        Ok(_) => Ok(WaitOutcome::Woken),
        Err(e) if e == Errno::EAGAIN => Ok(WaitOutcome::ValueChanged),
        Err(e) if e == Errno::EINTR => Ok(WaitOutcome::Interrupted),
        Err(e) if e == Errno::ETIMEDOUT => Ok(WaitOutcome::TimedOut),
        Err(e) => Err(SyncError::Wait(e)),
    }
}

/// Shared `FUTEX_WAKE` of one waiter on `cell`.
fn futex_wake_cell(cell: &SemaphoreCell) -> Result<u32, SyncError> {
    Errno::result(futex_wake(cell.addr(), 1))
        .map(|woken| woken as u32)
        .map_err(SyncError::Wake)
}
