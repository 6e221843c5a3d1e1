//! TEAM_456: Multi-object binary semaphores.
//!
//! A [`SemaphoreSet`] is a small, fixed group of [`SemaphoreCell`]s living in
//! memory that may be shared between processes. `acquire` blocks on the whole
//! set through a [`BlockingWait`] facility and claims whatever became
//! available; `release` flips one cell and wakes a waiter only when the flip
//! actually happened.
//!
//! The facility is selected at startup through [`probe`]: the out-of-tree
//! `FUTEX_WAIT_MULTIPLE`, mainline `futex_waitv`, or an in-process condvar
//! fallback for thread-only use.

pub mod arena;
pub mod cell;
pub mod deadline;
pub mod facility;
pub mod probe;
pub mod set;

pub use arena::{SemaphoreArena, SharedSlice};
pub use cell::{CellState, SemaphoreCell};
pub use deadline::Deadline;
pub use facility::{BlockingWait, FacilityKind, WaitOutcome};
pub use libsyscall::Errno;
pub use probe::Capabilities;
pub use set::{Acquired, Released, SemaphoreSet};

use mw_error::define_error;

/// Cells per set in the alternation protocol.
pub const SET_SIZE: usize = 10;

/// Upper bound on cells watched by one blocking call (kernel `FUTEX_WAITV_MAX`).
pub const MAX_SET_SIZE: usize = 128;

define_error! {
    /// Failures of the semaphore protocol and its kernel plumbing.
    pub enum SyncError(0x01) {
        /// Shared mapping could not be created
        Map(Errno) = 0x01 => "Shared mapping failed",
        /// Blocking wait failed for a reason other than retry or interrupt
        Wait(Errno) = 0x02 => "Blocking wait failed",
        Wake(Errno) = 0x03 => "Wake failed",
        Timeout = 0x04 => "Wait deadline expired",
        Unsupported = 0x05 => "Blocking facility unsupported",
        InvalidSetSize = 0x06 => "Semaphore set size out of range",
        IndexOutOfRange = 0x07 => "Cell index out of range",
        Clock(Errno) = 0x08 => "Monotonic clock read failed",
    }
}
