//! TEAM_462: Alternation Harness.
//!
//! Two parties share two [`SemaphoreSet`](mw_sync::SemaphoreSet)s: each
//! acquires from its own inbox and releases a random cell of the peer's.
//! The initiator's inbox starts all-AVAILABLE, the respondent's
//! all-UNAVAILABLE, so the parties must take strict turns. A shared turn
//! counter checks that they do.
//!
//! The initiator runs in the calling context; the respondent runs in a context
//! created by a [`Spawner`]: a forked process or a thread.

pub mod alternation;
pub mod ledger;
pub mod party;
pub mod rng;
pub mod sim;
pub mod spawn;

pub use alternation::{AlternationConfig, AlternationReport};
pub use ledger::{Ledger, PartyStats};
pub use party::{Party, Role, Step};
pub use sim::{Simulation, SimulationOutcome, TraceEvent, TraceKind};
pub use rng::{DetRng, IndexSource, ScriptedIndices};
pub use spawn::{JoinHandle, ProcessHandle, ProcessSpawner, Spawner, ThreadHandle, ThreadSpawner};

use mw_error::define_error;
use mw_sync::{Errno, SyncError};

define_error! {
    /// Harness failures, one kind per way a sub-test can go wrong.
    pub enum HarnessError(0x02) {
        /// The shared semaphore region could not be created
        Allocation(SyncError) = 0x01 => "Shared memory allocation failed",
        /// The second execution context could not be created
        Spawn(Errno) = 0x02 => "Could not spawn peer",
        /// acquire or release failed for a non-benign reason
        Protocol(SyncError) = 0x03 => "Protocol failure",
        AlternationViolated = 0x04 => "Alternation invariant violated",
        Unsupported = 0x05 => "Blocking facility unsupported",
        /// Joining the peer did not observe its success signal
        Communication = 0x06 => "Peer did not report success",
        Timeout = 0x07 => "Peer did not answer before the deadline",
        /// Simulation only: both parties blocked before finishing
        Stalled = 0x08 => "Neither party can make progress",
    }
}

impl From<SyncError> for HarnessError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Map(_) => Self::Allocation(e),
            SyncError::Timeout => Self::Timeout,
            SyncError::Unsupported => Self::Unsupported,
            _ => Self::Protocol(e),
        }
    }
}
