//! Binary semaphore cell: one futex word, AVAILABLE or UNAVAILABLE.

use core::sync::atomic::{AtomicU32, Ordering};

/// Raw word value of an unavailable cell. A zero-filled mapping is all
/// UNAVAILABLE.
pub const UNAVAILABLE: u32 = 0;
/// Raw word value of an available cell.
pub const AVAILABLE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Unavailable,
    Available,
}

impl CellState {
    const fn raw(self) -> u32 {
        match self {
            Self::Unavailable => UNAVAILABLE,
            Self::Available => AVAILABLE,
        }
    }
}

/// A single binary semaphore.
///
/// After construction the word only moves through [`try_claim`](Self::try_claim)
/// (1 → 0) and [`try_signal`](Self::try_signal) (0 → 1).
#[repr(transparent)]
#[derive(Debug)]
pub struct SemaphoreCell {
    state: AtomicU32,
}

// SAFETY: an all-zero AtomicU32 is a valid UNAVAILABLE cell.
unsafe impl bytemuck::Zeroable for SemaphoreCell {}

impl SemaphoreCell {
    #[must_use]
    pub const fn new(state: CellState) -> Self {
        Self {
            state: AtomicU32::new(state.raw()),
        }
    }

    /// Claim the cell if it is available. Never blocks, no effect on failure.
    #[inline]
    pub fn try_claim(&self) -> bool {
        self.state
            .compare_exchange(AVAILABLE, UNAVAILABLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Make the cell available. Returns true when the state actually flipped,
    /// i.e. when a wake is warranted.
    #[inline]
    pub fn try_signal(&self) -> bool {
        self.state
            .compare_exchange(UNAVAILABLE, AVAILABLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Snapshot of the current state. Read-only.
    #[inline]
    pub fn load(&self) -> CellState {
        if self.state.load(Ordering::Acquire) == AVAILABLE {
            CellState::Available
        } else {
            CellState::Unavailable
        }
    }

    /// Address of the futex word, as handed to the kernel.
    #[inline]
    pub fn addr(&self) -> *const u32 {
        &self.state as *const AtomicU32 as *const u32
    }
}
