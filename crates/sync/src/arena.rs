//! TEAM_461: Shared-memory arena for semaphore sets.
//!
//! One `MAP_SHARED | MAP_ANONYMOUS` mapping holds every cell; sets are
//! index-addressed windows into it. A child created by fork inherits the
//! mapping, so a release in one process is visible to an acquire in the other
//! without any copying.

use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;

use bytemuck::Zeroable;
use libsyscall::errno::ENOMEM;
use libsyscall::mm::{self, MAP_ANONYMOUS, MAP_SHARED, PROT_READ, PROT_WRITE};
use libsyscall::Errno;

use crate::cell::{CellState, SemaphoreCell};
use crate::set::SemaphoreSet;
use crate::{SyncError, MAX_SET_SIZE};

/// A slice of `T` in a process-shared anonymous mapping.
///
/// Fresh anonymous pages are zero-filled, hence the `Zeroable` bound. Elements
/// are never dropped; the mapping is simply unmapped.
pub struct SharedSlice<T> {
    ptr: NonNull<T>,
    len: usize,
    map_len: usize,
    _marker: PhantomData<T>,
}

// SAFETY: the slice only hands out `&T`; sharing it across threads is sound
// exactly when `T: Sync`.
unsafe impl<T: Sync> Send for SharedSlice<T> {}
// SAFETY: as above.
unsafe impl<T: Sync> Sync for SharedSlice<T> {}

impl<T: Zeroable + Sync> SharedSlice<T> {
    /// Map `len` zeroed elements.
    pub fn zeroed(len: usize) -> Result<Self, SyncError> {
        let bytes = core::mem::size_of::<T>()
            .checked_mul(len.max(1))
            .ok_or(SyncError::Map(Errno::from_raw(ENOMEM)))?;
        let map_len = mm::page_align(bytes);

        let ret = mm::mmap(
            0,
            map_len,
            PROT_READ | PROT_WRITE,
            MAP_SHARED | MAP_ANONYMOUS,
            -1,
            0,
        );
        let addr = Errno::result(ret).map_err(|e| {
            log::error!("[ARENA] mmap of {} bytes failed: {}", map_len, e);
            SyncError::Map(e)
        })?;
        let ptr = NonNull::new(addr as *mut T).ok_or(SyncError::Map(Errno::from_raw(ENOMEM)))?;

        log::trace!("[ARENA] mapped {} bytes at {:#x}", map_len, addr);
        Ok(Self {
            ptr,
            len,
            map_len,
            _marker: PhantomData,
        })
    }
}

impl<T> Deref for SharedSlice<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: ptr is page-aligned, covers len elements, and every element
        // was zero-initialised by the kernel, which is valid for `T: Zeroable`.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Drop for SharedSlice<T> {
    fn drop(&mut self) {
        let ret = mm::munmap(self.ptr.as_ptr() as usize, self.map_len);
        if let Err(e) = Errno::result(ret) {
            log::warn!("[ARENA] munmap failed: {}", e);
        }
    }
}

/// Several equally sized semaphore sets in one shared mapping.
pub struct SemaphoreArena {
    cells: SharedSlice<SemaphoreCell>,
    set_size: usize,
}

impl SemaphoreArena {
    /// One set per entry of `seeds`, each of `set_size` cells seeded uniformly.
    pub fn new(seeds: &[CellState], set_size: usize) -> Result<Self, SyncError> {
        if set_size == 0 || set_size > MAX_SET_SIZE || seeds.is_empty() {
            return Err(SyncError::InvalidSetSize);
        }
        let cells = SharedSlice::<SemaphoreCell>::zeroed(seeds.len() * set_size)?;

        // Mapping is zero-filled (UNAVAILABLE). Nothing else can see the cells
        // yet, so the 0 -> 1 transition is the only write needed.
        for (chunk, seed) in cells.chunks(set_size).zip(seeds) {
            if *seed == CellState::Available {
                chunk.iter().for_each(|cell| {
                    cell.try_signal();
                });
            }
        }

        Ok(Self { cells, set_size })
    }

    pub fn sets(&self) -> usize {
        self.cells.len() / self.set_size
    }

    pub fn set_size(&self) -> usize {
        self.set_size
    }

    /// Set `index`, or `None` past the end.
    pub fn set(&self, index: usize) -> Option<SemaphoreSet<'_>> {
        let start = index.checked_mul(self.set_size)?;
        let end = start.checked_add(self.set_size)?;
        let cells = self.cells.get(start..end)?;
        SemaphoreSet::new(cells).ok()
    }

    /// Current state of every cell, set by set.
    pub fn snapshot(&self) -> Vec<CellState> {
        self.cells.iter().map(SemaphoreCell::load).collect()
    }
}
