//! Synchronization (Futex)
//! TEAM_208: FUTEX_WAKE
//! TEAM_453: Multi-address waits: FUTEX_WAIT_MULTIPLE (op 31) and futex_waitv

use crate::arch;
use crate::sysno::{__NR_futex, __NR_futex_waitv};
use crate::time::Timespec;

/// Futex operations
pub mod futex_ops {
    pub use linux_raw_sys::general::FUTEX_WAKE;

    /// Out-of-tree wait-on-many operation (fsync patch set). Mainline kernels
    /// reject it with ENOSYS.
    pub const FUTEX_WAIT_MULTIPLE: u32 = 31;

    /// Bitset that matches every waker.
    pub const FUTEX_BITSET_MATCH_ANY: u32 = 0xffff_ffff;

    /// futex_waitv per-waiter flag: the watched word is 32 bits wide.
    pub const FUTEX2_SIZE_U32: u32 = 0x02;
}

/// One entry of a FUTEX_WAIT_MULTIPLE request.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FutexWaitBlock {
    pub uaddr: *const u32,
    pub val: u32,
    pub bitset: u32,
}

impl FutexWaitBlock {
    pub const EMPTY: Self = Self {
        uaddr: core::ptr::null(),
        val: 0,
        bitset: futex_ops::FUTEX_BITSET_MATCH_ANY,
    };
}

/// One entry of a futex_waitv request (Linux 5.16+ layout).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FutexWaitv {
    pub val: u64,
    pub uaddr: u64,
    pub flags: u32,
    pub reserved: u32,
}

/// Wake up to `count` waiters blocked on `addr` (shared futex).
///
/// # Returns
/// Number of waiters woken, or `-errno`.
#[inline]
pub fn futex_wake(addr: *const u32, count: u32) -> i64 {
    arch::syscall6(
        __NR_futex as u64,
        addr as u64,
        u64::from(futex_ops::FUTEX_WAKE),
        u64::from(count),
        0,
        0,
        0,
    )
}

/// Block until any word in `blocks` may differ from its expected value.
///
/// `timeout` is relative, as for FUTEX_WAIT.
///
/// # Returns
/// * index of the woken entry on success
/// * `-EAGAIN` if a word already differed when the call was made
/// * `-ETIMEDOUT`, `-EINTR`, or `-ENOSYS` on kernels without the patch set
#[inline]
pub fn futex_wait_multiple(blocks: &[FutexWaitBlock], timeout: Option<&Timespec>) -> i64 {
    arch::syscall6(
        __NR_futex as u64,
        blocks.as_ptr() as u64,
        u64::from(futex_ops::FUTEX_WAIT_MULTIPLE),
        blocks.len() as u64,
        timeout.map_or(0, |ts| ts as *const Timespec as u64),
        0,
        0,
    )
}

/// Block until any word in `waiters` may differ from its expected value.
///
/// `timeout` is absolute on `clockid`; the clock is ignored when there is no
/// timeout.
///
/// # Returns
/// Same convention as [`futex_wait_multiple`].
#[inline]
pub fn futex_waitv(waiters: &[FutexWaitv], timeout: Option<&Timespec>, clockid: u32) -> i64 {
    arch::syscall5(
        __NR_futex_waitv as u64,
        waiters.as_ptr() as u64,
        waiters.len() as u64,
        0,
        timeout.map_or(0, |ts| ts as *const Timespec as u64),
        u64::from(clockid),
    )
}
