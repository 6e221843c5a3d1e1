//! Memory management
//! TEAM_275: Refactored to use arch::syscallN

use crate::arch;
use crate::sysno::{__NR_mmap, __NR_munmap};

// TEAM_228: mmap protection flags
pub const PROT_READ: u32 = 1;
pub const PROT_WRITE: u32 = 2;

// TEAM_228: mmap flags
pub const MAP_SHARED: u32 = 0x01;
pub const MAP_ANONYMOUS: u32 = 0x20;

/// Page size assumed when sizing mappings. The kernel rounds up anyway.
pub const PAGE_SIZE: usize = 4096;

/// TEAM_228: Map memory into process address space.
///
/// # Returns
/// * Virtual address of mapping on success
/// * `-ENOMEM`, `-EINVAL` on failure
#[inline]
pub fn mmap(addr: usize, len: usize, prot: u32, flags: u32, fd: i32, offset: usize) -> i64 {
    arch::syscall6(
        __NR_mmap as u64,
        addr as u64,
        len as u64,
        u64::from(prot),
        u64::from(flags),
        fd as u64,
        offset as u64,
    )
}

/// TEAM_228: Unmap memory from process address space.
#[inline]
pub fn munmap(addr: usize, len: usize) -> i64 {
    arch::syscall2(__NR_munmap as u64, addr as u64, len as u64)
}

/// Round `len` up to a whole number of pages.
#[must_use]
pub const fn page_align(len: usize) -> usize {
    (len + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}
