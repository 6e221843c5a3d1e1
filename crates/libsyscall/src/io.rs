//! Core I/O
//! TEAM_275: Refactored to use arch::syscallN

use crate::arch;
use crate::errno::{Errno, EINTR};
use crate::sysno::__NR_write;

pub const STDOUT: usize = 1;
pub const STDERR: usize = 2;

/// Write to a file descriptor.
#[inline]
pub fn write(fd: usize, buf: &[u8]) -> i64 {
    arch::syscall3(
        __NR_write as u64,
        fd as u64,
        buf.as_ptr() as u64,
        buf.len() as u64,
    )
}

/// Write the whole buffer, retrying short writes and EINTR.
pub fn write_all(fd: usize, mut buf: &[u8]) -> Result<(), Errno> {
    while !buf.is_empty() {
        match Errno::result(write(fd, buf)) {
            Ok(0) => return Err(Errno::from_raw(crate::errno::EIO)),
            Ok(n) => buf = &buf[n as usize..],
            Err(e) if e.raw() == EINTR => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
