//! Process management
//! TEAM_275: Refactored to use arch::syscallN
//! TEAM_454: fork-style clone, wait4 status decoding, exit_group

use crate::arch;
use crate::sysno::{__NR_clone, __NR_exit_group, __NR_getpid, __NR_wait4};

use linux_raw_sys::general::SIGCHLD;

/// Exit every thread of the process without running any userspace teardown.
///
/// Used by forked children so that buffered std output and atexit handlers
/// inherited from the parent never run twice.
#[inline]
pub fn exit_group(code: i32) -> ! {
    arch::syscall_exit(__NR_exit_group as u64, code as u64)
}

/// Get current process ID.
#[inline]
pub fn getpid() -> i64 {
    arch::syscall0(__NR_getpid as u64)
}

/// Create a child process sharing nothing but inherited mappings (fork).
///
/// # Returns
/// * `0` in the child
/// * child PID in the parent
/// * `-errno` on failure
///
/// The child starts with a single thread. It must not take locks that another
/// parent thread could have held at the moment of the call.
#[inline]
pub fn fork() -> i64 {
    // Argument order differs between architectures after `flags`, but every
    // remaining argument is zero here.
    arch::syscall5(__NR_clone as u64, u64::from(SIGCHLD), 0, 0, 0, 0)
}

/// TEAM_188: Wait for a child process to change state.
///
/// # Returns
/// PID of the reaped child, or `-errno`.
#[inline]
pub fn wait4(pid: i32, status: &mut i32, options: u32) -> i64 {
    arch::syscall4(
        __NR_wait4 as u64,
        pid as u64,
        status as *mut i32 as u64,
        u64::from(options),
        0,
    )
}

/// Exit code of a child that terminated normally, `None` if it was killed.
#[must_use]
pub const fn exit_status(status: i32) -> Option<i32> {
    if status & 0x7f == 0 {
        Some((status >> 8) & 0xff)
    } else {
        None
    }
}

/// Signal that terminated a child, `None` if it exited normally.
#[must_use]
pub const fn term_signal(status: i32) -> Option<i32> {
    let sig = status & 0x7f;
    if sig != 0 && sig != 0x7f {
        Some(sig)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decoding() {
        assert_eq!(exit_status(0), Some(0));
        assert_eq!(exit_status(1 << 8), Some(1));
        assert_eq!(term_signal(1 << 8), None);
        // SIGKILL, no core dump
        assert_eq!(exit_status(9), None);
        assert_eq!(term_signal(9), Some(9));
    }

    #[test]
    fn test_getpid_is_positive() {
        assert!(getpid() > 0);
    }
}
