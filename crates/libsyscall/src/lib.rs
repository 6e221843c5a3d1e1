//! Userspace Syscall Library for `multiwait`
//!
//! `TEAM_118`: Extracted from shell to provide a single source of truth for syscall ABI.
//! `TEAM_251`: Refactored into modules.
//! `TEAM_451`: Trimmed to the calls the futex alternation needs. No libc, no
//! locks, no allocation: every function is safe to call between `fork` and
//! `exit_group` in the child.
//!
//! ## Usage
//! ```rust,no_run
//! use libsyscall::{errno::Errno, sync::futex_wake};
//!
//! let word = 1u32;
//! let woken = Errno::result(futex_wake(&word, 1));
//! ```

#![no_std]

// TEAM_275: Architecture-specific syscall primitives
mod arch;

pub mod errno;
pub mod io;
pub mod mm;
pub mod process;
pub mod sync;
pub mod sys;
pub mod sysno;
pub mod time;

pub use errno::Errno;

// ============================================================================
// Print Macros
// ============================================================================

/// Print to stdout without newline.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut writer = $crate::Stdout;
        let _ = write!(writer, $($arg)*);
    }};
}

/// Print to stdout with newline.
#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::print!("{}\n", format_args!($($arg)*))
    };
}

/// Stdout writer for print! macro.
pub struct Stdout;

impl core::fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        io::write_all(io::STDOUT, s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}

/// Stderr writer, used by the logger.
pub struct Stderr;

impl core::fmt::Write for Stderr {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        io::write_all(io::STDERR, s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}
