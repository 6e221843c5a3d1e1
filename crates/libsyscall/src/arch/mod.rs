//! TEAM_275: Architecture-specific syscall primitives
//!
//! This module provides low-level syscall invocation for each supported architecture.
//! All other modules use `arch::syscallN()` instead of inline assembly directly.

#[cfg(target_arch = "aarch64")]
mod aarch64;
#[cfg(target_arch = "aarch64")]
pub use aarch64::*;

#[cfg(target_arch = "x86_64")]
mod x86_64;
#[cfg(target_arch = "x86_64")]
pub use x86_64::*;

#[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
compile_error!("libsyscall supports only x86_64 and aarch64 Linux");
