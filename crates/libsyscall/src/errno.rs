// TEAM_310: Deep integration of linux-raw-sys definitions
// TEAM_452: Typed errno wrapper for the futex and process paths

use core::fmt;

/// Linux errno constants, re-exported from linux-raw-sys.
///
/// Every wrapper in this crate returns the raw kernel convention: a
/// non-negative value on success, `-errno` on failure. [`Errno::result`]
/// converts that convention into a `Result`.
pub use linux_raw_sys::errno::*;

/// Largest errno the kernel encodes in a syscall return value.
const MAX_ERRNO: i64 = 4095;

/// A kernel error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(u32);

impl Errno {
    pub const EAGAIN: Self = Self(EAGAIN);
    pub const EINTR: Self = Self(EINTR);
    pub const EINVAL: Self = Self(EINVAL);
    pub const ENOSYS: Self = Self(ENOSYS);
    pub const ETIMEDOUT: Self = Self(ETIMEDOUT);

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Split a raw syscall return value into success or errno.
    pub fn result(ret: i64) -> Result<u64, Errno> {
        if (-MAX_ERRNO..=-1).contains(&ret) {
            Err(Self((-ret) as u32))
        } else {
            Ok(ret as u64)
        }
    }

    /// Symbolic name for the errno values this crate cares about.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            EPERM => "EPERM",
            ENOENT => "ENOENT",
            ESRCH => "ESRCH",
            EINTR => "EINTR",
            ECHILD => "ECHILD",
            EAGAIN => "EAGAIN",
            ENOMEM => "ENOMEM",
            EACCES => "EACCES",
            EFAULT => "EFAULT",
            EINVAL => "EINVAL",
            ENOSYS => "ENOSYS",
            ETIMEDOUT => "ETIMEDOUT",
            _ => return None,
        })
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "errno {}", self.0),
        }
    }
}
