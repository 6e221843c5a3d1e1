//! System identification
//! TEAM_455: uname(2)

use crate::arch;
use crate::sysno::__NR_uname;

const UTS_FIELD: usize = 65;

/// `struct new_utsname`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Utsname {
    pub sysname: [u8; UTS_FIELD],
    pub nodename: [u8; UTS_FIELD],
    pub release: [u8; UTS_FIELD],
    pub version: [u8; UTS_FIELD],
    pub machine: [u8; UTS_FIELD],
    pub domainname: [u8; UTS_FIELD],
}

impl Utsname {
    pub const fn zeroed() -> Self {
        Self {
            sysname: [0; UTS_FIELD],
            nodename: [0; UTS_FIELD],
            release: [0; UTS_FIELD],
            version: [0; UTS_FIELD],
            machine: [0; UTS_FIELD],
            domainname: [0; UTS_FIELD],
        }
    }
}

/// Fill `buf` with the running kernel's identity.
#[inline]
pub fn uname(buf: &mut Utsname) -> i64 {
    arch::syscall1(__NR_uname as u64, buf as *mut Utsname as u64)
}

/// The NUL-terminated prefix of a utsname field, if it is valid UTF-8.
#[must_use]
pub fn field_str(field: &[u8]) -> Option<&str> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    core::str::from_utf8(&field[..end]).ok()
}
