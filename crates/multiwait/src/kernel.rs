//! Kernel identification and the "continue anyway" prompt.

use std::io::{self, Read, Write};

use libsyscall::sys::{self, Utsname};
use libsyscall::Errno;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kernel {
    Linux { release: String },
    Other { sysname: String, release: String },
    /// `uname` itself failed.
    Unknown(Errno),
}

impl Kernel {
    pub fn detect() -> Self {
        let mut name = Utsname::zeroed();
        if let Err(e) = Errno::result(sys::uname(&mut name)) {
            log::warn!("[KERNEL] uname failed: {}", e);
            return Self::Unknown(e);
        }
        let sysname = sys::field_str(&name.sysname).unwrap_or("?").to_owned();
        let release = sys::field_str(&name.release).unwrap_or("?").to_owned();
        if sysname == "Linux" {
            Self::Linux { release }
        } else {
            Self::Other { sysname, release }
        }
    }
}

/// Describe `kernel` on `out` and decide whether to go on.
///
/// Linux always proceeds. Anything else asks `Continue anyway? (Y/N)` and reads
/// `input` one byte at a time until it sees Y or N in either case; other
/// bytes are skipped and end of input answers N. `assume_yes` answers Y
/// without reading.
pub fn confirm<R: Read, W: Write>(
    kernel: &Kernel,
    assume_yes: bool,
    input: &mut R,
    out: &mut W,
) -> io::Result<bool> {
    match kernel {
        Kernel::Linux { release } => {
            writeln!(out, "Kernel name: Linux\nKernel version: {release}\nLinux kernel detected")?;
            return Ok(true);
        }
        Kernel::Other { sysname, release } => write!(
            out,
            "Kernel name: {sysname}\nKernel version: {release}\nNon-Linux kernel detected. \
             Futex syscall may cause undefined behavior. Continue anyway? (Y/N) "
        )?,
        Kernel::Unknown(e) => write!(
            out,
            "uname: {e}\nuname call failed. Unable to determine kernel type. \
             Futex syscall may cause undefined behavior on non-Linux kernels. \
             Continue anyway? (Y/N) "
        )?,
    }

    if assume_yes {
        writeln!(out, "Y")?;
        return Ok(true);
    }
    out.flush()?;

    for byte in input.bytes() {
        match byte? {
            b'Y' | b'y' => return Ok(true),
            b'N' | b'n' => return Ok(false),
            _ => {}
        }
    }
    Ok(false)
}
