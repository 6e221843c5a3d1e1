//! TEAM_466: Process logger.
//!
//! Implements `log::Log` on top of raw `write(2)` to stderr. No std handle,
//! no lock and no allocation, so a forked respondent can log freely.

use core::fmt::Write;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut out = LineBuffer::new();
            let _ = writeln!(out, "{:<5} {}", record.level(), record.args());
            out.flush();
        }
    }

    fn flush(&self) {}
}

/// Formats one record on the stack so it reaches stderr in a single write,
/// keeping lines from the two processes from interleaving mid-line.
struct LineBuffer {
    buf: [u8; 512],
    len: usize,
}

impl LineBuffer {
    const fn new() -> Self {
        Self {
            buf: [0; 512],
            len: 0,
        }
    }

    fn flush(&mut self) {
        let _ = libsyscall::io::write_all(libsyscall::io::STDERR, &self.buf[..self.len]);
        self.len = 0;
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            if self.len == self.buf.len() {
                self.flush();
            }
            let n = bytes.len().min(self.buf.len() - self.len);
            self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
            self.len += n;
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

/// Initialize the logger.
///
/// # Arguments
/// * `max_level` - The maximum log level to display.
pub fn init(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(max_level);
    Ok(())
}
