//! TEAM_463: Execution contexts for the respondent.
//!
//! The body handed to a spawner reports success as a plain `bool`. A forked
//! child turns it into its exit status; a thread returns it from `join`.

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use libsyscall::errno::{EAGAIN, EINTR};
use libsyscall::process;
use libsyscall::Errno;

use crate::HarnessError;

/// Waits for a spawned body and reports whether it succeeded.
pub trait JoinHandle {
    /// Block until the body finished. [`HarnessError::Communication`] if it
    /// reported failure or died.
    fn join(self) -> Result<(), HarnessError>;
}

/// Creates the second execution context.
pub trait Spawner {
    type Handle: JoinHandle;

    /// Whether a spawned body sees the caller's private memory. Thread-only
    /// facilities need this.
    fn shares_address_space(&self) -> bool;

    fn spawn<F>(&self, body: F) -> Result<Self::Handle, HarnessError>
    where
        F: FnOnce() -> bool + Send + 'static;
}

// ============================================================================
// Processes
// ============================================================================

/// Forks a child process.
///
/// The child inherits every mapping, so shared arenas stay shared and private
/// memory is copied. It runs `body` and leaves through `exit_group`, skipping
/// atexit handlers and std buffer flushes that belong to the parent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSpawner;

#[derive(Debug)]
pub struct ProcessHandle {
    pid: i32,
}

impl Spawner for ProcessSpawner {
    type Handle = ProcessHandle;

    fn shares_address_space(&self) -> bool {
        false
    }

    fn spawn<F>(&self, body: F) -> Result<ProcessHandle, HarnessError>
    where
        F: FnOnce() -> bool + Send + 'static,
    {
        let ret = process::fork();
        match Errno::result(ret) {
            Ok(0) => {
                let ok = panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or(false);
                process::exit_group(i32::from(!ok));
            }
            Ok(pid) => {
                log::debug!("[SPAWN] forked child {}", pid);
                Ok(ProcessHandle { pid: pid as i32 })
            }
            Err(e) => {
                log::error!("[SPAWN] fork failed: {}", e);
                Err(HarnessError::Spawn(e))
            }
        }
    }
}

impl JoinHandle for ProcessHandle {
    fn join(self) -> Result<(), HarnessError> {
        let mut status = 0i32;
        loop {
            match Errno::result(process::wait4(self.pid, &mut status, 0)) {
                Ok(_) => break,
                Err(e) if e.raw() == EINTR => {}
                Err(e) => {
                    log::error!("[SPAWN] wait4({}) failed: {}", self.pid, e);
                    return Err(HarnessError::Communication);
                }
            }
        }

        match (process::exit_status(status), process::term_signal(status)) {
            (Some(0), _) => Ok(()),
            (Some(code), _) => {
                log::warn!("[SPAWN] child {} exited with {}", self.pid, code);
                Err(HarnessError::Communication)
            }
            (None, Some(sig)) => {
                log::warn!("[SPAWN] child {} killed by signal {}", self.pid, sig);
                Err(HarnessError::Communication)
            }
            (None, None) => Err(HarnessError::Communication),
        }
    }
}

// ============================================================================
// Threads
// ============================================================================

/// Runs the body on a named std thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

#[derive(Debug)]
pub struct ThreadHandle {
    inner: thread::JoinHandle<bool>,
}

impl Spawner for ThreadSpawner {
    type Handle = ThreadHandle;

    fn shares_address_space(&self) -> bool {
        true
    }

    fn spawn<F>(&self, body: F) -> Result<ThreadHandle, HarnessError>
    where
        F: FnOnce() -> bool + Send + 'static,
    {
        thread::Builder::new()
            .name("respondent".into())
            .spawn(body)
            .map(|inner| ThreadHandle { inner })
            .map_err(|e| {
                log::error!("[SPAWN] thread spawn failed: {}", e);
                let raw = e.raw_os_error().and_then(|n| u32::try_from(n).ok());
                HarnessError::Spawn(Errno::from_raw(raw.unwrap_or(EAGAIN)))
            })
    }
}

impl JoinHandle for ThreadHandle {
    fn join(self) -> Result<(), HarnessError> {
        match self.inner.join() {
            Ok(true) => Ok(()),
            Ok(false) => Err(HarnessError::Communication),
            Err(_) => {
                log::warn!("[SPAWN] respondent thread panicked");
                Err(HarnessError::Communication)
            }
        }
    }
}
