//! Absolute CLOCK_MONOTONIC deadlines for bounded acquires.

use core::time::Duration;

use libsyscall::time::{self, Timespec, CLOCK_MONOTONIC};
use libsyscall::Errno;

use crate::SyncError;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Timespec,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Result<Self, SyncError> {
        let now = now()?;
        Ok(Self {
            at: time::add_nanos(&now, timeout.as_nanos()),
        })
    }

    /// The absolute expiry time on CLOCK_MONOTONIC.
    pub fn as_timespec(&self) -> &Timespec {
        &self.at
    }

    /// Time left, `None` once expired.
    pub fn remaining(&self) -> Result<Option<Timespec>, SyncError> {
        Ok(time::checked_sub(&self.at, &now()?))
    }

    /// Time left as a `Duration`, `None` once expired.
    pub fn remaining_duration(&self) -> Result<Option<Duration>, SyncError> {
        Ok(self
            .remaining()?
            .map(|ts| Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)))
    }
}

fn now() -> Result<Timespec, SyncError> {
    let mut ts = time::zero();
    Errno::result(time::clock_gettime(CLOCK_MONOTONIC, &mut ts)).map_err(SyncError::Clock)?;
    Ok(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_is_expired() {
        let deadline = Deadline::after(Duration::ZERO).unwrap();
        assert!(deadline.remaining().unwrap().is_none());
    }

    #[test]
    fn test_unbounded_timeout_never_expires() {
        let deadline = Deadline::after(Duration::MAX).unwrap();
        let left = deadline.remaining_duration().unwrap().unwrap();
        assert!(left > Duration::from_secs(100 * 365 * 24 * 3600));
    }

    #[test]
    fn test_future_deadline_has_time_left() {
        let deadline = Deadline::after(Duration::from_secs(60)).unwrap();
        let left = deadline.remaining_duration().unwrap().unwrap();
        assert!(left > Duration::from_secs(50));
        assert!(left <= Duration::from_secs(60));
    }
}
