//! TEAM_460: Capability Probe.
//!
//! Answers "can this kernel block on a set of addresses?" without blocking
//! and without touching any semaphore. Syscall probes aim at a private scratch
//! word whose value never matches the expected one, so a supporting kernel
//! answers EAGAIN straight away; a zero timeout backs that up.

use std::path::Path;

use bitflags::bitflags;
use core::sync::atomic::AtomicU32;
use libsyscall::sync::{
    futex_ops::{FUTEX2_SIZE_U32, FUTEX_BITSET_MATCH_ANY},
    futex_wait_multiple, futex_waitv, FutexWaitBlock, FutexWaitv,
};
use libsyscall::time::{self, CLOCK_MONOTONIC};
use libsyscall::Errno;
use spin::Once;

use crate::facility::FacilityKind;

/// sysfs node exported by the out-of-tree futex2 patch set.
pub const FUTEX2_SYSFS_PATH: &str = "/sys/kernel/futex2";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const WAIT_MULTIPLE = 1 << 0;
        const FUTEX2_SYSFS = 1 << 1;
        const WAITV = 1 << 2;
        const PARK = 1 << 3;
    }
}

impl Capabilities {
    pub const fn for_kind(kind: FacilityKind) -> Self {
        match kind {
            FacilityKind::WaitMultiple => Self::WAIT_MULTIPLE,
            FacilityKind::Futex2Sysfs => Self::FUTEX2_SYSFS,
            FacilityKind::Waitv => Self::WAITV,
            FacilityKind::Park => Self::PARK,
        }
    }
}

static CAPABILITIES: Once<Capabilities> = Once::new();

/// Probe every facility once and cache the answer for the process lifetime.
pub fn capabilities() -> Capabilities {
    *CAPABILITIES.call_once(probe_all)
}

/// Probe every facility now, bypassing the cache.
pub fn probe_all() -> Capabilities {
    [
        FacilityKind::WaitMultiple,
        FacilityKind::Futex2Sysfs,
        FacilityKind::Waitv,
        FacilityKind::Park,
    ]
    .into_iter()
    .filter(|&kind| probe(kind))
    .fold(Capabilities::empty(), |caps, kind| {
        caps | Capabilities::for_kind(kind)
    })
}

/// Whether `kind` is usable on the running system.
pub fn probe(kind: FacilityKind) -> bool {
    let supported = match kind {
        FacilityKind::WaitMultiple => probe_wait_multiple(),
        FacilityKind::Futex2Sysfs => probe_futex2_sysfs(Path::new(FUTEX2_SYSFS_PATH)),
        FacilityKind::Waitv => probe_waitv(),
        FacilityKind::Park => true,
    };
    log::debug!("[PROBE] {}: {}", kind, if supported { "supported" } else { "absent" });
    supported
}

/// Syscall probes: EAGAIN (value mismatch) or ETIMEDOUT (zero timeout) both
/// prove the kernel understood the request.
fn accepted(kind: FacilityKind, ret: i64) -> bool {
    match Errno::result(ret) {
        Err(e) if e == Errno::EAGAIN || e == Errno::ETIMEDOUT => true,
        Ok(_) => true,
        Err(e) => {
            log::debug!("[PROBE] {} rejected: {}", kind, e);
            false
        }
    }
}

fn probe_wait_multiple() -> bool {
    let scratch = AtomicU32::new(1);
    let block = FutexWaitBlock {
        uaddr: &scratch as *const AtomicU32 as *const u32,
        val: 0,
        bitset: FUTEX_BITSET_MATCH_ANY,
    };
    let no_wait = time::zero();
    accepted(
        FacilityKind::WaitMultiple,
        futex_wait_multiple(&[block], Some(&no_wait)),
    )
}

fn probe_waitv() -> bool {
    let scratch = AtomicU32::new(1);
    let waiter = FutexWaitv {
        val: 0,
        uaddr: &scratch as *const AtomicU32 as u64,
        flags: FUTEX2_SIZE_U32,
        reserved: 0,
    };
    // Absolute time zero on the monotonic clock is always in the past.
    let already_expired = time::zero();
    accepted(
        FacilityKind::Waitv,
        futex_waitv(&[waiter], Some(&already_expired), CLOCK_MONOTONIC),
    )
}

fn probe_futex2_sysfs(path: &Path) -> bool {
    match path.try_exists() {
        Ok(exists) => exists,
        Err(e) => {
            log::debug!("[PROBE] {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_park_always_supported() {
        assert!(probe(FacilityKind::Park));
        assert!(capabilities().contains(Capabilities::PARK));
    }

    #[test]
    fn test_sysfs_probe_on_missing_path() {
        assert!(!probe_futex2_sysfs(Path::new("/nonexistent/futex2")));
    }

    #[test]
    fn test_sysfs_probe_on_existing_path() {
        assert!(probe_futex2_sysfs(Path::new("/")));
    }

    #[test]
    fn test_accepted_classification() {
        assert!(accepted(FacilityKind::Waitv, -11));
        assert!(accepted(FacilityKind::Waitv, -110));
        assert!(!accepted(FacilityKind::Waitv, -38));
        assert!(!accepted(FacilityKind::WaitMultiple, -22));
    }

    #[test]
    fn test_probe_all_agrees_with_single_probe() {
        // Whatever the kernel supports, probing must return promptly.
        let caps = probe_all();
        assert_eq!(caps.contains(Capabilities::WAITV), probe(FacilityKind::Waitv));
    }

    #[test]
    fn test_cached_capabilities_are_stable() {
        assert_eq!(capabilities(), capabilities());
    }
}
