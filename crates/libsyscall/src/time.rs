//! Time operations
//! TEAM_275: Refactored to use arch::syscallN

use crate::arch;
use crate::sysno::__NR_clock_gettime;

pub use linux_raw_sys::general::CLOCK_MONOTONIC;

/// TEAM_217: 64-bit kernel timespec, as taken by futex_waitv.
pub type Timespec = linux_raw_sys::general::__kernel_timespec;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Read `clock` into `ts`.
#[inline]
pub fn clock_gettime(clock: u32, ts: &mut Timespec) -> i64 {
    arch::syscall2(
        __NR_clock_gettime as u64,
        u64::from(clock),
        ts as *mut Timespec as u64,
    )
}

/// Zero timespec.
#[must_use]
pub const fn zero() -> Timespec {
    Timespec {
        tv_sec: 0,
        tv_nsec: 0,
    }
}

/// Latest representable instant.
pub const FOREVER: Timespec = Timespec {
    tv_sec: i64::MAX,
    tv_nsec: NANOS_PER_SEC - 1,
};

/// `ts + nanos`, normalised. Saturates at [`FOREVER`].
#[must_use]
pub fn add_nanos(ts: &Timespec, nanos: u128) -> Timespec {
    let nanos = i128::try_from(nanos).unwrap_or(i128::MAX);
    let total = i128::from(ts.tv_nsec).saturating_add(nanos);
    let carry = i64::try_from(total / i128::from(NANOS_PER_SEC)).unwrap_or(i64::MAX);
    match ts.tv_sec.checked_add(carry) {
        Some(tv_sec) => Timespec {
            tv_sec,
            tv_nsec: (total % i128::from(NANOS_PER_SEC)) as i64,
        },
        None => FOREVER,
    }
}

/// `later - earlier`, or `None` once `later` is not after `earlier`.
#[must_use]
pub fn checked_sub(later: &Timespec, earlier: &Timespec) -> Option<Timespec> {
    let mut sec = later.tv_sec - earlier.tv_sec;
    let mut nsec = later.tv_nsec - earlier.tv_nsec;
    if nsec < 0 {
        sec -= 1;
        nsec += NANOS_PER_SEC;
    }
    if sec < 0 || (sec == 0 && nsec == 0) {
        None
    } else {
        Some(Timespec {
            tv_sec: sec,
            tv_nsec: nsec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(tv_sec: i64, tv_nsec: i64) -> Timespec {
        Timespec { tv_sec, tv_nsec }
    }

    #[test]
    fn test_add_nanos_carries_seconds() {
        let out = add_nanos(&ts(1, 900_000_000), 200_000_000);
        assert_eq!((out.tv_sec, out.tv_nsec), (2, 100_000_000));
    }

    #[test]
    fn test_add_nanos_saturates() {
        let out = add_nanos(&ts(1_000, 5), u128::MAX);
        assert_eq!((out.tv_sec, out.tv_nsec), (FOREVER.tv_sec, FOREVER.tv_nsec));

        // Duration::MAX worth of nanoseconds still fits in the seconds field.
        let secs = u128::from(u64::MAX);
        let out = add_nanos(&ts(0, 0), secs * 1_000_000_000);
        assert_eq!(out.tv_sec, i64::MAX);

        let out = add_nanos(&ts(i64::MAX - 1, 0), 3_000_000_000);
        assert_eq!(out.tv_sec, i64::MAX);
    }

    #[test]
    fn test_checked_sub() {
        let out = checked_sub(&ts(3, 100), &ts(1, 200)).unwrap();
        assert_eq!((out.tv_sec, out.tv_nsec), (1, 999_999_900));
        assert!(checked_sub(&ts(1, 0), &ts(1, 0)).is_none());
        assert!(checked_sub(&ts(1, 0), &ts(2, 0)).is_none());
    }

    #[test]
    fn test_monotonic_clock_advances() {
        let mut a = zero();
        let mut b = zero();
        assert_eq!(clock_gettime(CLOCK_MONOTONIC, &mut a), 0);
        assert_eq!(clock_gettime(CLOCK_MONOTONIC, &mut b), 0);
        assert!((b.tv_sec, b.tv_nsec) >= (a.tv_sec, a.tv_nsec));
    }
}
