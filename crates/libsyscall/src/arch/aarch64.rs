//! TEAM_275: AArch64 syscall primitives
//!
//! Uses `svc #0` instruction with x8 for syscall number and x0-x5 for arguments.

/// Syscall with 0 arguments
#[inline(always)]
pub fn syscall0(nr: u64) -> i64 {
    let ret: i64;
    // SAFETY: `svc #0` traps into the kernel, which validates every argument.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            lateout("x0") ret,
            options(nostack)
        );
    }
    ret
}

/// Syscall with 1 argument
#[inline(always)]
pub fn syscall1(nr: u64, a0: u64) -> i64 {
    let ret: i64;
    // SAFETY: See syscall0.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            inlateout("x0") a0 => ret,
            options(nostack)
        );
    }
    ret
}

/// Syscall with 2 arguments
#[inline(always)]
pub fn syscall2(nr: u64, a0: u64, a1: u64) -> i64 {
    let ret: i64;
    // SAFETY: See syscall0.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            inlateout("x0") a0 => ret,
            in("x1") a1,
            options(nostack)
        );
    }
    ret
}

/// Syscall with 3 arguments
#[inline(always)]
pub fn syscall3(nr: u64, a0: u64, a1: u64, a2: u64) -> i64 {
    let ret: i64;
    // SAFETY: See syscall0.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            inlateout("x0") a0 => ret,
            in("x1") a1,
            in("x2") a2,
            options(nostack)
        );
    }
    ret
}

/// Syscall with 4 arguments
#[inline(always)]
pub fn syscall4(nr: u64, a0: u64, a1: u64, a2: u64, a3: u64) -> i64 {
    let ret: i64;
    // SAFETY: See syscall0.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            inlateout("x0") a0 => ret,
            in("x1") a1,
            in("x2") a2,
            in("x3") a3,
            options(nostack)
        );
    }
    ret
}

/// Syscall with 5 arguments
#[inline(always)]
pub fn syscall5(nr: u64, a0: u64, a1: u64, a2: u64, a3: u64, a4: u64) -> i64 {
    let ret: i64;
    // SAFETY: See syscall0.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            inlateout("x0") a0 => ret,
            in("x1") a1,
            in("x2") a2,
            in("x3") a3,
            in("x4") a4,
            options(nostack)
        );
    }
    ret
}

/// Syscall with 6 arguments
#[inline(always)]
pub fn syscall6(nr: u64, a0: u64, a1: u64, a2: u64, a3: u64, a4: u64, a5: u64) -> i64 {
    let ret: i64;
    // SAFETY: See syscall0.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            inlateout("x0") a0 => ret,
            in("x1") a1,
            in("x2") a2,
            in("x3") a3,
            in("x4") a4,
            in("x5") a5,
            options(nostack)
        );
    }
    ret
}

/// Exit syscall (noreturn)
#[inline(always)]
pub fn syscall_exit(nr: u64, code: u64) -> ! {
    // SAFETY: exit/exit_group never return.
    unsafe {
        core::arch::asm!(
            "svc #0",
            in("x8") nr,
            in("x0") code,
            options(noreturn, nostack)
        );
    }
}
