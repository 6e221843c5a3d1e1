// TEAM_310: Deep integration of linux-raw-sys definitions
// TEAM_210: Syscall constants

pub use linux_raw_sys::general::{
    __NR_clock_gettime,
    __NR_clone,
    __NR_exit_group,
    __NR_futex,
    __NR_futex_waitv,
    __NR_getpid,
    __NR_mmap,
    __NR_munmap,
    __NR_uname,
    __NR_wait4,
    __NR_write,
};
