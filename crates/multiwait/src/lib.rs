//! TEAM_465: `multiwait` command line front end.
//!
//! Checks the running kernel, then runs three sub-tests in order: the
//! out-of-tree `FUTEX_WAIT_MULTIPLE` alternation, the sysfs futex2 probe and
//! the mainline `futex_waitv` alternation. Each prints one summary line.

pub mod app;
pub mod cli;
pub mod kernel;
pub mod logger;
pub mod report;
