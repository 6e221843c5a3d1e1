use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use mw_harness::{alternation, HarnessError, ProcessSpawner};
use mw_sync::facility::{self, FacilityKind};
use mw_sync::{probe, Capabilities, SyncError};

use crate::cli::{Cli, RunConfig};
use crate::kernel::{self, Kernel};
use crate::logger;
use crate::report::{RunReport, SubTestResult};

pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.config();
    logger::init(config.log_level).context("installing logger")?;

    let kernel = Kernel::detect();
    let proceed = {
        let mut stdout = io::stdout().lock();
        let go = kernel::confirm(&kernel, config.assume_yes, &mut io::stdin().lock(), &mut stdout)
            .context("reading confirmation")?;
        // Nothing may sit in std's buffer when the respondent is forked.
        stdout.flush()?;
        go
    };
    if !proceed {
        log::info!("[APP] declined to run on this kernel");
        return Ok(ExitCode::SUCCESS);
    }

    let report = run_sub_tests(&config, &kernel);
    if config.json {
        let json = report.to_json().context("serializing report")?;
        libsyscall::println!("{}", json);
    }
    Ok(ExitCode::from(report.exit_code()))
}

/// Every sub-test in order, printing each summary line as it completes.
pub fn run_sub_tests(config: &RunConfig, kernel: &Kernel) -> RunReport {
    let mut report = RunReport {
        kernel: match kernel {
            Kernel::Linux { release } | Kernel::Other { release, .. } => Some(release.clone()),
            Kernel::Unknown(_) => None,
        },
        results: Vec::new(),
    };

    for kind in [
        FacilityKind::WaitMultiple,
        FacilityKind::Futex2Sysfs,
        FacilityKind::Waitv,
    ] {
        let result = match kind {
            FacilityKind::Futex2Sysfs => sysfs_probe(),
            _ => alternation_sub_test(kind, config),
        };
        result.print();
        report.results.push(result);
    }
    report
}

/// Reported as success or failure, never skipped.
fn sysfs_probe() -> SubTestResult {
    let kind = FacilityKind::Futex2Sysfs;
    if probe::capabilities().contains(Capabilities::for_kind(kind)) {
        SubTestResult::pass(kind.label(), None)
    } else {
        SubTestResult::fail(kind.label(), format!("{} not present", probe::FUTEX2_SYSFS_PATH))
    }
}

fn alternation_sub_test(kind: FacilityKind, config: &RunConfig) -> SubTestResult {
    let facility = match facility::select(kind) {
        Ok(f) => f,
        Err(SyncError::Unsupported) => return SubTestResult::skip(kind.label()),
        Err(e) => return SubTestResult::fail(kind.label(), e.to_string()),
    };

    match alternation::run(&ProcessSpawner, facility, &config.alternation) {
        Ok(report) => SubTestResult::pass(kind.label(), Some(report)),
        Err(HarnessError::Unsupported) => SubTestResult::skip(kind.label()),
        Err(e) => {
            log::error!("[APP] {} sub-test failed: {}", kind, e);
            SubTestResult::fail(kind.label(), e.to_string())
        }
    }
}
