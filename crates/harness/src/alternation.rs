//! TEAM_464: One complete alternation sub-test.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mw_sync::{BlockingWait, CellState, SemaphoreArena, SharedSlice, SET_SIZE};
use serde::Serialize;

use crate::ledger::{Ledger, PartyStats};
use crate::party::{Party, Role};
use crate::rng::{time_seed, DetRng, PEER_SEED_OFFSET};
use crate::spawn::{JoinHandle, Spawner};
use crate::HarnessError;

/// Set 0 is the initiator's inbox, set 1 the respondent's.
const SEEDS: [CellState; 2] = [CellState::Available, CellState::Unavailable];

#[derive(Debug, Clone)]
pub struct AlternationConfig {
    /// Rounds per party.
    pub iterations: u32,
    /// Print one line per round.
    pub verbose: bool,
    pub set_size: usize,
    /// Bound on every single acquire. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Respondent seed; the initiator uses `seed + 234251`. Wall clock when `None`.
    pub seed: Option<u64>,
}

impl Default for AlternationConfig {
    fn default() -> Self {
        Self {
            iterations: 5,
            verbose: false,
            set_size: SET_SIZE,
            timeout: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlternationReport {
    pub facility: &'static str,
    pub iterations: u32,
    pub set_size: usize,
    pub seed: u64,
    /// Turns taken across both parties; `2 * iterations` on success.
    pub turns: u64,
    pub initiator: PartyStats,
    pub respondent: PartyStats,
    pub elapsed_us: u64,
}

/// Run both parties to completion over `facility`.
///
/// The respondent runs in a context made by `spawner`, the initiator in the
/// caller. A failure on the initiator's side wins over whatever the join
/// reports.
pub fn run<S: Spawner>(
    spawner: &S,
    facility: Arc<dyn BlockingWait>,
    config: &AlternationConfig,
) -> Result<AlternationReport, HarnessError> {
    let kind = facility.kind();
    if !spawner.shares_address_space() && !kind.is_process_shared() {
        log::warn!("[HARNESS] {} cannot cross a process boundary", kind);
        return Err(HarnessError::Unsupported);
    }

    let arena = Arc::new(SemaphoreArena::new(&SEEDS, config.set_size)?);
    let ledger = Arc::new(SharedSlice::<Ledger>::zeroed(1)?);
    let seed = config.seed.unwrap_or_else(time_seed);
    log::info!(
        "[HARNESS] {}: {} rounds, {} cells per set, seed {}",
        kind,
        config.iterations,
        config.set_size,
        seed
    );

    let started = Instant::now();
    let handle = {
        let arena = Arc::clone(&arena);
        let ledger = Arc::clone(&ledger);
        let facility = Arc::clone(&facility);
        let config = config.clone();
        spawner.spawn(move || respondent(&arena, &ledger[0], &*facility, &config, seed))?
    };

    let initiated = match (arena.set(0), arena.set(1)) {
        (Some(inbox), Some(outbox)) => Party::new(
            Role::Initiator,
            inbox,
            outbox,
            &*facility,
            &ledger[0],
            DetRng::new(seed.wrapping_add(PEER_SEED_OFFSET)),
            config.iterations,
        )
        .verbose(config.verbose)
        .timeout(config.timeout)
        .run(),
        _ => Err(HarnessError::Protocol(mw_sync::SyncError::IndexOutOfRange)),
    };
    if let Err(e) = initiated {
        log::error!("[HARNESS] {} failed: {}", Role::Initiator, e);
    }
    let joined = handle.join();
    initiated?;
    joined?;

    let ledger = &ledger[0];
    let report = AlternationReport {
        facility: kind.label(),
        iterations: config.iterations,
        set_size: config.set_size,
        seed,
        turns: ledger.turns(),
        initiator: ledger.stats(Role::Initiator),
        respondent: ledger.stats(Role::Respondent),
        elapsed_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
    };

    if report.turns != 2 * u64::from(config.iterations) {
        log::error!(
            "[HARNESS] {} turns recorded for {} rounds",
            report.turns,
            config.iterations
        );
        return Err(HarnessError::AlternationViolated);
    }
    log::debug!("[HARNESS] {:?}", report);
    Ok(report)
}

/// Respondent body. Its success is all that crosses back to the caller.
fn respondent(
    arena: &SemaphoreArena,
    ledger: &Ledger,
    facility: &dyn BlockingWait,
    config: &AlternationConfig,
    seed: u64,
) -> bool {
    let (Some(inbox), Some(outbox)) = (arena.set(1), arena.set(0)) else {
        return false;
    };
    let result = Party::new(
        Role::Respondent,
        inbox,
        outbox,
        facility,
        ledger,
        DetRng::new(seed),
        config.iterations,
    )
    .verbose(config.verbose)
    .timeout(config.timeout)
    .run();

    match result {
        Ok(()) => true,
        Err(e) => {
            log::error!("[HARNESS] {} failed: {}", Role::Respondent, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::{ProcessSpawner, ThreadSpawner};
    use mw_sync::facility::ParkWait;

    fn park() -> Arc<dyn BlockingWait> {
        Arc::new(ParkWait::new())
    }

    #[test]
    fn test_default_config() {
        let config = AlternationConfig::default();
        assert_eq!(config.iterations, 5);
        assert_eq!(config.set_size, 10);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_park_across_processes_is_unsupported() {
        let result = run(&ProcessSpawner, park(), &AlternationConfig::default());
        assert_eq!(result.unwrap_err(), HarnessError::Unsupported);
    }

    #[test]
    fn test_threads_over_park() {
        let config = AlternationConfig {
            iterations: 50,
            timeout: Some(Duration::from_secs(10)),
            seed: Some(7),
            ..AlternationConfig::default()
        };
        let report = run(&ThreadSpawner, park(), &config).unwrap();
        assert_eq!(report.turns, 100);
        assert_eq!(report.initiator.acquires, 50);
        assert_eq!(report.respondent.releases, 50);
        assert_eq!(report.facility, "In-process park");
    }

    #[test]
    fn test_invalid_set_size() {
        let config = AlternationConfig {
            set_size: 0,
            ..AlternationConfig::default()
        };
        let err = run(&ThreadSpawner, park(), &config).unwrap_err();
        assert!(matches!(err, HarnessError::Protocol(_)));
    }
}
