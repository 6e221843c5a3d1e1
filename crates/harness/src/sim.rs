//! Deterministic single-threaded replay of an alternation.
//!
//! Both parties live on the caller's thread and advance with non-blocking
//! [`Party::poll_round`], initiator first. With scripted release indices the
//! whole run, and the arena it leaves behind, is reproducible.

use mw_sync::facility::ParkWait;
use mw_sync::{CellState, SemaphoreArena, SET_SIZE};

use crate::ledger::{Ledger, PartyStats};
use crate::party::{Party, Role, Step};
use crate::rng::ScriptedIndices;
use crate::HarnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    /// Cells claimed from the party's inbox.
    Acquire { claimed: usize },
    /// Cell signalled in the peer's inbox.
    Release { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub role: Role,
    pub round: u32,
    pub kind: TraceKind,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub trace: Vec<TraceEvent>,
    /// Every cell after the run: set 0 (initiator inbox) then set 1.
    pub final_state: Vec<CellState>,
    pub turns: u64,
    pub initiator: PartyStats,
    pub respondent: PartyStats,
}

impl SimulationOutcome {
    /// Final state of one set.
    pub fn set_state(&self, set: usize, set_size: usize) -> &[CellState] {
        set.checked_mul(set_size)
            .and_then(|start| Some(start..start.checked_add(set_size)?))
            .and_then(|range| self.final_state.get(range))
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    iterations: u32,
    set_size: usize,
    seeds: [CellState; 2],
    initiator_script: Vec<usize>,
    respondent_script: Vec<usize>,
}

impl Simulation {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            set_size: SET_SIZE,
            seeds: [CellState::Available, CellState::Unavailable],
            initiator_script: vec![0],
            respondent_script: vec![0],
        }
    }

    pub fn set_size(mut self, set_size: usize) -> Self {
        self.set_size = set_size;
        self
    }

    /// Starting state of the initiator's and the respondent's inbox.
    pub fn seeds(mut self, seeds: [CellState; 2]) -> Self {
        self.seeds = seeds;
        self
    }

    /// Release indices for each party, replayed in order.
    pub fn scripts(mut self, initiator: Vec<usize>, respondent: Vec<usize>) -> Self {
        self.initiator_script = initiator;
        self.respondent_script = respondent;
        self
    }

    pub fn run(&self) -> Result<SimulationOutcome, HarnessError> {
        let arena = SemaphoreArena::new(&self.seeds, self.set_size)?;
        let (Some(set0), Some(set1)) = (arena.set(0), arena.set(1)) else {
            return Err(HarnessError::Protocol(mw_sync::SyncError::IndexOutOfRange));
        };
        let ledger: Ledger = bytemuck::Zeroable::zeroed();
        let park = ParkWait::new();

        let mut parties = [
            Party::new(
                Role::Initiator,
                set0,
                set1,
                &park,
                &ledger,
                ScriptedIndices::new(self.initiator_script.clone()),
                self.iterations,
            ),
            Party::new(
                Role::Respondent,
                set1,
                set0,
                &park,
                &ledger,
                ScriptedIndices::new(self.respondent_script.clone()),
                self.iterations,
            ),
        ];

        let mut trace = Vec::new();
        while !parties.iter().all(Party::is_finished) {
            let mut progressed = false;
            for party in &mut parties {
                if let Step::Advanced {
                    round,
                    claimed,
                    released,
                } = party.poll_round()?
                {
                    let role = party.role();
                    trace.push(TraceEvent {
                        role,
                        round,
                        kind: TraceKind::Acquire { claimed },
                    });
                    trace.push(TraceEvent {
                        role,
                        round,
                        kind: TraceKind::Release { index: released },
                    });
                    progressed = true;
                }
            }
            if !progressed {
                log::error!(
                    "[SIM] stalled after {} and {} rounds",
                    parties[0].rounds(),
                    parties[1].rounds()
                );
                return Err(HarnessError::Stalled);
            }
        }

        Ok(SimulationOutcome {
            trace,
            final_state: arena.snapshot(),
            turns: ledger.turns(),
            initiator: ledger.stats(Role::Initiator),
            respondent: ledger.stats(Role::Respondent),
        })
    }
}
