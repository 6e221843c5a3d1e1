//! Per-party index selection.
//!
//! Production parties pick release targets from a [`DetRng`] seeded
//! independently per party; tests substitute [`ScriptedIndices`] to replay an
//! exact sequence.

use std::time::{SystemTime, UNIX_EPOCH};

/// Offset between the two parties' seeds when both derive from one base.
pub const PEER_SEED_OFFSET: u64 = 234_251;

/// Source of release targets.
pub trait IndexSource {
    /// Next index in `[0, bound)`. `bound` is never zero.
    fn next_index(&mut self, bound: usize) -> usize;
}

/// A deterministic pseudo-random number generator using xorshift64.
///
/// NOT cryptographically secure.
#[derive(Debug, Clone)]
pub struct DetRng {
    state: u64,
}

impl DetRng {
    /// The seed must be non-zero. If zero is provided, it will be replaced with 1.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Value in `[0, bound)` using rejection sampling to avoid modulo bias.
    #[inline]
    pub fn next_below(&mut self, bound: u64) -> u64 {
        let threshold = u64::MAX - (u64::MAX % bound);
        loop {
            let value = self.next_u64();
            if value < threshold {
                return value % bound;
            }
        }
    }
}

impl IndexSource for DetRng {
    fn next_index(&mut self, bound: usize) -> usize {
        self.next_below(bound.max(1) as u64) as usize
    }
}

/// Replays a fixed list of indices, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedIndices {
    script: Vec<usize>,
    pos: usize,
}

impl ScriptedIndices {
    pub fn new(script: impl Into<Vec<usize>>) -> Self {
        Self {
            script: script.into(),
            pos: 0,
        }
    }
}

impl IndexSource for ScriptedIndices {
    fn next_index(&mut self, bound: usize) -> usize {
        if self.script.is_empty() {
            return 0;
        }
        let index = self.script[self.pos % self.script.len()];
        self.pos += 1;
        index % bound.max(1)
    }
}

/// Seed derived from the wall clock, for runs without `--seed`.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()) << 20)
        .unwrap_or(1)
}
