//! Tie resolution between candidates with equal tallies.
//!
//! The random element is a ChaCha20 stream seeded from the configured
//! `random_seed`: the 64-bit seed is written little-endian into the first 8
//! bytes of the 32-byte key and the rest is zero. Uniform picks use rejection
//! sampling and the shuffled audit ordering is a Fisher-Yates walk, so two
//! runs with the same seed make identical decisions on any platform.

use crate::arithmetic::FixedDecimal;
use crate::config::{AbortCause, TieBreakMode};
use crate::{CandidateId, Registry};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use serde::Serialize;

/// Whether the tie is between front-runners (election order) or trailing
/// candidates (elimination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TieBreakDirection {
    SelectHighest,
    SelectLowest,
}

/// Everything an external decision maker is shown when the engine suspends
/// on a tie.
#[derive(Debug, Clone, PartialEq)]
pub struct TieBreakRequest {
    /// 1-based round in which the tie arose.
    pub round: u32,
    pub direction: TieBreakDirection,
    /// The tied candidates, in the fixed reporting order.
    pub tied: Vec<String>,
    /// Current-round tallies of the tied candidates.
    pub tallies: Vec<(String, FixedDecimal)>,
}

/// External decision maker for the interactive tie-break modes. Returning
/// `None` cancels the whole tabulation.
pub trait TieBreakOracle {
    fn decide(&mut self, request: &TieBreakRequest) -> Option<String>;
}

/// Deterministic generator behind the random tie-break modes.
pub(crate) struct SeededRng {
    rng: ChaCha20Rng,
}

impl SeededRng {
    pub(crate) fn from_seed(seed: u64) -> SeededRng {
        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&seed.to_le_bytes());
        SeededRng {
            rng: ChaCha20Rng::from_seed(key),
        }
    }

    /// Uniform value in `[0, n)` by rejection sampling: accept a raw draw `x`
    /// when `x >= 2^64 mod n`, so that `x % n` is unbiased.
    pub(crate) fn pick(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        let n = n as u64;
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.rng.next_u64();
            if x >= threshold {
                return (x % n) as usize;
            }
        }
    }

    /// In-place Fisher-Yates shuffle.
    pub(crate) fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.pick(i + 1);
            slice.swap(i, j);
        }
    }
}

pub(crate) struct TieBreaker {
    mode: TieBreakMode,
    rng: Option<SeededRng>,
    /// Tie-break ordering for the permutation modes; position 0 is the first
    /// to be eliminated and the last to be elected.
    permutation: Vec<CandidateId>,
}

impl TieBreaker {
    /// `candidate_order` is the declaration order of all candidates; the
    /// generate-permutation mode shuffles a copy of it once, here.
    pub(crate) fn new(
        mode: TieBreakMode,
        seed: Option<u64>,
        candidate_order: &[CandidateId],
    ) -> TieBreaker {
        let mut rng = seed.map(SeededRng::from_seed);
        let permutation = match mode {
            TieBreakMode::UsePermutationInConfig => candidate_order.to_vec(),
            TieBreakMode::GeneratePermutation => {
                let mut order = candidate_order.to_vec();
                if let Some(rng) = rng.as_mut() {
                    rng.shuffle(&mut order);
                }
                order
            }
            _ => Vec::new(),
        };
        TieBreaker {
            mode,
            rng,
            permutation,
        }
    }

    /// The audit ordering, when one is in use.
    pub(crate) fn permutation(&self) -> Option<&[CandidateId]> {
        if self.permutation.is_empty() {
            None
        } else {
            Some(&self.permutation)
        }
    }

    /// Picks exactly one candidate out of `tied` (at least two entries, in
    /// ascending identifier order). `prior_rounds` holds the per-candidate
    /// tallies of every committed round.
    pub(crate) fn select(
        &mut self,
        tied: &[CandidateId],
        direction: TieBreakDirection,
        round: u32,
        prior_rounds: &[Vec<FixedDecimal>],
        current_tally: &[FixedDecimal],
        registry: &Registry,
        oracle: Option<&mut dyn TieBreakOracle>,
    ) -> Result<CandidateId, AbortCause> {
        debug_assert!(tied.len() >= 2);
        match self.mode {
            TieBreakMode::UsePermutationInConfig | TieBreakMode::GeneratePermutation => {
                Ok(self.pick_by_permutation(tied, direction))
            }
            TieBreakMode::Random => Ok(self.pick_randomly(tied)),
            TieBreakMode::PreviousRoundCountsThenRandom => {
                Ok(self.pick_by_prior_rounds(tied, direction, prior_rounds))
            }
            TieBreakMode::Interactive | TieBreakMode::StopCountingAndAsk => {
                self.ask_oracle(tied, direction, round, current_tally, registry, oracle)
            }
        }
    }

    fn pick_by_permutation(&self, tied: &[CandidateId], direction: TieBreakDirection) -> CandidateId {
        let position = |cid: CandidateId| {
            self.permutation
                .iter()
                .position(|&p| p == cid)
                .unwrap_or(usize::MAX)
        };
        let chosen = match direction {
            TieBreakDirection::SelectLowest => tied.iter().min_by_key(|&&c| position(c)),
            TieBreakDirection::SelectHighest => tied.iter().max_by_key(|&&c| position(c)),
        };
        *chosen.unwrap()
    }

    fn pick_randomly(&mut self, tied: &[CandidateId]) -> CandidateId {
        let idx = self.rng.as_mut().unwrap().pick(tied.len());
        tied[idx]
    }

    /// Walks back from the most recent committed round, keeping only the
    /// extreme tallies in the requested direction, until a single candidate
    /// remains. Candidates tied in every round fall back to the seeded
    /// generator.
    fn pick_by_prior_rounds(
        &mut self,
        tied: &[CandidateId],
        direction: TieBreakDirection,
        prior_rounds: &[Vec<FixedDecimal>],
    ) -> CandidateId {
        let mut pool: Vec<CandidateId> = tied.to_vec();
        for tallies in prior_rounds.iter().rev() {
            let extreme = match direction {
                TieBreakDirection::SelectLowest => {
                    pool.iter().map(|c| tallies[c.0 as usize]).min()
                }
                TieBreakDirection::SelectHighest => {
                    pool.iter().map(|c| tallies[c.0 as usize]).max()
                }
            };
            if let Some(extreme) = extreme {
                pool.retain(|c| tallies[c.0 as usize] == extreme);
                if pool.len() == 1 {
                    return pool[0];
                }
            }
        }
        self.pick_randomly(&pool)
    }

    fn ask_oracle(
        &self,
        tied: &[CandidateId],
        direction: TieBreakDirection,
        round: u32,
        current_tally: &[FixedDecimal],
        registry: &Registry,
        oracle: Option<&mut dyn TieBreakOracle>,
    ) -> Result<CandidateId, AbortCause> {
        let oracle = oracle.ok_or(AbortCause::TieBreakCancelled)?;
        let request = TieBreakRequest {
            round,
            direction,
            tied: tied.iter().map(|&c| registry.name(c).to_string()).collect(),
            tallies: tied
                .iter()
                .map(|&c| {
                    (
                        registry.name(c).to_string(),
                        current_tally[c.0 as usize],
                    )
                })
                .collect(),
        };
        let answer = oracle.decide(&request).ok_or(AbortCause::TieBreakCancelled)?;
        tied.iter()
            .copied()
            .find(|&c| registry.name(c) == answer)
            .ok_or(AbortCause::TieBreakCancelled)
    }
}
