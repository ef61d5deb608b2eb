//! The append-only history of a tabulation.
//!
//! The engine commits one snapshot per round and never touches a committed
//! round again. Report writers consume this structure; everything needed to
//! audit the count is in here, including every tie-break decision and the
//! audit permutation when one was used.

use crate::arithmetic::FixedDecimal;
use crate::tiebreak::TieBreakDirection;
use serde::Serialize;

/// Weight newly exhausted in a reporting window, split by reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExhaustionDelta {
    pub overvote: FixedDecimal,
    pub skipped_ranks: FixedDecimal,
    pub duplicate: FixedDecimal,
    pub no_continuing: FixedDecimal,
}

impl ExhaustionDelta {
    pub(crate) fn zero(scale: u8) -> ExhaustionDelta {
        let z = FixedDecimal::zero(scale);
        ExhaustionDelta {
            overvote: z,
            skipped_ranks: z,
            duplicate: z,
            no_continuing: z,
        }
    }

    pub fn total(&self) -> FixedDecimal {
        self.overvote + self.skipped_ranks + self.duplicate + self.no_continuing
    }

    pub(crate) fn bucket(&mut self, reason: crate::interpreter::ExhaustReason, weight: FixedDecimal) {
        use crate::interpreter::ExhaustReason;
        match reason {
            ExhaustReason::Overvote => self.overvote += weight,
            ExhaustReason::SkippedRanks => self.skipped_ranks += weight,
            ExhaustReason::DuplicateCandidate => self.duplicate += weight,
            ExhaustReason::NoContinuing => self.no_continuing += weight,
        }
    }

    pub(crate) fn merge(&mut self, other: &ExhaustionDelta) {
        self.overvote += other.overvote;
        self.skipped_ranks += other.skipped_ranks;
        self.duplicate += other.duplicate;
        self.no_continuing += other.no_continuing;
    }
}

/// A candidate elected in a round, with the surplus arithmetic that was
/// applied (or, when the contest ended with the election, merely computed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectionRecord {
    pub name: String,
    /// Tally at the time of election.
    pub tally: FixedDecimal,
    /// Votes above the winning threshold; zero when the candidate was
    /// elected without a surplus (forced election or exact quota).
    pub surplus: FixedDecimal,
    /// Per-ballot transfer fraction `surplus / tally`, present only when a
    /// surplus existed.
    pub transfer_fraction: Option<FixedDecimal>,
}

/// Where the votes of one candidate went when they were eliminated or their
/// surplus was distributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRecord {
    pub from: String,
    /// Receiving continuing candidates with the weight each received, sorted
    /// by candidate name.
    pub to: Vec<(String, FixedDecimal)>,
    /// Weight that exhausted during this transfer.
    pub exhausted: FixedDecimal,
    /// Weight lost to truncation during this transfer.
    pub residual: FixedDecimal,
}

/// One recorded tie-break decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieBreakEvent {
    pub round: u32,
    pub direction: TieBreakDirection,
    pub tied: Vec<String>,
    pub selected: String,
}

/// Everything that happened in one round.
///
/// `tally` lists every candidate still on the books at count time: continuing
/// candidates at their counted weight and previously elected candidates at
/// the weight they retain. `cumulative_exhausted` and `cumulative_residual`
/// are taken at the same instant, so for every round
/// `sum(tally) + cumulative_exhausted + cumulative_residual` equals the total
/// initial weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSnapshot {
    /// 1-based round index.
    pub round: u32,
    pub tally: Vec<(String, FixedDecimal)>,
    pub threshold: FixedDecimal,
    pub elected: Vec<ElectionRecord>,
    pub eliminated: Vec<String>,
    pub transfers: Vec<TransferRecord>,
    /// Weight newly exhausted since the previous round was counted.
    pub exhausted: ExhaustionDelta,
    pub cumulative_exhausted: FixedDecimal,
    pub cumulative_residual: FixedDecimal,
    pub tie_breaks: Vec<TieBreakEvent>,
}

/// The completed (or abnormally terminated) history of a contest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabulationRecord {
    /// Seats the tabulation was filling.
    pub seats: u32,
    /// Seed of the tie-break generator, when one was configured.
    pub random_seed: Option<u64>,
    /// The tie-break ordering in force, published for audit. Re-running with
    /// this ordering as the configured permutation reproduces the contest.
    pub candidate_permutation: Option<Vec<String>>,
    pub rounds: Vec<RoundSnapshot>,
    /// Winners in election order.
    pub winners: Vec<String>,
    pub terminated_abnormally: bool,
    /// The round in which an abnormal termination happened.
    pub failed_round: Option<u32>,
}
