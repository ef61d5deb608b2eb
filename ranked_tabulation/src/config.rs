use crate::record::TabulationRecord;

// ********* Input data structures ***********

/// A declared candidate. Excluded candidates keep their identity so that
/// ballots marking them can be read, but they are removed from the continuing
/// set before the first round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub code: Option<String>,
    pub excluded: bool,
}

impl Candidate {
    pub fn new(name: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            code: None,
            excluded: false,
        }
    }
}

/// The content of one rank position on a ballot, before any rules are
/// applied.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotChoice {
    /// A single mark for a (declared or undeclared) candidate name.
    Candidate(String),
    /// Several marks at the same rank. How this is read depends on the
    /// overvote rule.
    Multiple(Vec<String>),
    /// An explicit overvote sentinel from the recording device; the
    /// individual marks are unknown.
    Overvote,
    /// An explicit undervote sentinel.
    Undervote,
    /// A rank the voter left empty.
    Blank,
    /// A write-in for somebody who is not a declared candidate.
    UndeclaredWriteIn,
}

/// A cast vote record: the ordered rank contents plus bookkeeping labels
/// carried through to reporting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub choices: Vec<BallotChoice>,
    /// Identical ballots may be aggregated; `count` is the multiplicity.
    pub count: u64,
    /// Stable source identifier (file/batch/record) for audit.
    pub source: Option<String>,
    pub precinct: Option<String>,
}

impl Ballot {
    pub fn new(choices: Vec<BallotChoice>, count: u64) -> Ballot {
        Ballot {
            choices,
            count,
            source: None,
            precinct: None,
        }
    }
}

// ********* Rules ***********

// The configuration options follow the vocabulary of the common JSON contest
// configuration format; string labels are resolved to these enumerations
// once, at the boundary.

/// What to do with a rank that holds more than one mark.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OvervoteRule {
    ExhaustImmediately,
    AlwaysSkipToNextRank,
    /// Exhaust only if two or more of the marks are still continuing;
    /// a single continuing mark counts as a vote for it.
    ExhaustIfMultipleContinuing,
}

/// How ties between equal tallies are resolved.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Ask the external oracle, keep counting afterwards.
    Interactive,
    /// Uniform choice from the seeded generator.
    Random,
    /// Walk back through earlier rounds; fall back to the seeded generator
    /// if the candidates were tied in every round.
    PreviousRoundCountsThenRandom,
    /// The candidate order of the configuration is the tie-break order.
    UsePermutationInConfig,
    /// Shuffle all candidates once at start-up with the seeded generator and
    /// use that ordering; the ordering is published for audit.
    GeneratePermutation,
    /// Ask the external oracle and treat the answer as an official decision.
    StopCountingAndAsk,
}

impl TieBreakMode {
    /// True for the modes that consume the seeded generator and therefore
    /// require a `random_seed`.
    pub fn needs_random_seed(&self) -> bool {
        matches!(
            self,
            TieBreakMode::Random
                | TieBreakMode::PreviousRoundCountsThenRandom
                | TieBreakMode::GeneratePermutation
        )
    }

    /// True for the modes that suspend on the external oracle.
    pub fn needs_oracle(&self) -> bool {
        matches!(self, TieBreakMode::Interactive | TieBreakMode::StopCountingAndAsk)
    }
}

/// What to do when a ballot ranks the same candidate at several positions.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicateCandidateMode {
    Exhaust,
    SkipDuplicate,
}

/// The overall shape of the contest.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MultiSeatMode {
    /// Instant-runoff: eliminate until somebody holds a majority.
    SingleWinner,
    /// Single transferable vote with fractional surplus transfers.
    StandardStv,
    /// Repeated single-winner tabulations, removing each winner before the
    /// next pass.
    Sequential,
    /// Never elect mid-count; eliminate the lowest until only as many
    /// candidates remain as there are seats.
    BottomsUp,
    /// Single winner, but keep eliminating until exactly two candidates
    /// remain and report the final head-to-head tally.
    ContinueUntilTwoRemain,
}

/// Upper bound on consecutive skipped ranks before a ballot exhausts.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MaxSkippedRanks {
    Unlimited,
    AtMost(u32),
}

/// How many rank positions of a ballot are read at all.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MaxRankings {
    /// As many positions as there are declared candidates.
    NumCandidates,
    AtMost(u32),
}

/// The complete rule set for one contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabulationRules {
    pub multi_seat_mode: MultiSeatMode,
    pub number_of_winners: u32,
    /// In STV mode, elect at most one candidate per round and transfer a
    /// single surplus per round.
    pub allow_only_one_winner_per_round: bool,
    pub overvote_rule: OvervoteRule,
    pub tiebreak_mode: TieBreakMode,
    pub duplicate_candidate_mode: DuplicateCandidateMode,
    pub max_skipped_ranks_allowed: MaxSkippedRanks,
    pub max_rankings_allowed: MaxRankings,
    /// Candidates below this many votes are eliminated together before any
    /// other elimination is considered.
    pub minimum_vote_threshold: Option<u64>,
    /// Single-winner only: eliminate a whole group of trailing candidates
    /// when their combined votes cannot catch the next candidate up.
    pub batch_elimination: bool,
    /// Multi-seat quota `total / seats` instead of the default
    /// `floor(total / (seats + 1)) + 1`.
    pub hare_quota: bool,
    /// Multi-seat quota `total / (seats + 1)` kept at the configured scale,
    /// with no whole-number adjustment.
    pub non_integer_winning_threshold: bool,
    /// Fractional digits used for all vote arithmetic.
    pub decimal_places: u8,
    /// Seed for the tie-break generator; mandatory for the random modes.
    pub random_seed: Option<u64>,
}

impl TabulationRules {
    pub const DEFAULT_RULES: TabulationRules = TabulationRules {
        multi_seat_mode: MultiSeatMode::SingleWinner,
        number_of_winners: 1,
        allow_only_one_winner_per_round: false,
        overvote_rule: OvervoteRule::ExhaustImmediately,
        tiebreak_mode: TieBreakMode::UsePermutationInConfig,
        duplicate_candidate_mode: DuplicateCandidateMode::SkipDuplicate,
        max_skipped_ranks_allowed: MaxSkippedRanks::Unlimited,
        max_rankings_allowed: MaxRankings::NumCandidates,
        minimum_vote_threshold: None,
        batch_elimination: false,
        hare_quota: false,
        non_integer_winning_threshold: false,
        decimal_places: 4,
        random_seed: None,
    };

    /// Checks the rule set for internal contradictions. All violations abort
    /// before the first round.
    pub fn validate(&self) -> Result<(), TabulationError> {
        let fail = |reason: &str| {
            Err(TabulationError::ConfigInvalid {
                reason: reason.to_string(),
            })
        };
        if self.decimal_places < crate::FixedDecimal::MIN_SCALE
            || self.decimal_places > crate::FixedDecimal::MAX_SCALE
        {
            return fail("decimal places for vote arithmetic must be between 1 and 20");
        }
        if self.number_of_winners == 0 {
            return fail("the number of winners must be at least 1");
        }
        let single_seat = matches!(
            self.multi_seat_mode,
            MultiSeatMode::SingleWinner | MultiSeatMode::ContinueUntilTwoRemain
        );
        if single_seat && self.number_of_winners != 1 {
            return fail("a single-winner contest cannot have more than one seat");
        }
        if !single_seat && self.number_of_winners < 2 {
            return fail("a multi-seat mode needs at least two seats");
        }
        if self.hare_quota && single_seat {
            return fail("the Hare quota only applies to multi-seat contests");
        }
        if self.hare_quota && self.non_integer_winning_threshold {
            return fail("the Hare quota and the non-integer threshold are mutually exclusive");
        }
        if self.batch_elimination
            && !matches!(
                self.multi_seat_mode,
                MultiSeatMode::SingleWinner | MultiSeatMode::Sequential
            )
        {
            return fail("batch elimination only applies to single-winner tabulations");
        }
        if self.tiebreak_mode.needs_random_seed() && self.random_seed.is_none() {
            return fail("the selected tie-break mode requires a random seed");
        }
        if let Some(min) = self.minimum_vote_threshold {
            if min > 1_000_000 {
                return fail("the minimum vote threshold may not exceed 1,000,000");
            }
        }
        if let MaxRankings::AtMost(0) = self.max_rankings_allowed {
            return fail("at least one ranking must be allowed");
        }
        Ok(())
    }
}

impl Default for TabulationRules {
    fn default() -> TabulationRules {
        TabulationRules::DEFAULT_RULES
    }
}

// ********* Errors ***********

/// Why a tabulation could not produce a completed record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TabulationError {
    /// The rule set is malformed or self-contradictory.
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },
    /// Ballots mark candidate names that are not declared and undeclared
    /// write-ins were not enabled for them.
    #[error("ballots reference unrecognized candidates: {}", names.join(", "))]
    UnrecognizedCandidates { names: Vec<String> },
    /// No declared, non-excluded candidate remains at the start.
    #[error("no declared candidate is eligible to receive votes")]
    NoCandidates,
    /// The tabulation failed mid-count; the partial record carries everything
    /// committed before the failing round and is marked as terminated
    /// abnormally.
    #[error("tabulation aborted in round {round}: {cause}")]
    Aborted {
        round: u32,
        cause: AbortCause,
        record: Box<TabulationRecord>,
    },
}

/// The in-round failure behind a [`TabulationError::Aborted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AbortCause {
    #[error("no candidate could be elected or eliminated")]
    NoProgress,
    #[error("the tie-break oracle cancelled the decision")]
    TieBreakCancelled,
    #[error("vote arithmetic exceeded the configured scale")]
    ArithmeticOutOfRange,
}
