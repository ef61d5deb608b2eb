//! Per-round ballot interpretation.
//!
//! Every round, each live ballot is read again from its original rank
//! contents against the current continuing set. Interpretation is a pure
//! function of the ranks, the continuing set and the rule flags; no state is
//! carried between calls, which is what makes the tally reproducible.

use crate::config::{DuplicateCandidateMode, MaxSkippedRanks, OvervoteRule};
use crate::CandidateId;
use std::collections::HashSet;

/// One rank position of a ballot, with all names resolved to candidate
/// identifiers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) enum Slot {
    /// The voter left this rank blank (blank or undervote sentinel).
    Empty,
    /// An explicit overvote sentinel; the individual marks are unknown and it
    /// is always treated as multiple continuing marks.
    Overvote,
    /// One or more resolved marks at this rank.
    Marks(Vec<CandidateId>),
}

/// Why a ballot stopped counting toward any continuing candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub(crate) enum ExhaustReason {
    Overvote,
    SkippedRanks,
    DuplicateCandidate,
    NoContinuing,
}

/// The outcome of reading a ballot for one round.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub(crate) enum Interpretation {
    Vote(CandidateId),
    Exhaust(ExhaustReason),
}

/// The rule flags the interpreter needs, resolved once per tabulation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InterpreterSettings {
    pub overvote_rule: OvervoteRule,
    pub duplicate_mode: DuplicateCandidateMode,
    pub max_skipped: MaxSkippedRanks,
    /// Number of rank positions read at all, already resolved from
    /// `maxRankingsAllowed`.
    pub rank_cap: usize,
}

/// Reads a ballot against the continuing set.
///
/// Ranks are visited in ascending order. A rank with a mark for somebody who
/// is no longer continuing is passed over; empty ranks count toward the
/// consecutive-skip limit; duplicate and overvote handling follow the
/// configured rules. If no rank yields a continuing candidate the ballot
/// exhausts with the reason of the first terminal condition met.
pub(crate) fn interpret(
    slots: &[Slot],
    continuing: &HashSet<CandidateId>,
    settings: &InterpreterSettings,
) -> Interpretation {
    let mut consecutive_empty: u32 = 0;
    let mut seen: HashSet<CandidateId> = HashSet::new();
    for slot in slots.iter().take(settings.rank_cap) {
        match slot {
            Slot::Empty => {
                consecutive_empty += 1;
                if let MaxSkippedRanks::AtMost(max) = settings.max_skipped {
                    if consecutive_empty > max {
                        return Interpretation::Exhaust(ExhaustReason::SkippedRanks);
                    }
                }
            }
            Slot::Overvote => {
                consecutive_empty = 0;
                match settings.overvote_rule {
                    OvervoteRule::AlwaysSkipToNextRank => {}
                    // The marks behind the sentinel are unknown, so the
                    // conditional rule has to assume they are continuing.
                    OvervoteRule::ExhaustImmediately
                    | OvervoteRule::ExhaustIfMultipleContinuing => {
                        return Interpretation::Exhaust(ExhaustReason::Overvote);
                    }
                }
            }
            Slot::Marks(marks) => {
                consecutive_empty = 0;
                if settings.duplicate_mode == DuplicateCandidateMode::Exhaust
                    && marks.iter().any(|cid| seen.contains(cid))
                {
                    return Interpretation::Exhaust(ExhaustReason::DuplicateCandidate);
                }
                seen.extend(marks.iter().copied());
                if marks.len() > 1 {
                    match settings.overvote_rule {
                        OvervoteRule::ExhaustImmediately => {
                            return Interpretation::Exhaust(ExhaustReason::Overvote);
                        }
                        OvervoteRule::AlwaysSkipToNextRank => {}
                        OvervoteRule::ExhaustIfMultipleContinuing => {
                            let mut live = marks.iter().filter(|cid| continuing.contains(cid));
                            match (live.next(), live.next()) {
                                (Some(&only), None) => return Interpretation::Vote(only),
                                (Some(_), Some(_)) => {
                                    return Interpretation::Exhaust(ExhaustReason::Overvote);
                                }
                                _ => {}
                            }
                        }
                    }
                } else if let Some(&cid) = marks.first() {
                    if continuing.contains(&cid) {
                        return Interpretation::Vote(cid);
                    }
                }
            }
        }
    }
    Interpretation::Exhaust(ExhaustReason::NoContinuing)
}
