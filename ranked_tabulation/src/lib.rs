/*!
The `ranked_tabulation` crate is a round-by-round tabulation engine for
ranked choice voting contests: single-winner instant-runoff, the fractional
single transferable vote for multi-seat contests, sequential runoffs and
bottoms-up counts.

The engine is pure over its inputs: it does no I/O, uses fixed-precision
decimal arithmetic for every tally and transfer, and resolves ties with a
seeded generator, so two runs over the same ballots, rules and seed produce
byte-identical results. Each completed round is committed to an append-only
[`TabulationRecord`] which report writers consume.

This library can be used in two flavours:

- as a simple library for common cases, through [`run_contest_simple`];

- as a full tabulation core that handles weighted ballots, overvotes,
  skipped ranks, undeclared write-ins and every supported multi-seat
  variant, through [`Builder`] and [`run_contest`]. If you are replicating
  the results of a specific election, check its rules carefully and
  configure [`TabulationRules`] accordingly.

Here is a short example of running a contest:

```
use ranked_tabulation::{Builder, TabulationRules};
# use ranked_tabulation::TabulationError;
# let _ = env_logger::try_init();

let mut builder = Builder::new(&TabulationRules::default())?
    .candidates(&["Alice".to_string(), "Bob".to_string(), "Charlie".to_string()])?;

builder.add_ballot_simple(&["Alice".to_string(), "Bob".to_string()])?;
builder.add_ballot_simple(&["Alice".to_string()])?;
builder.add_ballot_simple(&["Charlie".to_string(), "Bob".to_string()])?;

let record = ranked_tabulation::run_contest(&builder)?;

assert_eq!(record.winners, vec!["Alice".to_string()]);

# Ok::<(), TabulationError>(())
```
*/

mod arithmetic;
mod builder;
mod config;
mod interpreter;
pub mod manual;
mod record;
mod threshold;
mod tiebreak;
mod transfer;

pub use crate::arithmetic::{ArithmeticOverflow, FixedDecimal, ParseFixedDecimalError};
pub use crate::builder::Builder;
pub use crate::config::*;
pub use crate::record::*;
pub use crate::tiebreak::{TieBreakDirection, TieBreakOracle, TieBreakRequest};

use crate::interpreter::{interpret, Interpretation, InterpreterSettings, Slot};
use crate::threshold::winning_threshold;
use crate::tiebreak::TieBreaker;
use crate::transfer::{surplus_fraction, TransferLedger};
use log::{debug, info};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

type RoundId = u32;

/// Backstop against a round loop that stopped making progress.
const MAX_ROUNDS: usize = 10_000;

/// Reporting name of the undeclared write-in pool.
pub const UNDECLARED_WRITE_IN_NAME: &str = "Undeclared Write-ins";

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub(crate) struct CandidateId(pub(crate) u32);

/// The session-owned index <-> name bijection. The engine works on compact
/// indices; names only appear at the reporting boundary.
pub(crate) struct Registry {
    names: Vec<String>,
    undeclared: Option<CandidateId>,
}

impl Registry {
    pub(crate) fn name(&self, cid: CandidateId) -> &str {
        &self.names[cid.0 as usize]
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }

    fn ids(&self) -> impl Iterator<Item = CandidateId> + '_ {
        (0..self.names.len() as u32).map(CandidateId)
    }

    fn undeclared_id(&self) -> Option<CandidateId> {
        self.undeclared
    }

    fn is_undeclared(&self, cid: CandidateId) -> bool {
        self.undeclared == Some(cid)
    }

    #[cfg(test)]
    pub(crate) fn toy(names: &[&str]) -> Registry {
        Registry {
            names: names.iter().map(|s| s.to_string()).collect(),
            undeclared: None,
        }
    }
}

#[derive(Clone)]
struct InternalBallot {
    slots: Vec<Slot>,
    weight: FixedDecimal,
}

/// Where a candidate stands relative to the current round.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Standing {
    Continuing,
    Excluded,
    /// Elected, surplus not yet distributed; the candidate's ballots are
    /// frozen in place until their distribution round.
    PendingSurplus,
    Elected,
    Eliminated,
}

/// The ingested contest: resolved ballots plus the registry.
struct ContestData {
    registry: Registry,
    ballots: Vec<InternalBallot>,
    excluded: Vec<CandidateId>,
    /// Declared candidates in declaration order; the base ordering for the
    /// tie-break permutation modes.
    declared_order: Vec<CandidateId>,
}

fn candidates_from_ballots(ballots: &[Ballot]) -> Vec<Candidate> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for ballot in ballots {
        for choice in &ballot.choices {
            match choice {
                BallotChoice::Candidate(name) if !name.is_empty() => {
                    names.insert(name.clone());
                }
                BallotChoice::Multiple(marks) => {
                    for name in marks {
                        if !name.is_empty() {
                            names.insert(name.clone());
                        }
                    }
                }
                _ => {}
            }
        }
    }
    names.into_iter().map(|n| Candidate::new(&n)).collect()
}

/// Resolves builder input into the internal ballot form, creating the
/// undeclared write-in pool when needed and rejecting unknown names when it
/// is not enabled.
fn ingest(builder: &Builder, scale: u8) -> Result<ContestData, TabulationError> {
    let declared = builder
        .candidates
        .clone()
        .unwrap_or_else(|| candidates_from_ballots(&builder.ballots));
    if !declared.iter().any(|c| !c.excluded) {
        return Err(TabulationError::NoCandidates);
    }
    let mut lookup: HashMap<&str, CandidateId> = HashMap::new();
    for (idx, c) in declared.iter().enumerate() {
        lookup.insert(c.name.as_str(), CandidateId(idx as u32));
    }

    let mut unknown: BTreeSet<String> = BTreeSet::new();
    let mut undeclared_names = false;
    let mut explicit_write_ins = false;
    {
        let mut note_name = |name: &String| {
            if !name.is_empty() && !lookup.contains_key(name.as_str()) {
                if builder.undeclared_allowed {
                    undeclared_names = true;
                } else {
                    unknown.insert(name.clone());
                }
            }
        };
        for ballot in &builder.ballots {
            for choice in &ballot.choices {
                match choice {
                    BallotChoice::Candidate(name) => note_name(name),
                    BallotChoice::Multiple(marks) => marks.iter().for_each(&mut note_name),
                    BallotChoice::UndeclaredWriteIn => explicit_write_ins = true,
                    _ => {}
                }
            }
        }
    }
    let needs_pool = undeclared_names || explicit_write_ins;
    if !unknown.is_empty() {
        return Err(TabulationError::UnrecognizedCandidates {
            names: unknown.into_iter().collect(),
        });
    }

    let mut names: Vec<String> = declared.iter().map(|c| c.name.clone()).collect();
    let undeclared = if needs_pool {
        let cid = CandidateId(names.len() as u32);
        names.push(UNDECLARED_WRITE_IN_NAME.to_string());
        Some(cid)
    } else {
        None
    };
    let registry = Registry { names, undeclared };

    let resolve = |name: &str| lookup.get(name).copied().or(undeclared);
    let mut ballots: Vec<InternalBallot> = Vec::new();
    for ballot in &builder.ballots {
        if ballot.count == 0 {
            continue;
        }
        let weight = FixedDecimal::from_integer(ballot.count, scale).map_err(|_| {
            TabulationError::ConfigInvalid {
                reason: "ballot count out of range at the configured scale".to_string(),
            }
        })?;
        let mut slots: Vec<Slot> = Vec::with_capacity(ballot.choices.len());
        for choice in &ballot.choices {
            let slot = match choice {
                BallotChoice::Candidate(name) if name.is_empty() => Slot::Empty,
                BallotChoice::Candidate(name) => match resolve(name) {
                    Some(cid) => Slot::Marks(vec![cid]),
                    None => Slot::Empty,
                },
                BallotChoice::Multiple(marks) => {
                    let ids: Vec<CandidateId> = marks
                        .iter()
                        .filter(|n| !n.is_empty())
                        .filter_map(|n| resolve(n))
                        .collect();
                    if ids.is_empty() {
                        Slot::Empty
                    } else {
                        Slot::Marks(ids)
                    }
                }
                BallotChoice::Overvote => Slot::Overvote,
                BallotChoice::Undervote | BallotChoice::Blank => Slot::Empty,
                BallotChoice::UndeclaredWriteIn => match undeclared {
                    Some(cid) => Slot::Marks(vec![cid]),
                    None => Slot::Empty,
                },
            };
            slots.push(slot);
        }
        ballots.push(InternalBallot { slots, weight });
    }

    let excluded: Vec<CandidateId> = declared
        .iter()
        .enumerate()
        .filter(|(_, c)| c.excluded)
        .map(|(i, _)| CandidateId(i as u32))
        .collect();
    let declared_order: Vec<CandidateId> = (0..declared.len() as u32).map(CandidateId).collect();
    Ok(ContestData {
        registry,
        ballots,
        excluded,
        declared_order,
    })
}

/// What one round decided to do.
struct RoundDecision {
    /// Candidates elected this round, in election order.
    elected: Vec<CandidateId>,
    eliminated: Vec<CandidateId>,
    /// The tabulation ends with this round; surpluses are reported but not
    /// distributed.
    terminal: bool,
}

/// One tabulation run over a fixed candidate set. Sequential contests build
/// one of these per pass.
struct Tabulation<'a> {
    rules: &'a TabulationRules,
    registry: &'a Registry,
    settings: InterpreterSettings,
    scale: u8,
    /// Seats this run is filling (1 for a sequential pass).
    seats: u32,
    mode: MultiSeatMode,
    round_offset: u32,
    ballots: Vec<InternalBallot>,
    /// Candidate each live ballot counted for in the current round.
    assigned: Vec<Option<CandidateId>>,
    standing: Vec<Standing>,
    /// Weight retained by an elected candidate once their surplus is gone.
    held: Vec<Option<FixedDecimal>>,
    /// The winning threshold in force when a candidate was elected; the
    /// surplus of a deferred distribution is measured against it.
    election_threshold: Vec<Option<FixedDecimal>>,
    carry_exhaust: ExhaustionDelta,
    carry_residual: FixedDecimal,
    cumulative_exhausted: FixedDecimal,
    cumulative_residual: FixedDecimal,
    /// Full tally of every committed round, for the walk-back tie-break.
    committed_tallies: Vec<Vec<FixedDecimal>>,
    tiebreaker: TieBreaker,
    oracle: Option<&'a mut dyn TieBreakOracle>,
    pending_surplus: VecDeque<CandidateId>,
    rounds: Vec<RoundSnapshot>,
    winners: Vec<CandidateId>,
}

impl<'a> Tabulation<'a> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        rules: &'a TabulationRules,
        registry: &'a Registry,
        ballots: Vec<InternalBallot>,
        excluded: &[CandidateId],
        seats: u32,
        mode: MultiSeatMode,
        round_offset: u32,
        tiebreaker: TieBreaker,
        oracle: Option<&'a mut dyn TieBreakOracle>,
        declared_count: usize,
    ) -> Tabulation<'a> {
        let scale = rules.decimal_places;
        let n = registry.len();
        let mut standing = vec![Standing::Continuing; n];
        for &cid in excluded {
            standing[cid.0 as usize] = Standing::Excluded;
        }
        let rank_cap = match rules.max_rankings_allowed {
            MaxRankings::NumCandidates => declared_count,
            MaxRankings::AtMost(k) => k as usize,
        };
        let settings = InterpreterSettings {
            overvote_rule: rules.overvote_rule,
            duplicate_mode: rules.duplicate_candidate_mode,
            max_skipped: rules.max_skipped_ranks_allowed,
            rank_cap,
        };
        let assigned = vec![None; ballots.len()];
        Tabulation {
            rules,
            registry,
            settings,
            scale,
            seats,
            mode,
            round_offset,
            ballots,
            assigned,
            standing,
            held: vec![None; n],
            election_threshold: vec![None; n],
            carry_exhaust: ExhaustionDelta::zero(scale),
            carry_residual: FixedDecimal::zero(scale),
            cumulative_exhausted: FixedDecimal::zero(scale),
            cumulative_residual: FixedDecimal::zero(scale),
            committed_tallies: Vec::new(),
            tiebreaker,
            oracle,
            pending_surplus: VecDeque::new(),
            rounds: Vec::new(),
            winners: Vec::new(),
        }
    }

    fn continuing_ids(&self) -> Vec<CandidateId> {
        self.registry
            .ids()
            .filter(|c| self.standing[c.0 as usize] == Standing::Continuing)
            .collect()
    }

    fn continuing_set(&self) -> HashSet<CandidateId> {
        self.continuing_ids().into_iter().collect()
    }

    /// Continuing candidates who may actually win a seat (the undeclared
    /// write-in pool never can).
    fn electable_ids(&self, continuing: &[CandidateId]) -> Vec<CandidateId> {
        continuing
            .iter()
            .copied()
            .filter(|&c| !self.registry.is_undeclared(c))
            .collect()
    }

    /// Counts every live ballot against the continuing set. Ballots held by a
    /// winner awaiting surplus distribution stay where they are.
    fn count_ballots(&mut self) -> (Vec<FixedDecimal>, ExhaustionDelta) {
        let continuing = self.continuing_set();
        let mut tally = vec![FixedDecimal::zero(self.scale); self.registry.len()];
        let mut fresh = ExhaustionDelta::zero(self.scale);
        for i in 0..self.ballots.len() {
            let weight = self.ballots[i].weight;
            if weight.is_zero() {
                self.assigned[i] = None;
                continue;
            }
            if let Some(c) = self.assigned[i] {
                if self.standing[c.0 as usize] == Standing::PendingSurplus {
                    tally[c.0 as usize] += weight;
                    continue;
                }
            }
            match interpret(&self.ballots[i].slots, &continuing, &self.settings) {
                Interpretation::Vote(c) => {
                    self.assigned[i] = Some(c);
                    tally[c.0 as usize] += weight;
                }
                Interpretation::Exhaust(reason) => {
                    fresh.bucket(reason, weight);
                    self.ballots[i].weight = FixedDecimal::zero(self.scale);
                    self.assigned[i] = None;
                }
            }
        }
        (tally, fresh)
    }

    /// The reported tally: continuing candidates at their counted weight,
    /// elected candidates at the weight they retain, highest first.
    fn tally_view(&self, tally: &[FixedDecimal]) -> Vec<(String, FixedDecimal)> {
        let mut view: Vec<(String, FixedDecimal)> = Vec::new();
        for cid in self.registry.ids() {
            let i = cid.0 as usize;
            let value = match self.standing[i] {
                Standing::Continuing | Standing::PendingSurplus => tally[i],
                Standing::Elected => match self.held[i] {
                    Some(held) => held,
                    None => tally[i],
                },
                Standing::Eliminated | Standing::Excluded => continue,
            };
            view.push((self.registry.name(cid).to_string(), value));
        }
        view.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        view
    }

    fn break_tie(
        &mut self,
        tied: &[CandidateId],
        direction: TieBreakDirection,
        round: RoundId,
        tally: &[FixedDecimal],
        events: &mut Vec<TieBreakEvent>,
    ) -> Result<CandidateId, AbortCause> {
        let selected = self.tiebreaker.select(
            tied,
            direction,
            round,
            &self.committed_tallies,
            tally,
            self.registry,
            self.oracle.as_mut().map(|o| &mut **o as &mut dyn TieBreakOracle),
        )?;
        let mut tied_names: Vec<String> = tied
            .iter()
            .map(|&c| self.registry.name(c).to_string())
            .collect();
        tied_names.sort();
        events.push(TieBreakEvent {
            round,
            direction,
            tied: tied_names,
            selected: self.registry.name(selected).to_string(),
        });
        Ok(selected)
    }

    /// The candidate with the largest tally in `pool`, resolving ties in the
    /// select-highest direction.
    fn top_of(
        &mut self,
        pool: &[CandidateId],
        tally: &[FixedDecimal],
        round: RoundId,
        events: &mut Vec<TieBreakEvent>,
    ) -> Result<CandidateId, AbortCause> {
        let best = pool
            .iter()
            .map(|&c| tally[c.0 as usize])
            .max()
            .ok_or(AbortCause::NoProgress)?;
        let tied: Vec<CandidateId> = pool
            .iter()
            .copied()
            .filter(|&c| tally[c.0 as usize] == best)
            .collect();
        if tied.len() == 1 {
            Ok(tied[0])
        } else {
            self.break_tie(&tied, TieBreakDirection::SelectHighest, round, tally, events)
        }
    }

    fn sorted_descending(&self, pool: &[CandidateId], tally: &[FixedDecimal]) -> Vec<CandidateId> {
        let mut sorted = pool.to_vec();
        sorted.sort_by(|&a, &b| {
            tally[b.0 as usize]
                .cmp(&tally[a.0 as usize])
                .then(a.0.cmp(&b.0))
        });
        sorted
    }

    /// Batch elimination for single-winner contests: drop the largest group
    /// of trailing candidates whose combined votes are strictly below the
    /// next candidate up, since none of them could ever catch up.
    fn batch_eliminations(
        &self,
        tally: &[FixedDecimal],
        continuing: &[CandidateId],
    ) -> Option<Vec<CandidateId>> {
        let mut sorted = continuing.to_vec();
        sorted.sort_by(|&a, &b| {
            tally[a.0 as usize]
                .cmp(&tally[b.0 as usize])
                .then(a.0.cmp(&b.0))
        });
        let mut cumulative = FixedDecimal::zero(self.scale);
        let mut cut = 0usize;
        for (idx, &cid) in sorted.iter().enumerate() {
            if idx > 0 && cumulative < tally[cid.0 as usize] {
                cut = idx;
            }
            cumulative += tally[cid.0 as usize];
        }
        if cut > 0 {
            Some(sorted[..cut].to_vec())
        } else {
            None
        }
    }

    /// Picks who leaves in a round that elected nobody: the undeclared pool
    /// first, then everyone under the minimum vote threshold, then a batch
    /// when enabled, otherwise the single lowest tally.
    fn choose_eliminations(
        &mut self,
        tally: &[FixedDecimal],
        continuing: &[CandidateId],
        round: RoundId,
        events: &mut Vec<TieBreakEvent>,
    ) -> Result<Vec<CandidateId>, AbortCause> {
        if let Some(uwi) = self.registry.undeclared_id() {
            if self.standing[uwi.0 as usize] == Standing::Continuing {
                return Ok(vec![uwi]);
            }
        }
        if let Some(min) = self.rules.minimum_vote_threshold {
            let floor = FixedDecimal::from_integer(min, self.scale)
                .map_err(|_| AbortCause::ArithmeticOutOfRange)?;
            let below: Vec<CandidateId> = continuing
                .iter()
                .copied()
                .filter(|&c| tally[c.0 as usize] < floor)
                .collect();
            if !below.is_empty() {
                return Ok(below);
            }
        }
        if self.rules.batch_elimination {
            if let Some(batch) = self.batch_eliminations(tally, continuing) {
                debug!("choose_eliminations: batch of {} candidates", batch.len());
                return Ok(batch);
            }
        }
        if continuing.len() < 2 {
            return Err(AbortCause::NoProgress);
        }
        let lowest = continuing
            .iter()
            .map(|&c| tally[c.0 as usize])
            .min()
            .ok_or(AbortCause::NoProgress)?;
        let tied: Vec<CandidateId> = continuing
            .iter()
            .copied()
            .filter(|&c| tally[c.0 as usize] == lowest)
            .collect();
        if tied.len() == 1 {
            Ok(tied)
        } else {
            let chosen =
                self.break_tie(&tied, TieBreakDirection::SelectLowest, round, tally, events)?;
            Ok(vec![chosen])
        }
    }

    fn decide(
        &mut self,
        tally: &[FixedDecimal],
        threshold: &FixedDecimal,
        continuing: &[CandidateId],
        round: RoundId,
        events: &mut Vec<TieBreakEvent>,
    ) -> Result<RoundDecision, AbortCause> {
        let electable = self.electable_ids(continuing);
        let remaining = self.seats as usize - self.winners.len();
        let elect_terminal = |elected: Vec<CandidateId>| RoundDecision {
            elected,
            eliminated: Vec::new(),
            terminal: true,
        };
        let eliminate = |eliminated: Vec<CandidateId>| RoundDecision {
            elected: Vec::new(),
            eliminated,
            terminal: false,
        };
        match self.mode {
            MultiSeatMode::SingleWinner | MultiSeatMode::Sequential => {
                if continuing.len() <= 2 {
                    let winner = self.top_of(&electable, tally, round, events)?;
                    return Ok(elect_terminal(vec![winner]));
                }
                if let Some(&winner) = electable
                    .iter()
                    .find(|&&c| tally[c.0 as usize] >= *threshold)
                {
                    return Ok(elect_terminal(vec![winner]));
                }
                let eliminated = self.choose_eliminations(tally, continuing, round, events)?;
                Ok(eliminate(eliminated))
            }
            MultiSeatMode::ContinueUntilTwoRemain => {
                if continuing.len() <= 2 {
                    let winner = self.top_of(&electable, tally, round, events)?;
                    return Ok(elect_terminal(vec![winner]));
                }
                let eliminated = self.choose_eliminations(tally, continuing, round, events)?;
                Ok(eliminate(eliminated))
            }
            MultiSeatMode::BottomsUp => {
                if electable.len() <= remaining {
                    let all = self.sorted_descending(&electable, tally);
                    return Ok(elect_terminal(all));
                }
                let eliminated = self.choose_eliminations(tally, continuing, round, events)?;
                Ok(eliminate(eliminated))
            }
            MultiSeatMode::StandardStv => {
                if electable.len() <= remaining {
                    let all = self.sorted_descending(&electable, tally);
                    return Ok(elect_terminal(all));
                }
                let qualified: Vec<CandidateId> = electable
                    .iter()
                    .copied()
                    .filter(|&c| tally[c.0 as usize] >= *threshold)
                    .collect();
                if !qualified.is_empty() {
                    let mut elected =
                        if self.rules.allow_only_one_winner_per_round && qualified.len() > 1 {
                            vec![self.top_of(&qualified, tally, round, events)?]
                        } else {
                            self.sorted_descending(&qualified, tally)
                        };
                    elected.truncate(remaining);
                    let terminal = self.winners.len() + elected.len() >= self.seats as usize;
                    return Ok(RoundDecision {
                        elected,
                        eliminated: Vec::new(),
                        terminal,
                    });
                }
                if self.rules.allow_only_one_winner_per_round && !self.pending_surplus.is_empty() {
                    // The round's progress is the pending surplus distribution.
                    return Ok(RoundDecision {
                        elected: Vec::new(),
                        eliminated: Vec::new(),
                        terminal: false,
                    });
                }
                let eliminated = self.choose_eliminations(tally, continuing, round, events)?;
                Ok(eliminate(eliminated))
            }
        }
    }

    /// Distributes the surplus of `c`: every ballot counting for them is
    /// scaled by `surplus / tally` and moved to its next continuing
    /// preference. The candidate retains exactly the quota; truncation
    /// losses go to the residual bucket.
    fn transfer_surplus(
        &mut self,
        c: CandidateId,
        tally_value: FixedDecimal,
        quota: FixedDecimal,
        destinations: &HashSet<CandidateId>,
    ) -> Result<(Option<FixedDecimal>, Option<TransferRecord>), AbortCause> {
        self.standing[c.0 as usize] = Standing::Elected;
        if tally_value <= quota {
            // The whole tally is consumed by the quota.
            self.held[c.0 as usize] = Some(tally_value);
            for i in 0..self.ballots.len() {
                if self.assigned[i] == Some(c) {
                    self.ballots[i].weight = FixedDecimal::zero(self.scale);
                }
            }
            return Ok((None, None));
        }
        let fraction = surplus_fraction(&tally_value, &quota)
            .map_err(|_| AbortCause::ArithmeticOutOfRange)?;
        let surplus = tally_value - quota;
        self.held[c.0 as usize] = Some(quota);
        let mut ledger = TransferLedger::new(c, self.scale);
        let mut moved = FixedDecimal::zero(self.scale);
        for i in 0..self.ballots.len() {
            if self.assigned[i] != Some(c) || self.ballots[i].weight.is_zero() {
                continue;
            }
            let scaled = self.ballots[i]
                .weight
                .mul_truncating(&fraction)
                .map_err(|_| AbortCause::ArithmeticOutOfRange)?;
            moved += scaled;
            match interpret(&self.ballots[i].slots, destinations, &self.settings) {
                Interpretation::Vote(d) => {
                    ledger.credit(d, scaled);
                    self.ballots[i].weight = scaled;
                }
                Interpretation::Exhaust(reason) => {
                    ledger.exhaust(scaled);
                    self.carry_exhaust.bucket(reason, scaled);
                    self.ballots[i].weight = FixedDecimal::zero(self.scale);
                }
            }
        }
        let residual = surplus - moved;
        ledger.add_residual(residual);
        self.carry_residual += residual;
        Ok((Some(fraction), Some(ledger.into_record(self.registry))))
    }

    /// Whole-ballot transfer away from an eliminated candidate.
    fn transfer_elimination(
        &mut self,
        e: CandidateId,
        destinations: &HashSet<CandidateId>,
    ) -> TransferRecord {
        let mut ledger = TransferLedger::new(e, self.scale);
        for i in 0..self.ballots.len() {
            if self.assigned[i] != Some(e) || self.ballots[i].weight.is_zero() {
                continue;
            }
            let weight = self.ballots[i].weight;
            match interpret(&self.ballots[i].slots, destinations, &self.settings) {
                Interpretation::Vote(d) => ledger.credit(d, weight),
                Interpretation::Exhaust(reason) => {
                    ledger.exhaust(weight);
                    self.carry_exhaust.bucket(reason, weight);
                    self.ballots[i].weight = FixedDecimal::zero(self.scale);
                }
            }
        }
        ledger.into_record(self.registry)
    }

    fn log_round(&self) {
        if let Some(snapshot) = self.rounds.last() {
            info!(
                "Round {} (winning threshold: {})",
                snapshot.round, snapshot.threshold
            );
            for (name, count) in &snapshot.tally {
                let status = if snapshot.elected.iter().any(|e| e.name == *name) {
                    "elected"
                } else if snapshot.eliminated.contains(name) {
                    "eliminated"
                } else {
                    "running"
                };
                info!("{:>12} {} -> {}", count.to_string(), name, status);
            }
        }
    }

    fn run(&mut self) -> Result<(), AbortCause> {
        loop {
            if self.rounds.len() >= MAX_ROUNDS {
                return Err(AbortCause::NoProgress);
            }
            let round = self.round_offset + self.rounds.len() as u32 + 1;
            let (tally, fresh_exhaust) = self.count_ballots();
            let mut window =
                std::mem::replace(&mut self.carry_exhaust, ExhaustionDelta::zero(self.scale));
            window.merge(&fresh_exhaust);
            self.cumulative_exhausted += window.total();
            let residual_settled =
                std::mem::replace(&mut self.carry_residual, FixedDecimal::zero(self.scale));
            self.cumulative_residual += residual_settled;

            let view = self.tally_view(&tally);
            let continuing = self.continuing_ids();
            if continuing.is_empty() {
                return Err(AbortCause::NoProgress);
            }
            let active = continuing
                .iter()
                .fold(FixedDecimal::zero(self.scale), |acc, &c| {
                    acc + tally[c.0 as usize]
                });
            let threshold = winning_threshold(&active, self.seats, self.rules)
                .map_err(|_| AbortCause::ArithmeticOutOfRange)?;
            debug!(
                "run: round {} active {} threshold {} continuing {}",
                round,
                active,
                threshold,
                continuing.len()
            );

            let mut events: Vec<TieBreakEvent> = Vec::new();
            let decision = self.decide(&tally, &threshold, &continuing, round, &mut events)?;

            let mut elected_records: Vec<ElectionRecord> = Vec::new();
            let mut transfers: Vec<TransferRecord> = Vec::new();
            for &c in &decision.elected {
                self.winners.push(c);
                self.standing[c.0 as usize] = Standing::PendingSurplus;
                self.election_threshold[c.0 as usize] = Some(threshold);
            }
            for &e in &decision.eliminated {
                self.standing[e.0 as usize] = Standing::Eliminated;
            }

            if decision.terminal {
                for &c in &decision.elected {
                    let v = tally[c.0 as usize];
                    let surplus = if v >= threshold {
                        v - threshold
                    } else {
                        FixedDecimal::zero(self.scale)
                    };
                    let fraction = if surplus.is_zero() {
                        None
                    } else {
                        Some(
                            surplus_fraction(&v, &threshold)
                                .map_err(|_| AbortCause::ArithmeticOutOfRange)?,
                        )
                    };
                    elected_records.push(ElectionRecord {
                        name: self.registry.name(c).to_string(),
                        tally: v,
                        surplus,
                        transfer_fraction: fraction,
                    });
                    self.standing[c.0 as usize] = Standing::Elected;
                    self.held[c.0 as usize] = Some(v);
                }
            } else {
                let destinations = self.continuing_set();
                for &c in &decision.elected {
                    let v = tally[c.0 as usize];
                    let surplus = if v >= threshold {
                        v - threshold
                    } else {
                        FixedDecimal::zero(self.scale)
                    };
                    if self.rules.allow_only_one_winner_per_round {
                        self.pending_surplus.push_back(c);
                        elected_records.push(ElectionRecord {
                            name: self.registry.name(c).to_string(),
                            tally: v,
                            surplus,
                            transfer_fraction: None,
                        });
                    } else {
                        let (fraction, transfer) =
                            self.transfer_surplus(c, v, threshold, &destinations)?;
                        elected_records.push(ElectionRecord {
                            name: self.registry.name(c).to_string(),
                            tally: v,
                            surplus,
                            transfer_fraction: fraction,
                        });
                        if let Some(t) = transfer {
                            transfers.push(t);
                        }
                    }
                }
                // At most one deferred surplus is distributed per round.
                if self.rules.allow_only_one_winner_per_round {
                    if let Some(c) = self.pending_surplus.pop_front() {
                        let v = tally[c.0 as usize];
                        let quota = self.election_threshold[c.0 as usize].unwrap_or(threshold);
                        let (_, transfer) = self.transfer_surplus(c, v, quota, &destinations)?;
                        if let Some(t) = transfer {
                            transfers.push(t);
                        }
                    }
                }
                for &e in &decision.eliminated {
                    transfers.push(self.transfer_elimination(e, &destinations));
                }
            }

            let mut eliminated_names: Vec<String> = decision
                .eliminated
                .iter()
                .map(|&e| self.registry.name(e).to_string())
                .collect();
            eliminated_names.sort();
            self.committed_tallies.push(tally);
            self.rounds.push(RoundSnapshot {
                round,
                tally: view,
                threshold,
                elected: elected_records,
                eliminated: eliminated_names,
                transfers,
                exhausted: window,
                cumulative_exhausted: self.cumulative_exhausted,
                cumulative_residual: self.cumulative_residual,
                tie_breaks: events,
            });
            self.log_round();

            if decision.terminal || self.winners.len() >= self.seats as usize {
                return Ok(());
            }
        }
    }
}

fn permutation_names(tiebreaker: &TieBreaker, registry: &Registry) -> Option<Vec<String>> {
    tiebreaker
        .permutation()
        .map(|ids| ids.iter().map(|&c| registry.name(c).to_string()).collect())
}

fn seal_record(
    rules: &TabulationRules,
    registry: &Registry,
    permutation: Option<Vec<String>>,
    rounds: Vec<RoundSnapshot>,
    winners: &[CandidateId],
    failure: Option<(RoundId, AbortCause)>,
) -> Result<TabulationRecord, TabulationError> {
    let mut record = TabulationRecord {
        seats: rules.number_of_winners,
        random_seed: rules.random_seed,
        candidate_permutation: permutation,
        rounds,
        winners: winners
            .iter()
            .map(|&c| registry.name(c).to_string())
            .collect(),
        terminated_abnormally: false,
        failed_round: None,
    };
    match failure {
        None => Ok(record),
        Some((round, cause)) => {
            record.terminated_abnormally = true;
            record.failed_round = Some(round);
            Err(TabulationError::Aborted {
                round,
                cause,
                record: Box::new(record),
            })
        }
    }
}

fn run_sequential(
    rules: &TabulationRules,
    data: &ContestData,
    mut oracle: Option<&mut dyn TieBreakOracle>,
) -> Result<TabulationRecord, TabulationError> {
    let mut all_rounds: Vec<RoundSnapshot> = Vec::new();
    let mut winners: Vec<CandidateId> = Vec::new();
    let mut permutation: Option<Vec<String>> = None;
    for _ in 0..rules.number_of_winners {
        let tiebreaker = TieBreaker::new(rules.tiebreak_mode, rules.random_seed, &data.declared_order);
        if permutation.is_none() {
            permutation = permutation_names(&tiebreaker, &data.registry);
        }
        let mut excluded = data.excluded.clone();
        excluded.extend(winners.iter().copied());
        let mut pass = Tabulation::new(
            rules,
            &data.registry,
            data.ballots.clone(),
            &excluded,
            1,
            MultiSeatMode::SingleWinner,
            all_rounds.len() as u32,
            tiebreaker,
            oracle.as_mut().map(|o| &mut **o as &mut dyn TieBreakOracle),
            data.declared_order.len(),
        );
        let outcome = pass.run();
        let failure = outcome
            .err()
            .map(|cause| (pass.round_offset + pass.rounds.len() as u32 + 1, cause));
        let pass_winner = pass.winners.first().copied();
        all_rounds.append(&mut pass.rounds);
        if failure.is_some() {
            return seal_record(rules, &data.registry, permutation, all_rounds, &winners, failure);
        }
        if let Some(w) = pass_winner {
            winners.push(w);
        }
    }
    seal_record(rules, &data.registry, permutation, all_rounds, &winners, None)
}

fn run_with(
    builder: &Builder,
    mut oracle: Option<&mut dyn TieBreakOracle>,
) -> Result<TabulationRecord, TabulationError> {
    let rules = &builder.rules;
    rules.validate()?;
    if rules.tiebreak_mode.needs_oracle() && oracle.is_none() {
        return Err(TabulationError::ConfigInvalid {
            reason: "the interactive tie-break modes need an oracle".to_string(),
        });
    }
    let data = ingest(builder, rules.decimal_places)?;
    let eligible = data.declared_order.len() - data.excluded.len();
    if rules.number_of_winners as usize > eligible {
        return Err(TabulationError::ConfigInvalid {
            reason: "more seats than eligible candidates".to_string(),
        });
    }
    info!(
        "run_contest: processing {} ballot records over {} candidates",
        data.ballots.len(),
        data.declared_order.len()
    );
    for cid in data.registry.ids() {
        info!("Candidate {}: {}", cid.0 + 1, data.registry.name(cid));
    }
    match rules.multi_seat_mode {
        MultiSeatMode::Sequential => run_sequential(rules, &data, oracle),
        mode => {
            let tiebreaker =
                TieBreaker::new(rules.tiebreak_mode, rules.random_seed, &data.declared_order);
            let permutation = permutation_names(&tiebreaker, &data.registry);
            let mut tabulation = Tabulation::new(
                rules,
                &data.registry,
                data.ballots.clone(),
                &data.excluded,
                rules.number_of_winners,
                mode,
                0,
                tiebreaker,
                oracle.as_mut().map(|o| &mut **o as &mut dyn TieBreakOracle),
                data.declared_order.len(),
            );
            let outcome = tabulation.run();
            let failure = outcome
                .err()
                .map(|cause| (tabulation.rounds.len() as u32 + 1, cause));
            let rounds = std::mem::take(&mut tabulation.rounds);
            let winners = tabulation.winners.clone();
            seal_record(rules, &data.registry, permutation, rounds, &winners, failure)
        }
    }
}

/// Runs a contest assembled with [`Builder`] and returns the completed
/// record.
pub fn run_contest(builder: &Builder) -> Result<TabulationRecord, TabulationError> {
    run_with(builder, None)
}

/// Runs a contest whose tie-break mode suspends on an external decision
/// maker. The engine blocks inside the oracle call; a cancellation aborts
/// the whole tabulation.
pub fn run_contest_with_oracle(
    builder: &Builder,
    oracle: &mut dyn TieBreakOracle,
) -> Result<TabulationRecord, TabulationError> {
    run_with(builder, Some(oracle))
}

/// Runs a contest from plain ranked name lists (convenience interface).
/// Every name encountered is taken as a declared candidate.
///
/// ```
/// use ranked_tabulation::TabulationRules;
/// # use ranked_tabulation::TabulationError;
/// # let _ = env_logger::try_init();
///
/// let record = ranked_tabulation::run_contest_simple(&[
///     vec!["Alice", "Bob", "Charlie"],
///     vec!["Alice"],
///     vec!["Bob", "Alice", "Charlie"],
/// ], &TabulationRules::default())?;
///
/// assert_eq!(record.winners, vec!["Alice".to_string()]);
///
/// # Ok::<(), TabulationError>(())
/// ```
pub fn run_contest_simple(
    votes: &[Vec<&str>],
    rules: &TabulationRules,
) -> Result<TabulationRecord, TabulationError> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for ballot in votes {
        for choice in ballot {
            if !choice.is_empty() {
                names.insert(choice.to_string());
            }
        }
    }
    let declared: Vec<String> = names.into_iter().collect();
    let mut builder = Builder::new(rules)?.candidates(&declared)?;
    for ballot in votes {
        let ranks: Vec<String> = ballot.iter().map(|c| c.to_string()).collect();
        builder.add_ballot_simple(&ranks)?;
    }
    run_contest(&builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fd(text: &str) -> FixedDecimal {
        FixedDecimal::parse_with_scale(text, 4).unwrap()
    }

    fn builder_with(rules: &TabulationRules, candidates: &[&str]) -> Builder {
        let names: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
        Builder::new(rules).unwrap().candidates(&names).unwrap()
    }

    fn add(builder: &mut Builder, count: u64, ranks: &[&str]) {
        let groups: Vec<Vec<String>> = ranks
            .iter()
            .map(|r| {
                if r.is_empty() {
                    vec![String::new()]
                } else {
                    vec![r.to_string()]
                }
            })
            .collect();
        builder.add_ballot(&groups, count).unwrap();
    }

    /// Checks the accounting invariants on every round of a record: reported
    /// tallies plus cumulative exhaustion plus cumulative residual add back
    /// up to the initial weight, and both cumulative buckets only grow.
    fn assert_conserved(record: &TabulationRecord, total: &str) {
        let total = fd(total);
        let mut last_exhausted = FixedDecimal::zero(4);
        let mut last_residual = FixedDecimal::zero(4);
        for round in &record.rounds {
            let tallied = round
                .tally
                .iter()
                .fold(FixedDecimal::zero(4), |acc, (_, v)| acc + *v);
            assert_eq!(
                total,
                tallied + round.cumulative_exhausted + round.cumulative_residual,
                "conservation broken in round {}",
                round.round
            );
            assert!(
                round.cumulative_exhausted >= last_exhausted,
                "exhaustion shrank in round {}",
                round.round
            );
            assert!(
                round.cumulative_residual >= last_residual,
                "residual shrank in round {}",
                round.round
            );
            last_exhausted = round.cumulative_exhausted;
            last_residual = round.cumulative_residual;
        }
    }

    #[test]
    fn majority_in_round_one() {
        let _ = env_logger::try_init();
        let mut builder = builder_with(&TabulationRules::DEFAULT_RULES, &["A", "B", "C"]);
        add(&mut builder, 5, &["A"]);
        let record = run_contest(&builder).unwrap();
        assert_eq!(vec!["A".to_string()], record.winners);
        assert_eq!(1, record.rounds.len());
        let round = &record.rounds[0];
        assert_eq!(fd("3"), round.threshold);
        assert_eq!(1, round.elected.len());
        assert_eq!("A", round.elected[0].name);
        assert_eq!(fd("5"), round.elected[0].tally);
        assert!(!record.terminated_abnormally);
        assert_conserved(&record, "5");
    }

    #[test]
    fn two_round_elimination_with_transfer() {
        let _ = env_logger::try_init();
        let mut builder = builder_with(&TabulationRules::DEFAULT_RULES, &["A", "B", "C"]);
        add(&mut builder, 3, &["A", "C"]);
        add(&mut builder, 2, &["B", "C"]);
        add(&mut builder, 2, &["C", "A"]);
        let record = run_contest(&builder).unwrap();
        assert_eq!(vec!["C".to_string()], record.winners);
        assert_eq!(2, record.rounds.len());

        let first = &record.rounds[0];
        assert_eq!(fd("4"), first.threshold);
        assert!(first.elected.is_empty());
        // B and C tie at 2; the configured order A,B,C eliminates B.
        assert_eq!(vec!["B".to_string()], first.eliminated);
        assert_eq!(1, first.tie_breaks.len());
        assert_eq!("B", first.tie_breaks[0].selected);
        assert_eq!(TieBreakDirection::SelectLowest, first.tie_breaks[0].direction);
        assert_eq!(1, first.transfers.len());
        assert_eq!("B", first.transfers[0].from);
        assert_eq!(vec![("C".to_string(), fd("2"))], first.transfers[0].to);

        let second = &record.rounds[1];
        assert_eq!(
            vec![("C".to_string(), fd("4")), ("A".to_string(), fd("3"))],
            second.tally
        );
        assert_eq!(1, second.elected.len());
        assert_eq!("C", second.elected[0].name);
        assert_conserved(&record, "7");
    }

    #[test]
    fn stv_both_winners_in_round_one() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            multi_seat_mode: MultiSeatMode::StandardStv,
            number_of_winners: 2,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B"]);
        add(&mut builder, 6, &["A", "B"]);
        add(&mut builder, 4, &["B", "A"]);
        let record = run_contest(&builder).unwrap();
        assert_eq!(vec!["A".to_string(), "B".to_string()], record.winners);
        assert_eq!(1, record.rounds.len());
        let round = &record.rounds[0];
        // Droop: floor(10 / 3) + 1 = 4.
        assert_eq!(fd("4"), round.threshold);
        let a = &round.elected[0];
        assert_eq!("A", a.name);
        assert_eq!(fd("2"), a.surplus);
        assert_eq!(Some(fd("0.3333")), a.transfer_fraction);
        let b = &round.elected[1];
        assert_eq!("B", b.name);
        assert_eq!(fd("0"), b.surplus);
        assert_eq!(None, b.transfer_fraction);
        assert_conserved(&record, "10");
    }

    #[test]
    fn stv_surplus_transfer_carries_fractions() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            multi_seat_mode: MultiSeatMode::StandardStv,
            number_of_winners: 2,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C"]);
        add(&mut builder, 12, &["A", "B"]);
        add(&mut builder, 4, &["B"]);
        add(&mut builder, 4, &["C"]);
        let record = run_contest(&builder).unwrap();
        assert_eq!(vec!["A".to_string(), "B".to_string()], record.winners);
        assert_eq!(2, record.rounds.len());

        let first = &record.rounds[0];
        // Droop: floor(20 / 3) + 1 = 7; A holds 12, surplus 5.
        assert_eq!(fd("7"), first.threshold);
        assert_eq!(fd("5"), first.elected[0].surplus);
        assert_eq!(Some(fd("0.4166")), first.elected[0].transfer_fraction);
        assert_eq!(1, first.transfers.len());
        let transfer = &first.transfers[0];
        assert_eq!("A", transfer.from);
        // 12 ballots scaled to 0.4166 each.
        assert_eq!(vec![("B".to_string(), fd("4.9992"))], transfer.to);
        assert_eq!(fd("0.0008"), transfer.residual);

        let second = &record.rounds[1];
        assert_eq!(fd("0.0008"), second.cumulative_residual);
        let b_tally = second
            .tally
            .iter()
            .find(|(name, _)| name == "B")
            .map(|(_, v)| *v)
            .unwrap();
        assert_eq!(fd("8.9992"), b_tally);
        assert_conserved(&record, "20");
    }

    #[test]
    fn continue_until_two_remain_defers_the_win() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            multi_seat_mode: MultiSeatMode::ContinueUntilTwoRemain,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C"]);
        add(&mut builder, 5, &["A"]);
        add(&mut builder, 2, &["B", "A"]);
        add(&mut builder, 1, &["C"]);
        let record = run_contest(&builder).unwrap();
        // A holds a majority in round 1 but the count continues to the final
        // pair before the win is declared.
        assert_eq!(2, record.rounds.len());
        assert!(record.rounds[0].elected.is_empty());
        assert_eq!(vec!["C".to_string()], record.rounds[0].eliminated);
        assert_eq!("A", record.rounds[1].elected[0].name);
        assert_eq!(vec!["A".to_string()], record.winners);
    }

    #[test]
    fn skipped_ranks_exhaust_in_round_one() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            max_skipped_ranks_allowed: MaxSkippedRanks::AtMost(1),
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B"]);
        add(&mut builder, 1, &["", "", "A"]);
        add(&mut builder, 3, &["B"]);
        let record = run_contest(&builder).unwrap();
        let first = &record.rounds[0];
        assert_eq!(fd("1"), first.exhausted.skipped_ranks);
        let a_tally = first
            .tally
            .iter()
            .find(|(name, _)| name == "A")
            .map(|(_, v)| *v)
            .unwrap();
        assert_eq!(fd("0"), a_tally);
        assert_eq!(vec!["B".to_string()], record.winners);
        assert_conserved(&record, "4");
    }

    #[test]
    fn duplicate_exhausts_where_the_duplicate_is_reached() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            duplicate_candidate_mode: DuplicateCandidateMode::Exhaust,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C"]);
        add(&mut builder, 1, &["A", "A", "B"]);
        add(&mut builder, 3, &["B"]);
        add(&mut builder, 2, &["C"]);
        let record = run_contest(&builder).unwrap();
        // Round 1: the ballot counts for A; A is eliminated and the move to
        // the next preference hits the duplicate.
        let first = &record.rounds[0];
        assert_eq!(vec!["A".to_string()], first.eliminated);
        assert_eq!(fd("1"), first.transfers[0].exhausted);
        let second = &record.rounds[1];
        assert_eq!(fd("1"), second.exhausted.duplicate);
        assert_eq!(vec!["B".to_string()], record.winners);
        assert_conserved(&record, "6");
    }

    #[test]
    fn overvote_at_first_rank_exhausts_immediately() {
        let _ = env_logger::try_init();
        let mut builder = builder_with(&TabulationRules::DEFAULT_RULES, &["A", "B"]);
        builder
            .add_ballot(&[vec!["A".to_string(), "B".to_string()]], 1)
            .unwrap();
        add(&mut builder, 3, &["A"]);
        add(&mut builder, 2, &["B"]);
        let record = run_contest(&builder).unwrap();
        let first = &record.rounds[0];
        assert_eq!(fd("1"), first.exhausted.overvote);
        assert_eq!(fd("1"), first.cumulative_exhausted);
        // Active weight is 5, majority 3, A elected.
        assert_eq!(fd("3"), first.threshold);
        assert_eq!(vec!["A".to_string()], record.winners);
        assert_conserved(&record, "6");
    }

    #[test]
    fn undeclared_write_ins_count_then_leave_first() {
        let _ = env_logger::try_init();
        let mut builder =
            builder_with(&TabulationRules::DEFAULT_RULES, &["A", "B"]).allow_undeclared_write_ins(true);
        add(&mut builder, 2, &["Zed", "A"]);
        add(&mut builder, 2, &["B"]);
        add(&mut builder, 3, &["A"]);
        let record = run_contest(&builder).unwrap();
        let first = &record.rounds[0];
        let uwi_tally = first
            .tally
            .iter()
            .find(|(name, _)| name == UNDECLARED_WRITE_IN_NAME)
            .map(|(_, v)| *v)
            .unwrap();
        assert_eq!(fd("2"), uwi_tally);
        assert_eq!(vec![UNDECLARED_WRITE_IN_NAME.to_string()], first.eliminated);
        assert_eq!(vec!["A".to_string()], record.winners);
        assert!(!record
            .winners
            .iter()
            .any(|w| w == UNDECLARED_WRITE_IN_NAME));
        assert_conserved(&record, "7");
    }

    #[test]
    fn unrecognized_names_reject_the_tabulation() {
        let mut builder = builder_with(&TabulationRules::DEFAULT_RULES, &["A", "B"]);
        add(&mut builder, 1, &["A", "Zed"]);
        let err = run_contest(&builder).unwrap_err();
        assert_eq!(
            TabulationError::UnrecognizedCandidates {
                names: vec!["Zed".to_string()]
            },
            err
        );
    }

    #[test]
    fn minimum_vote_threshold_eliminates_in_batch() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            minimum_vote_threshold: Some(3),
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C", "D"]);
        add(&mut builder, 5, &["A"]);
        add(&mut builder, 4, &["B"]);
        add(&mut builder, 2, &["C", "A"]);
        add(&mut builder, 1, &["D", "B"]);
        let record = run_contest(&builder).unwrap();
        let first = &record.rounds[0];
        assert_eq!(vec!["C".to_string(), "D".to_string()], first.eliminated);
        assert_eq!(vec!["A".to_string()], record.winners);
        assert_conserved(&record, "12");
    }

    #[test]
    fn batch_elimination_drops_the_hopeless_tail() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            batch_elimination: true,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C", "D"]);
        add(&mut builder, 12, &["A"]);
        add(&mut builder, 7, &["B"]);
        add(&mut builder, 3, &["C", "B"]);
        add(&mut builder, 2, &["D", "B"]);
        let record = run_contest(&builder).unwrap();
        let first = &record.rounds[0];
        // C and D together hold 5 < 7, so both go at once.
        assert_eq!(vec!["C".to_string(), "D".to_string()], first.eliminated);
        let second = &record.rounds[1];
        // A and B tie 12 against 12; the configured order selects the later
        // name for the win.
        assert_eq!(1, second.tie_breaks.len());
        assert_eq!(vec!["B".to_string()], record.winners);
        assert_conserved(&record, "24");
    }

    #[test]
    fn allow_only_one_winner_per_round_defers_surpluses() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            multi_seat_mode: MultiSeatMode::StandardStv,
            number_of_winners: 2,
            allow_only_one_winner_per_round: true,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C"]);
        add(&mut builder, 10, &["A", "C"]);
        add(&mut builder, 8, &["B", "C"]);
        add(&mut builder, 2, &["C"]);
        let record = run_contest(&builder).unwrap();
        assert_eq!(vec!["A".to_string(), "B".to_string()], record.winners);
        assert_eq!(2, record.rounds.len());
        let first = &record.rounds[0];
        // Only A is elected despite B also clearing the quota of 7.
        assert_eq!(1, first.elected.len());
        assert_eq!("A", first.elected[0].name);
        assert_eq!(fd("3"), first.elected[0].surplus);
        // A's surplus moves in the same round: 10 ballots at 0.3 each.
        assert_eq!(1, first.transfers.len());
        assert_eq!(vec![("C".to_string(), fd("3"))], first.transfers[0].to);
        let second = &record.rounds[1];
        assert_eq!("B", second.elected[0].name);
        assert_conserved(&record, "20");
    }

    #[test]
    fn bottoms_up_elects_the_survivors_together() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            multi_seat_mode: MultiSeatMode::BottomsUp,
            number_of_winners: 2,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C", "D"]);
        add(&mut builder, 5, &["A"]);
        add(&mut builder, 4, &["B"]);
        add(&mut builder, 2, &["C", "B"]);
        add(&mut builder, 1, &["D", "C"]);
        let record = run_contest(&builder).unwrap();
        assert_eq!(3, record.rounds.len());
        // No mid-count elections at all.
        assert!(record.rounds[0].elected.is_empty());
        assert!(record.rounds[1].elected.is_empty());
        // Final pair elected together, higher tally first: B ends at 6.
        assert_eq!(vec!["B".to_string(), "A".to_string()], record.winners);
        assert_conserved(&record, "12");
    }

    #[test]
    fn sequential_passes_restart_without_prior_winners() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            multi_seat_mode: MultiSeatMode::Sequential,
            number_of_winners: 2,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C"]);
        add(&mut builder, 4, &["A", "B"]);
        add(&mut builder, 3, &["B"]);
        add(&mut builder, 2, &["C"]);
        let record = run_contest(&builder).unwrap();
        assert_eq!(vec!["A".to_string(), "B".to_string()], record.winners);
        // Pass one takes two rounds (C eliminated, then A wins); pass two
        // re-reads every ballot without A and B wins immediately.
        assert_eq!(3, record.rounds.len());
        assert_eq!(3, record.rounds[2].round);
        let final_b = record.rounds[2]
            .tally
            .iter()
            .find(|(name, _)| name == "B")
            .map(|(_, v)| *v)
            .unwrap();
        assert_eq!(fd("7"), final_b);
    }

    #[test]
    fn excluded_candidates_never_enter_the_count() {
        let _ = env_logger::try_init();
        let declared = vec![
            Candidate::new("A"),
            Candidate {
                name: "B".to_string(),
                code: None,
                excluded: true,
            },
            Candidate::new("C"),
        ];
        let mut builder = Builder::new(&TabulationRules::DEFAULT_RULES)
            .unwrap()
            .candidates_full(&declared)
            .unwrap();
        add(&mut builder, 3, &["B", "A"]);
        add(&mut builder, 2, &["C"]);
        let record = run_contest(&builder).unwrap();
        let first = &record.rounds[0];
        assert!(first.tally.iter().all(|(name, _)| name != "B"));
        // Ballots marking B fall through to their next preference.
        let a_tally = first
            .tally
            .iter()
            .find(|(name, _)| name == "A")
            .map(|(_, v)| *v)
            .unwrap();
        assert_eq!(fd("3"), a_tally);
        assert_eq!(vec!["A".to_string()], record.winners);
    }

    #[test]
    fn identical_inputs_yield_identical_records() {
        let _ = env_logger::try_init();
        let rules = TabulationRules {
            tiebreak_mode: TieBreakMode::Random,
            random_seed: Some(20_220_831),
            ..TabulationRules::DEFAULT_RULES
        };
        let run = || {
            let mut builder = builder_with(&rules, &["A", "B", "C", "D"]);
            add(&mut builder, 3, &["A"]);
            add(&mut builder, 3, &["B"]);
            add(&mut builder, 2, &["C", "A"]);
            add(&mut builder, 2, &["D", "B"]);
            run_contest(&builder).unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn generated_permutation_replays_as_configured_order() {
        let _ = env_logger::try_init();
        let generate = TabulationRules {
            tiebreak_mode: TieBreakMode::GeneratePermutation,
            random_seed: Some(77),
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&generate, &["A", "B", "C", "D"]);
        add(&mut builder, 3, &["A"]);
        add(&mut builder, 3, &["B"]);
        add(&mut builder, 2, &["C", "A"]);
        add(&mut builder, 2, &["D", "B"]);
        let generated = run_contest(&builder).unwrap();
        let permutation = generated.candidate_permutation.clone().unwrap();

        let replay_rules = TabulationRules {
            tiebreak_mode: TieBreakMode::UsePermutationInConfig,
            ..TabulationRules::DEFAULT_RULES
        };
        let perm_refs: Vec<&str> = permutation.iter().map(|s| s.as_str()).collect();
        let mut replay_builder = builder_with(&replay_rules, &perm_refs);
        add(&mut replay_builder, 3, &["A"]);
        add(&mut replay_builder, 3, &["B"]);
        add(&mut replay_builder, 2, &["C", "A"]);
        add(&mut replay_builder, 2, &["D", "B"]);
        let replayed = run_contest(&replay_builder).unwrap();
        assert_eq!(generated.winners, replayed.winners);
        assert_eq!(generated.rounds, replayed.rounds);
    }

    #[test]
    fn interactive_mode_without_oracle_is_rejected() {
        let rules = TabulationRules {
            tiebreak_mode: TieBreakMode::Interactive,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B"]);
        add(&mut builder, 1, &["A"]);
        assert!(matches!(
            run_contest(&builder),
            Err(TabulationError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn cancelled_oracle_aborts_with_a_partial_record() {
        let _ = env_logger::try_init();
        struct Refuses;
        impl TieBreakOracle for Refuses {
            fn decide(&mut self, _request: &TieBreakRequest) -> Option<String> {
                None
            }
        }
        let rules = TabulationRules {
            tiebreak_mode: TieBreakMode::Interactive,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C"]);
        add(&mut builder, 3, &["A"]);
        add(&mut builder, 2, &["B"]);
        add(&mut builder, 2, &["C"]);
        let mut oracle = Refuses;
        match run_contest_with_oracle(&builder, &mut oracle) {
            Err(TabulationError::Aborted {
                round,
                cause,
                record,
            }) => {
                assert_eq!(1, round);
                assert_eq!(AbortCause::TieBreakCancelled, cause);
                assert!(record.terminated_abnormally);
                assert_eq!(Some(1), record.failed_round);
                assert!(record.winners.is_empty());
            }
            other => panic!("expected an aborted tabulation, got {:?}", other),
        }
    }

    #[test]
    fn oracle_decisions_are_recorded() {
        let _ = env_logger::try_init();
        struct PicksLast;
        impl TieBreakOracle for PicksLast {
            fn decide(&mut self, request: &TieBreakRequest) -> Option<String> {
                request.tied.last().cloned()
            }
        }
        let rules = TabulationRules {
            tiebreak_mode: TieBreakMode::StopCountingAndAsk,
            ..TabulationRules::DEFAULT_RULES
        };
        let mut builder = builder_with(&rules, &["A", "B", "C"]);
        add(&mut builder, 3, &["A"]);
        add(&mut builder, 2, &["B", "A"]);
        add(&mut builder, 2, &["C", "A"]);
        let mut oracle = PicksLast;
        let record = run_contest_with_oracle(&builder, &mut oracle).unwrap();
        let first = &record.rounds[0];
        assert_eq!(1, first.tie_breaks.len());
        assert_eq!("C", first.tie_breaks[0].selected);
        assert_eq!(vec!["C".to_string()], first.eliminated);
        assert_eq!(vec!["A".to_string()], record.winners);
    }

    #[test]
    fn rerunning_a_contest_is_idempotent() {
        let _ = env_logger::try_init();
        let rules = TabulationRules::DEFAULT_RULES;
        let votes = vec![
            vec!["A", "B", ""],
            vec!["B", "A", "C"],
            vec!["A", "C", "B"],
            vec!["C", "B", "A"],
        ];
        let first = run_contest_simple(&votes, &rules).unwrap();
        let second = run_contest_simple(&votes, &rules).unwrap();
        assert_eq!(first, second);
    }
}
