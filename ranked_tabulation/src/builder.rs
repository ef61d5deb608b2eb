pub use crate::config::*;

/// Incremental construction of a contest: rules, declared candidates and
/// ballots.
///
/// ```
/// use ranked_tabulation::{Builder, TabulationRules};
/// # use ranked_tabulation::TabulationError;
/// # let _ = env_logger::try_init();
///
/// let mut builder = Builder::new(&TabulationRules::DEFAULT_RULES)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
/// builder.add_ballot_simple(&["Anna".to_string(), "Bob".to_string()])?;
///
/// # Ok::<(), TabulationError>(())
/// ```
pub struct Builder {
    pub(crate) rules: TabulationRules,
    pub(crate) candidates: Option<Vec<Candidate>>,
    pub(crate) ballots: Vec<Ballot>,
    pub(crate) undeclared_allowed: bool,
}

impl Builder {
    /// Validates the rule set and starts an empty contest.
    pub fn new(rules: &TabulationRules) -> Result<Builder, TabulationError> {
        rules.validate()?;
        Ok(Builder {
            rules: rules.clone(),
            candidates: None,
            ballots: Vec::new(),
            undeclared_allowed: false,
        })
    }

    /// Declares the candidates by name. Without a declaration, every name
    /// seen on a ballot is taken as a candidate.
    pub fn candidates(self, names: &[String]) -> Result<Builder, TabulationError> {
        let declared: Vec<Candidate> = names.iter().map(|n| Candidate::new(n)).collect();
        self.candidates_full(&declared)
    }

    /// Declares candidates with codes and exclusion flags.
    pub fn candidates_full(mut self, declared: &[Candidate]) -> Result<Builder, TabulationError> {
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for c in declared {
            if c.name.is_empty() {
                return Err(TabulationError::ConfigInvalid {
                    reason: "candidate names may not be empty".to_string(),
                });
            }
            if !seen.insert(c.name.as_str()) {
                return Err(TabulationError::ConfigInvalid {
                    reason: format!("candidate {:?} is declared twice", c.name),
                });
            }
        }
        self.candidates = Some(declared.to_vec());
        Ok(self)
    }

    /// When set, a ballot mark for an undeclared name counts for the
    /// undeclared write-in pool instead of rejecting the tabulation.
    pub fn allow_undeclared_write_ins(mut self, allowed: bool) -> Builder {
        self.undeclared_allowed = allowed;
        self
    }

    /// Adds one ballot with a single name (possibly empty for a skipped
    /// rank) at each position.
    pub fn add_ballot_simple(&mut self, names: &[String]) -> Result<(), TabulationError> {
        let ranks: Vec<Vec<String>> = names.iter().map(|n| vec![n.clone()]).collect();
        self.add_ballot(&ranks, 1)
    }

    /// Adds a ballot given the marks at each rank position. An empty group is
    /// an undervote, an empty name a blank, several names an overvote.
    pub fn add_ballot(&mut self, ranks: &[Vec<String>], count: u64) -> Result<(), TabulationError> {
        let mut choices: Vec<BallotChoice> = Vec::new();
        for group in ranks {
            let choice = match group.as_slice() {
                [] => BallotChoice::Undervote,
                [s] if s.is_empty() => BallotChoice::Blank,
                [s] => BallotChoice::Candidate(s.clone()),
                _ => BallotChoice::Multiple(group.clone()),
            };
            choices.push(choice);
        }
        self.add_ballot_record(&Ballot::new(choices, count))
    }

    /// Adds a fully resolved ballot record.
    pub fn add_ballot_record(&mut self, ballot: &Ballot) -> Result<(), TabulationError> {
        self.ballots.push(ballot.clone());
        Ok(())
    }
}
