use log::{debug, info, warn};

use ranked_tabulation::*;
use snafu::{prelude::*, OptionExt, ResultExt, Snafu};

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::rcv::config_reader::*;
mod config_reader;
pub mod io_cdf;
pub mod io_common;
pub mod io_csv;
mod io_ess;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RcvError {
    // General
    #[snafu(display("error reading ballot file under {root_path}"))]
    OpeningFile {
        source: Box<RcvError>,
        root_path: String,
    },
    #[snafu(display("no input was provided"))]
    MissingInput {},
    #[snafu(display("unknown provider format {format}"))]
    UnknownFormat { format: String },

    // Excel
    #[snafu(display("error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("the workbook has no readable sheet"))]
    EmptyExcel {},
    #[snafu(display("unexpected cell content at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },

    // CSV
    #[snafu(display("error opening the ballot file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("error reading a ballot line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("ballot line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },

    // Format issues
    #[snafu(display("malformed common data format content"))]
    CdfParsingJson {},
    #[snafu(display("error opening {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("malformed JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("expected a column number"))]
    ParsingJsonNumber {},
    #[snafu(display("cannot resolve the parent directory"))]
    MissingParentDir {},
    #[snafu(display("error opening the configuration file"))]
    ConfigOpeningJson { source: std::io::Error },

    // Reference errors
    #[snafu(display("error opening the reference summary"))]
    ReferenceOpeningFile { source: Box<RcvError> },

    // Summary errors
    #[snafu(display("error writing the summary to {path}"))]
    SummaryWrite {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("tabulation failed: {source}"))]
    RvTabulation { source: TabulationError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RcvResult<T> = Result<T, RcvError>;
pub(crate) type BRcvResult<T> = Result<T, Box<RcvError>>;

/// A ballot as parsed by the readers, before the source labels and the
/// contest rules are applied.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: Option<u64>,
    pub precinct: Option<String>,
    pub choices: Vec<Vec<String>>,
}

fn read_ranking_data(root_path: String, cfs: &FileSource) -> RcvResult<Vec<ParsedBallot>> {
    let p: PathBuf = [root_path.clone(), cfs.file_path.clone()].iter().collect();
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    let parsed = match cfs.provider.as_str() {
        "ess" => io_ess::read_excel_file(p2, cfs).context(OpeningFileSnafu { root_path })?,
        "cdf" => io_cdf::read_json(p2).context(OpeningFileSnafu { root_path })?,
        "csv" => io_csv::read_csv_ranking(p2, cfs).context(OpeningFileSnafu { root_path })?,
        x => {
            return Err(RcvError::UnknownFormat {
                format: x.to_string(),
            })
        }
    };
    Ok(parsed)
}

/// Applies the per-source labels: overvote/undervote sentinels, the
/// undeclared write-in label, blank handling and the overvote delimiter.
/// Candidate-name validity is left to the tabulation core.
fn validate_ballots(
    parsed_ballots: &[ParsedBallot],
    source: &FileSource,
) -> RcvResult<Vec<Ballot>> {
    let treat_blank_as_undeclared_write_in =
        source.treat_blank_as_undeclared_write_in.unwrap_or(false);
    let mut res: Vec<Ballot> = Vec::new();

    for pb in parsed_ballots.iter() {
        let mut choices: Vec<BallotChoice> = Vec::new();
        for group in pb.choices.iter() {
            let mut marks: Vec<String> = Vec::new();
            for s in group.iter() {
                if let Some(delim) = source.overvote_delimiter.as_ref() {
                    if s.contains(delim) {
                        marks.extend(delim_split(s, delim));
                        continue;
                    }
                }
                marks.push(s.clone());
            }
            let choice: BallotChoice = match &marks[..] {
                [] => BallotChoice::Undervote,
                [c] if source.undeclared_write_in_label.as_deref() == Some(c.as_str()) => {
                    BallotChoice::UndeclaredWriteIn
                }
                [c] if source.overvote_label.as_deref() == Some(c.as_str()) => {
                    BallotChoice::Overvote
                }
                [c] if source.undervote_label.as_deref() == Some(c.as_str()) => {
                    BallotChoice::Undervote
                }
                [c] if c.is_empty() => {
                    if treat_blank_as_undeclared_write_in {
                        BallotChoice::UndeclaredWriteIn
                    } else {
                        BallotChoice::Blank
                    }
                }
                [c] => BallotChoice::Candidate(c.clone()),
                _ => BallotChoice::Multiple(marks.clone()),
            };
            choices.push(choice);
        }

        // Default of 1 if not specified.
        let count = pb.count.unwrap_or(1);
        if count > 0 {
            let ballot = Ballot {
                choices,
                count,
                source: pb.id.clone(),
                precinct: pb.precinct.clone(),
            };
            debug!("validate_ballots: ballot {:?}: {:?}", pb.id, ballot);
            res.push(ballot);
        }
    }
    Ok(res)
}

fn delim_split(s: &str, delim: &str) -> Vec<String> {
    s.split(delim)
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

/// Resolves the string labels of the configuration into the closed rule
/// enumerations of the tabulation core. Unknown labels fail here, before any
/// ballot is read.
fn validate_rules(rcv_rules: &RcvRules) -> RcvResult<TabulationRules> {
    let tiebreak_mode = match rcv_rules.tiebreak_mode.as_str() {
        "random" => TieBreakMode::Random,
        "previousRoundCountsThenRandom" => TieBreakMode::PreviousRoundCountsThenRandom,
        "usePermutationInConfig" => TieBreakMode::UsePermutationInConfig,
        "generatePermutation" => TieBreakMode::GeneratePermutation,
        "interactive" => TieBreakMode::Interactive,
        "stopCountingAndAsk" => TieBreakMode::StopCountingAndAsk,
        x => whatever!("unknown tiebreak mode: {}", x),
    };
    let random_seed = match rcv_rules.random_seed.as_ref() {
        None => None,
        Some(s) => match s.parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => whatever!("the random seed must be a non-negative integer: {:?}", s),
        },
    };
    let overvote_rule = match rcv_rules._overvote_rule.as_str() {
        "exhaustImmediately" => OvervoteRule::ExhaustImmediately,
        "alwaysSkipToNextRank" => OvervoteRule::AlwaysSkipToNextRank,
        "exhaustIfMultipleContinuing" => OvervoteRule::ExhaustIfMultipleContinuing,
        x => whatever!("unknown overvote rule: {}", x),
    };
    let continue_until_two = rcv_rules.continue_until_two_candidates_remain.unwrap_or(false);
    let (multi_seat_mode, allow_only_one_winner_per_round) =
        match rcv_rules.winner_election_mode.as_str() {
            "singleWinnerMajority" if continue_until_two => {
                (MultiSeatMode::ContinueUntilTwoRemain, false)
            }
            "singleWinnerMajority" => (MultiSeatMode::SingleWinner, false),
            "multiWinnerAllowMultipleWinnersPerRound" => (MultiSeatMode::StandardStv, false),
            "multiWinnerAllowOnlyOneWinnerPerRound" => (MultiSeatMode::StandardStv, true),
            "bottomsUp" => (MultiSeatMode::BottomsUp, false),
            "multiPassIrv" => (MultiSeatMode::Sequential, false),
            x => whatever!("unknown winner election mode: {}", x),
        };
    let max_skipped_ranks_allowed = match rcv_rules.max_skipped_ranks_allowed.as_str() {
        "unlimited" => MaxSkippedRanks::Unlimited,
        x => match x.parse::<u32>() {
            Ok(num) => MaxSkippedRanks::AtMost(num),
            _ => whatever!(
                "value {:?} cannot be understood for maxSkippedRanksAllowed",
                x
            ),
        },
    };
    let max_rankings_allowed = match rcv_rules.max_rankings_allowed.as_str() {
        "max" => MaxRankings::NumCandidates,
        x => match x.parse::<u32>() {
            Ok(num) if num > 0 => MaxRankings::AtMost(num),
            _ => whatever!("value {:?} cannot be understood for maxRankingsAllowed", x),
        },
    };
    let res = TabulationRules {
        multi_seat_mode,
        number_of_winners: rcv_rules.number_of_winners.unwrap_or(1),
        allow_only_one_winner_per_round,
        overvote_rule,
        tiebreak_mode,
        duplicate_candidate_mode: match rcv_rules.exhaust_on_duplicate_candidate {
            Some(true) => DuplicateCandidateMode::Exhaust,
            _ => DuplicateCandidateMode::SkipDuplicate,
        },
        max_skipped_ranks_allowed,
        max_rankings_allowed,
        minimum_vote_threshold: rcv_rules.minimum_vote_threshold,
        batch_elimination: rcv_rules.batch_elimination.unwrap_or(false),
        hare_quota: rcv_rules.hare_quota.unwrap_or(false),
        non_integer_winning_threshold: rcv_rules.non_integer_winning_threshold.unwrap_or(false),
        decimal_places: rcv_rules.decimal_places_for_vote_arithmetic.unwrap_or(4),
        random_seed,
    };
    Ok(res)
}

fn transfers_to_json(round: &RoundSnapshot, from: &str) -> JSValue {
    let mut transfers: JSMap<String, JSValue> = JSMap::new();
    if let Some(t) = round.transfers.iter().find(|t| t.from == from) {
        for (to, amount) in &t.to {
            transfers.insert(to.clone(), json!(amount.to_string()));
        }
        if !t.exhausted.is_zero() {
            transfers.insert("exhausted".to_string(), json!(t.exhausted.to_string()));
        }
    }
    JSValue::Object(transfers)
}

fn result_stats_to_json(record: &TabulationRecord) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round in record.rounds.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        for name in round.eliminated.iter() {
            tally_results.push(json!({
                "eliminated": name,
                "transfers": transfers_to_json(round, name)
            }));
        }
        for elected in round.elected.iter() {
            tally_results.push(json!({
                "elected": elected.name,
                "transfers": transfers_to_json(round, &elected.name)
            }));
        }

        l.push(json!({
            "round": round.round,
            "tally": tally,
            "tallyResults": tally_results
        }));
    }
    l
}

fn build_summary_js(config: &RcvConfig, record: &TabulationRecord) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        threshold: record.rounds.last().map(|r| r.threshold.to_string()),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(record),
        "winners": record.winners
    })
}

/// Resolves ties on the terminal when the contest is configured with an
/// interactive tie-break mode.
struct PromptOracle;

impl TieBreakOracle for PromptOracle {
    fn decide(&mut self, request: &TieBreakRequest) -> Option<String> {
        let action = match request.direction {
            TieBreakDirection::SelectLowest => "eliminate",
            TieBreakDirection::SelectHighest => "elect",
        };
        eprintln!(
            "Tie in round {}: choose the candidate to {}:",
            request.round, action
        );
        for (idx, name) in request.tied.iter().enumerate() {
            eprintln!("  {}: {}", idx + 1, name);
        }
        let mut line = String::new();
        loop {
            line.clear();
            if std::io::stdin().read_line(&mut line).is_err() || line.is_empty() {
                return None;
            }
            match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 && n <= request.tied.len() => {
                    return Some(request.tied[n - 1].clone())
                }
                _ => eprintln!("Enter a number between 1 and {}.", request.tied.len()),
            }
        }
    }
}

fn infer_candidates(parsed: &[ParsedBallot]) -> Vec<RcvCandidate> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for pb in parsed.iter() {
        for group in pb.choices.iter() {
            for name in group.iter() {
                if !name.is_empty() {
                    names.insert(name.clone());
                }
            }
        }
    }
    names
        .into_iter()
        .map(|name| RcvCandidate {
            name,
            code: None,
            excluded: Some(false),
        })
        .collect()
}

// override_out_path: used in test mode to disregard any output to disk.
pub fn run_election(
    config_path_o: Option<String>,
    check_summary_path: Option<String>,
    in_path: Option<String>,
    input_type: Option<String>,
    out_path: Option<String>,
    override_out_path: bool,
) -> RcvResult<()> {
    let config: RcvConfig = if let Some(config_path) = config_path_o.as_ref() {
        debug!("Opening configuration {:?}", config_path);
        let config_str =
            fs::read_to_string(config_path.clone()).context(ConfigOpeningJsonSnafu {})?;
        serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?
    } else {
        RcvConfig::config_from_args(&in_path, &input_type)?
    };
    debug!("run_election: config: {:?}", &config);

    let current_dir = std::env::current_dir()
        .ok()
        .context(MissingParentDirSnafu {})?;
    let root_path: &Path = if let Some(config_path) = config_path_o.as_ref() {
        Path::new(config_path.as_str())
            .parent()
            .context(MissingParentDirSnafu {})?
    } else {
        current_dir.as_path()
    };

    // Validate the rules before touching any ballot file.
    let rules = validate_rules(&config.rules)?;

    if config.cvr_file_sources.is_empty() {
        return MissingInputSnafu {}.fail();
    }

    let root = root_path.as_os_str().to_str().unwrap_or(".").to_string();
    let mut sources: Vec<(Vec<ParsedBallot>, &FileSource)> = Vec::new();
    for cfs in config.cvr_file_sources.iter() {
        let parsed = read_ranking_data(root.clone(), cfs)?;
        sources.push((parsed, cfs));
    }

    let declared: Vec<RcvCandidate> = if config.candidates.is_empty() {
        let all_parsed: Vec<ParsedBallot> = sources
            .iter()
            .flat_map(|(parsed, _)| parsed.iter().cloned())
            .collect();
        infer_candidates(&all_parsed)
    } else {
        config.candidates.clone()
    };

    let mut ballots: Vec<Ballot> = Vec::new();
    for (parsed, cfs) in sources.iter() {
        let mut file_ballots = validate_ballots(parsed, cfs)?;
        ballots.append(&mut file_ballots);
    }
    debug!("run_election: {} ballot records", ballots.len());

    // An undeclared name is only acceptable when a source was configured for
    // undeclared write-ins; otherwise the core rejects the tabulation.
    let allow_undeclared = config.cvr_file_sources.iter().any(|s| {
        s.undeclared_write_in_label.is_some()
            || s.treat_blank_as_undeclared_write_in == Some(true)
    });

    let candidates: Vec<Candidate> = declared
        .iter()
        .map(|c| Candidate {
            name: c.name.clone(),
            code: match c.code.clone() {
                Some(x) if x.is_empty() => None,
                x => x,
            },
            excluded: c.excluded.unwrap_or(false),
        })
        .collect();

    let mut builder = Builder::new(&rules)
        .context(RvTabulationSnafu {})?
        .candidates_full(&candidates)
        .context(RvTabulationSnafu {})?
        .allow_undeclared_write_ins(allow_undeclared);
    for ballot in ballots.iter() {
        builder.add_ballot_record(ballot).context(RvTabulationSnafu {})?;
    }

    let record = if rules.tiebreak_mode.needs_oracle() {
        let mut oracle = PromptOracle;
        run_contest_with_oracle(&builder, &mut oracle).context(RvTabulationSnafu {})?
    } else {
        run_contest(&builder).context(RvTabulationSnafu {})?
    };

    // Assemble the final json.
    let result_js = build_summary_js(&config, &record);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    debug!("summary:{}", pretty_js_stats);

    // The reference summary, if provided for comparison.
    if let Some(ref_summary_path) = check_summary_path {
        let summary_ref = read_summary(ref_summary_path).context(ReferenceOpeningFileSnafu {})?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between the calculated summary and the reference")
        }
    }

    let default_out_path = config.output_settings.output_directory.map(|p| {
        let pb: PathBuf = [p, "summary.json".to_string()].iter().collect();
        pb.as_os_str().to_str().unwrap_or("summary.json").to_string()
    });

    if let Some(out_p) = if override_out_path {
        out_path
    } else {
        out_path.or(default_out_path)
    } {
        if out_p == "stdout" {
            print!("{}", pretty_js_stats);
        } else if !out_p.is_empty() {
            debug!("Writing output to {}", out_p);
            fs::write(out_p.clone(), pretty_js_stats).context(SummaryWriteSnafu {
                path: out_p.clone(),
            })?;
            info!("Output written to {}", out_p);
        }
    }

    Ok(())
}

pub fn test_wrapper_local(test_name: &str) {
    let _ = env_logger::try_init();
    let test_dir = "./tests";
    info!("Running test {}", test_name);
    let res = run_election(
        Some(format!("{}/{}/{}_config.json", test_dir, test_name, test_name)),
        Some(format!(
            "{}/{}/{}_expected_summary.json",
            test_dir, test_name, test_name
        )),
        None,
        None,
        None,
        true,
    );
    if let Err(e) = res {
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rules() -> RcvRules {
        RcvRules {
            tiebreak_mode: "usePermutationInConfig".to_string(),
            _overvote_rule: "exhaustImmediately".to_string(),
            winner_election_mode: "singleWinnerMajority".to_string(),
            number_of_winners: Some(1),
            random_seed: None,
            max_skipped_ranks_allowed: "unlimited".to_string(),
            max_rankings_allowed: "max".to_string(),
            minimum_vote_threshold: None,
            decimal_places_for_vote_arithmetic: None,
            rules_description: None,
            batch_elimination: None,
            hare_quota: None,
            non_integer_winning_threshold: None,
            exhaust_on_duplicate_candidate: None,
            continue_until_two_candidates_remain: None,
        }
    }

    fn plain_source() -> FileSource {
        serde_json::from_str(
            r#"{"provider": "csv", "filePath": "ballots.csv",
                "firstVoteColumnIndex": 1, "firstVoteRowIndex": 1}"#,
        )
        .unwrap()
    }

    #[test]
    fn winner_election_modes_resolve() {
        let mut rules = default_rules();
        assert_eq!(
            MultiSeatMode::SingleWinner,
            validate_rules(&rules).unwrap().multi_seat_mode
        );

        rules.continue_until_two_candidates_remain = Some(true);
        assert_eq!(
            MultiSeatMode::ContinueUntilTwoRemain,
            validate_rules(&rules).unwrap().multi_seat_mode
        );

        rules.continue_until_two_candidates_remain = None;
        rules.winner_election_mode = "multiWinnerAllowOnlyOneWinnerPerRound".to_string();
        rules.number_of_winners = Some(3);
        let parsed = validate_rules(&rules).unwrap();
        assert_eq!(MultiSeatMode::StandardStv, parsed.multi_seat_mode);
        assert!(parsed.allow_only_one_winner_per_round);

        rules.winner_election_mode = "multiPassIrv".to_string();
        assert_eq!(
            MultiSeatMode::Sequential,
            validate_rules(&rules).unwrap().multi_seat_mode
        );

        rules.winner_election_mode = "bottomsUp".to_string();
        assert_eq!(
            MultiSeatMode::BottomsUp,
            validate_rules(&rules).unwrap().multi_seat_mode
        );
    }

    #[test]
    fn unknown_rule_labels_fail_validation() {
        let mut rules = default_rules();
        rules._overvote_rule = "invalidOption".to_string();
        assert!(validate_rules(&rules).is_err());

        let mut rules = default_rules();
        rules.tiebreak_mode = "flipACoin".to_string();
        assert!(validate_rules(&rules).is_err());

        let mut rules = default_rules();
        rules.max_skipped_ranks_allowed = "some".to_string();
        assert!(validate_rules(&rules).is_err());
    }

    #[test]
    fn rule_numbers_are_carried_through() {
        let mut rules = default_rules();
        rules.max_skipped_ranks_allowed = "2".to_string();
        rules.max_rankings_allowed = "5".to_string();
        rules.minimum_vote_threshold = Some(150);
        rules.decimal_places_for_vote_arithmetic = Some(6);
        rules.random_seed = Some("1234".to_string());
        let parsed = validate_rules(&rules).unwrap();
        assert_eq!(MaxSkippedRanks::AtMost(2), parsed.max_skipped_ranks_allowed);
        assert_eq!(MaxRankings::AtMost(5), parsed.max_rankings_allowed);
        assert_eq!(Some(150), parsed.minimum_vote_threshold);
        assert_eq!(6, parsed.decimal_places);
        assert_eq!(Some(1234), parsed.random_seed);
    }

    #[test]
    fn source_labels_resolve_to_sentinels() {
        let mut source = plain_source();
        source.overvote_label = Some("OVERVOTE".to_string());
        source.undervote_label = Some("UNDERVOTE".to_string());
        source.undeclared_write_in_label = Some("UWI".to_string());
        let parsed = vec![ParsedBallot {
            id: Some("b-1".to_string()),
            count: Some(2),
            precinct: None,
            choices: vec![
                vec!["A".to_string()],
                vec!["OVERVOTE".to_string()],
                vec!["UNDERVOTE".to_string()],
                vec!["UWI".to_string()],
                vec![String::new()],
            ],
        }];
        let ballots = validate_ballots(&parsed, &source).unwrap();
        assert_eq!(1, ballots.len());
        assert_eq!(
            vec![
                BallotChoice::Candidate("A".to_string()),
                BallotChoice::Overvote,
                BallotChoice::Undervote,
                BallotChoice::UndeclaredWriteIn,
                BallotChoice::Blank,
            ],
            ballots[0].choices
        );
        assert_eq!(2, ballots[0].count);
    }

    #[test]
    fn overvote_delimiter_splits_marks() {
        let mut source = plain_source();
        source.overvote_delimiter = Some("|".to_string());
        let parsed = vec![ParsedBallot {
            id: None,
            count: None,
            precinct: None,
            choices: vec![vec!["A|B".to_string()], vec!["C".to_string()]],
        }];
        let ballots = validate_ballots(&parsed, &source).unwrap();
        assert_eq!(
            vec![
                BallotChoice::Multiple(vec!["A".to_string(), "B".to_string()]),
                BallotChoice::Candidate("C".to_string()),
            ],
            ballots[0].choices
        );
    }

    #[test]
    fn blanks_may_map_to_undeclared_write_ins() {
        let mut source = plain_source();
        source.treat_blank_as_undeclared_write_in = Some(true);
        let parsed = vec![ParsedBallot {
            id: None,
            count: None,
            precinct: None,
            choices: vec![vec![String::new()], vec!["A".to_string()]],
        }];
        let ballots = validate_ballots(&parsed, &source).unwrap();
        assert_eq!(
            vec![
                BallotChoice::UndeclaredWriteIn,
                BallotChoice::Candidate("A".to_string()),
            ],
            ballots[0].choices
        );
    }

    // ********** End-to-end tests over the files in ./tests *************

    #[test]
    fn csv_majority() {
        test_wrapper_local("csv_majority");
    }

    #[test]
    fn csv_two_round() {
        test_wrapper_local("csv_two_round");
    }

    #[test]
    fn csv_stv_surplus() {
        test_wrapper_local("csv_stv_surplus");
    }
}
