use crate::rcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::{OptionExt, ResultExt};
use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The contest header of the summary output.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub threshold: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "contestId")]
    pub contest_id: Option<String>,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "precinctColumnIndex")]
    pub precinct_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "overvoteDelimiter")]
    pub overvote_delimiter: Option<String>,
    #[serde(rename = "overvoteLabel")]
    pub overvote_label: Option<String>,
    #[serde(rename = "undervoteLabel")]
    pub undervote_label: Option<String>,
    #[serde(rename = "undeclaredWriteInLabel")]
    pub undeclared_write_in_label: Option<String>,
    #[serde(rename = "treatBlankAsUndeclaredWriteIn")]
    pub treat_blank_as_undeclared_write_in: Option<bool>,
}

impl FileSource {
    pub fn first_vote_column_index(&self) -> RcvResult<usize> {
        let x = read_js_int(&self._first_vote_column_index)?;
        Ok(x - 1)
    }

    pub fn first_vote_row_index(&self) -> RcvResult<usize> {
        let x = read_js_int(&self._first_vote_row_index)?;
        Ok(x - 1)
    }

    pub fn id_column_index_int(&self) -> RcvResult<Option<usize>> {
        if self.id_column_index.is_some() {
            read_js_int(&self.id_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }

    pub fn precinct_column_index_int(&self) -> RcvResult<Option<usize>> {
        if self.precinct_column_index.is_some() {
            read_js_int(&self.precinct_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }

    pub fn count_column_index_int(&self) -> RcvResult<Option<usize>> {
        if self.count_column_index.is_some() {
            read_js_int(&self.count_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvCandidate {
    pub name: String,
    pub code: Option<String>,
    pub excluded: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvRules {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: String,
    #[serde(rename = "overvoteRule")]
    pub _overvote_rule: String,
    #[serde(rename = "winnerElectionMode")]
    pub winner_election_mode: String,
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: Option<u32>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
    #[serde(rename = "maxSkippedRanksAllowed")]
    pub max_skipped_ranks_allowed: String,
    #[serde(rename = "maxRankingsAllowed")]
    pub max_rankings_allowed: String,
    #[serde(rename = "minimumVoteThreshold")]
    pub minimum_vote_threshold: Option<u64>,
    #[serde(rename = "decimalPlacesForVoteArithmetic")]
    pub decimal_places_for_vote_arithmetic: Option<u8>,
    #[serde(rename = "rulesDescription")]
    pub rules_description: Option<String>,
    #[serde(rename = "batchElimination")]
    pub batch_elimination: Option<bool>,
    #[serde(rename = "hareQuota")]
    pub hare_quota: Option<bool>,
    #[serde(rename = "nonIntegerWinningThreshold")]
    pub non_integer_winning_threshold: Option<bool>,
    #[serde(rename = "exhaustOnDuplicateCandidate")]
    pub exhaust_on_duplicate_candidate: Option<bool>,
    #[serde(rename = "continueUntilTwoCandidatesRemain")]
    pub continue_until_two_candidates_remain: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources")]
    pub cvr_file_sources: Vec<FileSource>,
    pub candidates: Vec<RcvCandidate>,
    pub rules: RcvRules,
}

impl RcvConfig {
    /// A minimal configuration for tabulating a single ballot file with the
    /// default rules, when no configuration file is provided.
    pub fn config_from_args(
        in_path: &Option<String>,
        input_type: &Option<String>,
    ) -> RcvResult<RcvConfig> {
        let file_path = in_path.clone().context(MissingInputSnafu {})?;
        Ok(RcvConfig {
            output_settings: OutputSettings {
                contest_name: file_path.clone(),
                output_directory: None,
                contest_date: None,
                contest_jurisdiction: None,
                contest_office: None,
            },
            cvr_file_sources: vec![FileSource {
                provider: input_type.clone().unwrap_or_else(|| "csv".to_string()),
                file_path,
                contest_id: None,
                _first_vote_column_index: Some(JSValue::from(1)),
                _first_vote_row_index: Some(JSValue::from(1)),
                id_column_index: None,
                precinct_column_index: None,
                count_column_index: None,
                overvote_delimiter: None,
                overvote_label: None,
                undervote_label: None,
                undeclared_write_in_label: None,
                treat_blank_as_undeclared_write_in: None,
            }],
            candidates: Vec::new(),
            rules: RcvRules {
                tiebreak_mode: "usePermutationInConfig".to_string(),
                _overvote_rule: "alwaysSkipToNextRank".to_string(),
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
            },
        })
    }
}

pub fn read_summary(path: String) -> BRcvResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Reads a 1-based column or row position, given either as a number, a
/// numeric string, or Excel-style column letters ("A" is position 1).
fn read_js_int(x: &Option<JSValue>) -> RcvResult<usize> {
    let value = match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {})?,
        Some(JSValue::String(s))
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            let mut res: usize = 0;
            for c in s.to_lowercase().chars() {
                res = res * 26 + (c as usize) - ('a' as usize) + 1;
            }
            res
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {})?,
        _ => return None.context(ParsingJsonNumberSnafu {}),
    };
    if value == 0 {
        return None.context(ParsingJsonNumberSnafu {});
    }
    Ok(value)
}
