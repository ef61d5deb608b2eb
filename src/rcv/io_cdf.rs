// Reader for the NIST common data format (JSON notation).

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::collections::HashMap;
use std::fs;

use crate::rcv::io_common::{assemble_choices, get_count};
use crate::rcv::{
    BRcvResult, CdfParsingJsonSnafu, OpeningJsonSnafu, ParsedBallot, ParsingJsonSnafu,
};

pub fn read_json(path: String) -> BRcvResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let cvrr: CastVoteRecordReport =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;

    // Mapping from contest selection id to candidate name.
    let mut selection_names: HashMap<String, String> = HashMap::new();
    let e = cvrr.election.first().context(CdfParsingJsonSnafu {})?;
    let mut candidate_selections: HashMap<String, String> = HashMap::new();
    for c in e.contests.iter() {
        for cs in c.contest_selection.iter() {
            for cid in cs.candidate_ids.iter() {
                candidate_selections.insert(cid.clone(), cs.candidate_selection_id.clone());
            }
        }
    }
    for c in e.candidates.iter() {
        let selection_id = candidate_selections
            .get(&c.candidate_id)
            .context(CdfParsingJsonSnafu {})?;
        selection_names.insert(selection_id.clone(), c.candidate_name.clone());
    }
    debug!("read_json: selection names: {:?}", selection_names);

    let mut ballots: Vec<ParsedBallot> = Vec::new();
    for cvr in cvrr.cvr.iter() {
        for snap in cvr.snapshots.iter() {
            for contest in snap.contests.iter() {
                let mut num_votes: Vec<u64> = Vec::new();
                let mut ranks: Vec<(String, u64)> = Vec::new();
                for selection in contest.selection.iter() {
                    let candidate_name = selection_names
                        .get(&selection.selection_id)
                        .context(CdfParsingJsonSnafu {})?;
                    for pos in selection.positions.iter() {
                        num_votes.push(pos.num_votes);
                        ranks.push((candidate_name.clone(), pos.rank));
                    }
                }
                ballots.push(ParsedBallot {
                    id: Some(cvr.ballot_id.clone()),
                    count: get_count(&num_votes),
                    precinct: None,
                    choices: assemble_choices(&ranks),
                });
            }
        }
    }
    Ok(ballots)
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CVRSelectionPosition {
    #[serde(rename = "NumberVotes")]
    pub num_votes: u64,
    #[serde(rename = "Rank")]
    pub rank: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CVRContestSelection {
    #[serde(rename = "ContestSelectionId")]
    pub selection_id: String,
    #[serde(rename = "SelectionPosition")]
    pub positions: Vec<CVRSelectionPosition>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CVRContest {
    #[serde(rename = "CVRContestSelection")]
    pub selection: Vec<CVRContestSelection>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CVRSnapshot {
    #[serde(rename = "CVRContest")]
    pub contests: Vec<CVRContest>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Cvr {
    #[serde(rename = "BallotPrePrintedId")]
    pub ballot_id: String,
    #[serde(rename = "CVRSnapshot")]
    pub snapshots: Vec<CVRSnapshot>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CdfCandidate {
    #[serde(rename = "@id")]
    pub candidate_id: String,
    #[serde(rename = "Name")]
    pub candidate_name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CandidateSelection {
    #[serde(rename = "@id")]
    pub candidate_selection_id: String,
    #[serde(rename = "CandidateIds")]
    pub candidate_ids: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Contest {
    #[serde(rename = "ContestSelection")]
    pub contest_selection: Vec<CandidateSelection>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Election {
    #[serde(rename = "Candidate")]
    pub candidates: Vec<CdfCandidate>,
    #[serde(rename = "Contest")]
    pub contests: Vec<Contest>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct CastVoteRecordReport {
    #[serde(rename = "Election")]
    election: Vec<Election>,
    #[serde(rename = "CVR")]
    cvr: Vec<Cvr>,
}
