// Primitives for reading CSV ballot files.

use std::fs::File;

use log::debug;
use snafu::{OptionExt, ResultExt};

use crate::rcv::config_reader::FileSource;
use crate::rcv::io_common::make_default_id_lineno;
use crate::rcv::{
    BRcvResult, CsvLineParseSnafu, CsvLineTooShortSnafu, CsvOpenSnafu, ParsedBallot, RcvResult,
};

pub fn read_csv_ranking(path: String, cfs: &FileSource) -> BRcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id_lineno(&path);

    let id_idx_o = cfs.id_column_index_int()?;
    let precinct_idx_o = cfs.precinct_column_index_int()?;
    let count_idx_o = cfs.count_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(&path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .to_string()
        } else {
            default_id(lineno)
        };

        let precinct = if let Some(p_idx) = precinct_idx_o {
            Some(
                line.get(p_idx)
                    .context(CsvLineTooShortSnafu { lineno })?
                    .to_string(),
            )
        } else {
            None
        };

        let count: Option<u64> = if let Some(count_idx) = count_idx_o {
            let raw = line
                .get(count_idx)
                .context(CsvLineTooShortSnafu { lineno })?;
            Some(
                raw.parse::<u64>()
                    .ok()
                    .context(CsvLineTooShortSnafu { lineno })?,
            )
        } else {
            Some(1)
        };

        let choices_parsed: Vec<Vec<String>> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| vec![s.to_string()])
            .collect();
        debug!(
            "read_csv_ranking: lineno: {:?} row: {:?}",
            lineno, &choices_parsed
        );

        res.push(ParsedBallot {
            id: Some(id),
            count,
            precinct,
            choices: choices_parsed,
        });
    }
    Ok(res)
}

fn get_records(
    path: &String,
    cfs: &FileSource,
) -> RcvResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the spreadsheet
    // world.
    for _ in 0..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}
