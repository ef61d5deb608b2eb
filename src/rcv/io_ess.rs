// Reader for ES&S-style Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::{OptionExt, ResultExt};

use crate::rcv::config_reader::FileSource;
use crate::rcv::io_common::make_default_id_lineno;
use crate::rcv::{
    BRcvResult, EmptyExcelSnafu, ExcelWrongCellTypeSnafu, OpeningExcelSnafu, ParsedBallot,
    RcvResult,
};

pub fn read_excel_file(path: String, cfs: &FileSource) -> BRcvResult<Vec<ParsedBallot>> {
    let mut workbook: Xlsx<_> =
        open_workbook(path.clone()).context(OpeningExcelSnafu { path: path.clone() })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu {})?
        .context(OpeningExcelSnafu { path: path.clone() })?;

    let default_id = make_default_id_lineno(&path);
    let start_col = cfs.first_vote_column_index()?;
    let start_row = cfs.first_vote_row_index()?;
    debug!(
        "read_excel_file: start column {} start row {}",
        start_col, start_row
    );

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in wrange.rows().enumerate().skip(start_row) {
        debug!("read_excel_file: row: {:?}", row);
        if row.len() <= start_col {
            continue;
        }
        let choices = &row[start_col..];
        let num_choices = choices.len();
        let mut cs: Vec<Vec<String>> = Vec::new();
        for (col, elt) in choices.iter().enumerate() {
            let choice = read_choice(elt, idx as u64 + 1, col == num_choices - 1)?;
            if let Some(c) = choice {
                // Some vendors pad the cells with whitespace.
                cs.push(vec![c.trim().to_string()]);
            }
        }
        // The last cell may hold the number of identical ballots.
        let count: Option<u64> = match choices.last() {
            Some(DataType::Float(f)) => Some(*f as u64),
            Some(DataType::Int(i)) => Some(*i as u64),
            _ => Some(1),
        };
        res.push(ParsedBallot {
            id: Some(default_id(idx + 1)),
            count,
            precinct: None,
            choices: cs,
        });
    }
    Ok(res)
}

fn read_choice(
    cell: &DataType,
    lineno: u64,
    is_last_column: bool,
) -> RcvResult<Option<String>> {
    match cell {
        DataType::String(s) => Ok(Some(s.clone())),
        DataType::Empty => Ok(Some(String::new())),
        // The last column may contain the ballot count; it is read separately.
        DataType::Float(_) | DataType::Int(_) if is_last_column => Ok(None),
        _ => None.context(ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }),
    }
}
