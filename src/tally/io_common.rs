pub use assembly_voting::builder::read_cell;

use crate::tally::*;

/// Column names are compared without their surrounding whitespace.
pub fn find_column(header: &[String], column: &str) -> TallyResult<usize> {
    header
        .iter()
        .position(|c| c.trim() == column.trim())
        .context(MissingColumnSnafu { column })
}

pub fn read_presence(s: &str) -> Option<bool> {
    match s.trim().to_uppercase().as_str() {
        "" => None,
        "TRUE" => Some(true),
        _ => Some(false),
    }
}

/// The questions of a ballot sheet: every column except the email, in order.
pub fn ballot_questions(header: &[String], email_idx: usize) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != email_idx)
        .map(|(_, c)| c.clone())
        .collect()
}

pub fn split_ballot_row(mut cells: Vec<Option<String>>, email_idx: usize) -> BallotRow {
    let email = if email_idx < cells.len() {
        cells.remove(email_idx)
    } else {
        None
    };
    BallotRow {
        email,
        answers: cells,
    }
}
