use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use assembly_voting::builder::Builder;

use crate::tally::{io_common::*, *};

pub fn read_ballot_excel(
    path: &str,
    worksheet_name: Option<&str>,
    email_column: &str,
) -> TallyResult<BallotSheet> {
    let wrange = get_range(path, worksheet_name)?;
    read_ballot_range(&wrange, email_column, path)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> TallyResult<Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?,
    };
    wrange.context(OpeningExcelSnafu { path })
}

pub fn read_ballot_range(
    wrange: &Range<DataType>,
    email_column: &str,
    path: &str,
) -> TallyResult<BallotSheet> {
    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(|c| read_excel_cell(c).unwrap_or_default())
        .collect();
    debug!("read_ballot_range: header: {:?}", header);
    let email_idx = find_column(&header, email_column)?;
    let mut builder = Builder::new(email_column).questions(&ballot_questions(&header, email_idx));

    for (idx, row) in iter.enumerate() {
        debug!("read_ballot_range: idx: {:?} row: {:?}", idx, row);
        let cells: Vec<Option<String>> = row.iter().map(read_excel_cell).collect();
        builder
            .add_row(&split_ballot_row(cells, email_idx))
            .context(VotingSnafu {})?;
    }
    Ok(builder.build())
}

fn read_excel_cell(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => read_cell(s),
        DataType::Int(i) => Some(i.to_string()),
        // Scores are stored as floats by the spreadsheets.
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::Empty => None,
        _ => {
            warn!("read_excel_cell: could not understand cell {:?}", cell);
            None
        }
    }
}
