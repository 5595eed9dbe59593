// Primitives for reading and writing CSV files.

use std::collections::HashSet;
use std::io::Read;

use assembly_voting::builder::Builder;

use crate::tally::{config_reader::RepColumns, io_common::*, *};

pub fn read_reps_csv(
    path: &str,
    columns: &RepColumns,
    layout: &SectionLayout,
) -> TallyResult<Vec<Representative>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_reps(rdr, columns, layout)
}

pub fn read_reps<R: Read>(
    mut rdr: csv::Reader<R>,
    columns: &RepColumns,
    layout: &SectionLayout,
) -> TallyResult<Vec<Representative>> {
    let header = read_header(&mut rdr)?;
    let name_idx = find_column(&header, &columns.name)?;
    let id_idx = find_column(&header, &columns.identifier)?;
    // These are only present once the roster has been resolved.
    let section_idx = find_column(&header, &columns.section).ok();
    let email_idx = find_column(&header, &columns.email).ok();
    let presence_idx = find_column(&header, &columns.presence).ok();

    let mut seen: HashSet<u64> = HashSet::new();
    let mut res: Vec<Representative> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_reps: lineno: {:?} row: {:?}", lineno, line);
        let cell = |i: Option<usize>| i.and_then(|i| line.get(i)).unwrap_or("");

        let id_s = cell(Some(id_idx)).trim();
        let identifier = id_s.parse::<u64>().ok().context(ParsingIdentifierSnafu {
            lineno,
            content: id_s,
        })?;
        ensure!(
            seen.insert(identifier),
            DuplicateIdentifierSnafu { identifier }
        );

        let section_s = cell(section_idx);
        let section = ResolvedSection::from_cached(section_s, layout);
        if section == ResolvedSection::Unknown && !section_s.is_empty() {
            warn!(
                "read_reps: line {}: unknown section {:?}, ignored",
                lineno, section_s
            );
        }

        res.push(Representative {
            name: cell(Some(name_idx)).to_string(),
            identifier,
            section,
            email: read_cell(cell(email_idx).trim()),
            present: read_presence(cell(presence_idx)),
        });
    }
    info!("read_reps: {} representatives", res.len());
    Ok(res)
}

pub fn write_reps_csv(
    path: &str,
    representatives: &[Representative],
    columns: &RepColumns,
) -> TallyResult<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingFileSnafu { path })?;
        }
    }
    let wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    write_reps(wtr, representatives, columns, path)
}

fn write_reps<W: std::io::Write>(
    mut wtr: csv::Writer<W>,
    representatives: &[Representative],
    columns: &RepColumns,
    path: &str,
) -> TallyResult<()> {
    wtr.write_record([
        &columns.name,
        &columns.identifier,
        &columns.section,
        &columns.email,
        &columns.presence,
    ])
    .context(CsvWriteSnafu { path })?;
    for rep in representatives.iter() {
        let presence = match rep.present {
            Some(true) => "TRUE",
            Some(false) => "FALSE",
            None => "",
        };
        wtr.write_record([
            rep.name.as_str(),
            rep.identifier.to_string().as_str(),
            rep.section.code().unwrap_or(""),
            rep.email.as_deref().unwrap_or(""),
            presence,
        ])
        .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    Ok(())
}

pub fn read_ballot_csv(path: &str, email_column: &str) -> TallyResult<BallotSheet> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_ballots(rdr, email_column)
}

pub fn read_ballots<R: Read>(mut rdr: csv::Reader<R>, email_column: &str) -> TallyResult<BallotSheet> {
    let header = read_header(&mut rdr)?;
    let email_idx = find_column(&header, email_column)?;
    let mut builder = Builder::new(email_column).questions(&ballot_questions(&header, email_idx));

    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_ballots: lineno: {:?} row: {:?}", lineno, line);
        let cells: Vec<Option<String>> = line.iter().map(read_cell).collect();
        builder
            .add_row(&split_ballot_row(cells, email_idx))
            .context(VotingSnafu {})?;
    }
    Ok(builder.build())
}

fn read_header<R: Read>(rdr: &mut csv::Reader<R>) -> TallyResult<Vec<String>> {
    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1usize })?;
    debug!("read_header: {:?}", header);
    Ok(header.iter().map(|s| s.to_string()).collect())
}
