use log::{debug, info, warn};

use assembly_voting::report::format_report;
use assembly_voting::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::io_directory::WebDirectory;

mod config_reader;
mod io_common;
mod io_csv;
mod io_directory;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum TallyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet {name:?} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The workbook {path} is empty"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Column {column:?} not found in the header"))]
    MissingColumn { column: String },
    #[snafu(display("Line {lineno}: the identifier {content:?} is not a number"))]
    ParsingIdentifier { lineno: usize, content: String },
    #[snafu(display("The identifier {identifier} appears more than once in the roster"))]
    DuplicateIdentifier { identifier: u64 },
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("Invalid pattern"))]
    InvalidPattern { source: regex::Error },
    #[snafu(display("Input type {input_type:?} is not supported (csv or xlsx)"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading reference file {path}"))]
    ReadingReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the report and the reference {path}"))]
    ReferenceMismatch { path: String },
    #[snafu(display("{source}"))]
    Voting { source: VotingErrors },
}

pub type TallyResult<T> = Result<T, TallyError>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum InputType {
    Csv,
    Excel,
}

fn input_type(path: &str, input_type: Option<&str>) -> TallyResult<InputType> {
    let declared = match input_type {
        Some(x) => x.to_lowercase(),
        None => Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "csv".to_string()),
    };
    match declared.as_str() {
        "csv" => Ok(InputType::Csv),
        "xlsx" | "excel" => Ok(InputType::Excel),
        x => UnknownInputTypeSnafu { input_type: x }.fail(),
    }
}

/// Reads the roster. A fresh roster is resolved against the directory and
/// saved as the new cache; otherwise the cache is used as is.
fn load_representatives(
    reps_path: Option<&str>,
    config: &TallyConfig,
    layout: &SectionLayout,
    rules: &TallyRules,
    directory: &WebDirectory,
) -> TallyResult<Vec<Representative>> {
    match reps_path {
        Some(path) => {
            info!("Resolving the roster {:?}", path);
            let reps = io_csv::read_reps_csv(path, &config.rep_columns, layout)?;
            let resolved = resolve_roster(
                &reps,
                directory,
                layout,
                rules,
                &ResolveOptions::full(&config.email_domain),
            )
            .context(VotingSnafu {})?;
            io_csv::write_reps_csv(&config.reps_cache_path, &resolved, &config.rep_columns)?;
            info!("Roster cache updated: {:?}", config.reps_cache_path);
            Ok(resolved)
        }
        None => {
            info!("Using the roster cache {:?}", config.reps_cache_path);
            let reps = io_csv::read_reps_csv(&config.reps_cache_path, &config.rep_columns, layout)?;
            resolve_roster(
                &reps,
                directory,
                layout,
                rules,
                &ResolveOptions::cached(&config.email_domain),
            )
            .context(VotingSnafu {})
        }
    }
}

fn check_reference(report: &str, reference_path: &str) -> TallyResult<()> {
    let reference = fs::read_to_string(reference_path).context(ReadingReferenceSnafu {
        path: reference_path,
    })?;
    if reference != report {
        warn!("Found differences with the reference report");
        print_diff(reference.as_str(), report, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("The report matches the reference {:?}", reference_path);
    Ok(())
}

pub fn run_tally(args: &Args) -> TallyResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => TallyConfig::default(),
    };
    debug!("config: {:?}", config);

    let rules = config.rules()?;
    let layout = config.layout()?;
    let directory = WebDirectory::new(&config)?;

    if args.refresh_section_lists {
        io_directory::update_section_lists(&directory, &layout)?;
    }

    let representatives = load_representatives(
        args.reps.as_deref(),
        &config,
        &layout,
        &rules,
        &directory,
    )?;

    let sheet = match input_type(&args.input, args.input_type.as_deref())? {
        InputType::Csv => io_csv::read_ballot_csv(&args.input, &config.email_column)?,
        InputType::Excel => io_excel::read_ballot_excel(
            &args.input,
            args.excel_worksheet_name.as_deref(),
            &config.email_column,
        )?,
    };
    info!(
        "Read {} ballots with {} columns from {:?}",
        sheet.rows.len(),
        sheet.questions.len(),
        args.input
    );

    let results = tally_votes(&representatives, &sheet, &layout, &rules).context(VotingSnafu {})?;

    // Written only once every question has been tallied.
    let report = format_report(&args.output, &results, &rules);
    fs::write(&args.output, &report).context(WritingFileSnafu {
        path: args.output.clone(),
    })?;
    info!("Results written to {:?}", args.output);

    if let Some(reference) = &args.reference {
        check_reference(&report, reference)?;
    }
    Ok(())
}
