use clap::Parser;

/// Validates and tallies the votes of the representative assembly.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The export of the voting form, in CSV or Excel format. Each ballot contains the email
    /// of the voter and one column per question.
    #[clap(value_parser)]
    pub input: String,

    /// (file path) The file where the report will be written. An existing file is overwritten.
    #[clap(value_parser)]
    pub output: String,

    /// (file path, optional) A roster of the representatives in CSV format. If provided, the sections and the
    /// emails of all the representatives are looked up again and the roster cache is updated. Otherwise,
    /// the roster cache is used as is.
    #[clap(long, value_parser)]
    pub reps: Option<String>,

    /// (file path, optional) A configuration file in JSON format. See the manual for the options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is deduced from the extension of the input.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// If passed as an argument, downloads the lists of students of every section from the directory
    /// before looking up the sections.
    #[clap(long, takes_value = false)]
    pub refresh_section_lists: bool,

    /// (file path) A reference report. If provided, adrvote checks that the report it writes matches the
    /// reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
