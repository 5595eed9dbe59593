pub use crate::config::*;

/// A builder for ballot sheets.
///
/// The readers of the command line use it, and it is the easiest way to
/// assemble ballots in code.
///
/// ```
/// pub use assembly_voting::builder::Builder;
/// # use assembly_voting::VotingErrors;
///
/// let mut builder = Builder::new("Adresse e-mail")
///     .questions(&["DECISION: budget".to_string(), "Comment".to_string()]);
///
/// builder.add_ballot("anna.meier@epfl.ch", &["Yes", ""])?;
///
/// let sheet = builder.build();
/// assert_eq!(sheet.rows[0].answer(0), Some("Yes"));
/// assert_eq!(sheet.rows[0].answer(1), None);
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _email_column: String,
    pub(crate) _questions: Vec<String>,
    pub(crate) _rows: Vec<BallotRow>,
}

impl Builder {
    pub fn new(email_column: &str) -> Builder {
        Builder {
            _email_column: email_column.to_string(),
            _questions: Vec::new(),
            _rows: Vec::new(),
        }
    }

    /// Sets the question columns, in order. Resets the ballots.
    pub fn questions(self, questions: &[String]) -> Builder {
        Builder {
            _email_column: self._email_column,
            _questions: questions.to_vec(),
            _rows: Vec::new(),
        }
    }

    /// Adds a ballot. Empty strings are treated as missing answers.
    pub fn add_ballot(&mut self, email: &str, answers: &[&str]) -> Result<(), VotingErrors> {
        let cells: Vec<Option<String>> = answers.iter().map(|s| read_cell(s)).collect();
        self.add_row(&BallotRow {
            email: read_cell(email),
            answers: cells,
        })
    }

    /// Adds a ballot with the cells already read.
    pub fn add_row(&mut self, row: &BallotRow) -> Result<(), VotingErrors> {
        if row.answers.len() != self._questions.len() {
            return Err(VotingErrors::MalformedBallot {
                expected: self._questions.len(),
                found: row.answers.len(),
            });
        }
        self._rows.push(row.clone());
        Ok(())
    }

    pub fn build(self) -> BallotSheet {
        BallotSheet {
            email_column: self._email_column,
            questions: self._questions,
            rows: self._rows,
        }
    }
}

/// An empty cell is a missing value.
pub fn read_cell(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
