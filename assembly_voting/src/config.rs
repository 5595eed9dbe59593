// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// The section of a representative, as resolved from the section lists.
///
/// A section code that is not part of the layout is never kept as `Known`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ResolvedSection {
    Known(String),
    Unknown,
}

impl ResolvedSection {
    /// Reads a cached section value against the closed set of the layout.
    /// Empty values and codes outside the layout are `Unknown`.
    pub fn from_cached(value: &str, layout: &SectionLayout) -> ResolvedSection {
        let code = value.trim();
        if layout.contains(code) {
            ResolvedSection::Known(code.to_string())
        } else {
            ResolvedSection::Unknown
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ResolvedSection::Known(s) => Some(s.as_str()),
            ResolvedSection::Unknown => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Representative {
    pub name: String,
    /// The numeric identifier in the institutional directory. Unique per representative.
    pub identifier: u64,
    pub section: ResolvedSection,
    pub email: Option<String>,
    /// Attendance at the in-person session, if known.
    pub present: Option<bool>,
}

impl Representative {
    pub fn new(name: &str, identifier: u64) -> Representative {
        Representative {
            name: name.to_string(),
            identifier,
            section: ResolvedSection::Unknown,
            email: None,
            present: None,
        }
    }
}

/// One response to the ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotRow {
    pub email: Option<String>,
    /// One cell per question of the sheet, in the same order.
    pub answers: Vec<Option<String>>,
}

impl BallotRow {
    /// The content of a cell, or None if the cell is missing or empty.
    pub fn answer(&self, question_index: usize) -> Option<&str> {
        match self.answers.get(question_index) {
            Some(Some(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// The ballot table: the voter email column and all the other columns, in
/// the order of the original export.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotSheet {
    pub email_column: String,
    pub questions: Vec<String>,
    pub rows: Vec<BallotRow>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionKind {
    /// Yes / No / neutral question, tallied by majority.
    Decision,
    /// Numeric score, tallied by mean.
    Preference,
}

// ******** Output data structures *********

/// Counts of a decision question.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct MajorityTally {
    pub yes: u64,
    pub no: u64,
    pub neutral: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MajorityOutcome {
    Yes,
    No,
    NoVote,
}

impl Display for MajorityOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MajorityOutcome::Yes => write!(f, "YES"),
            MajorityOutcome::No => write!(f, "NO"),
            MajorityOutcome::NoVote => write!(f, "no vote"),
        }
    }
}

impl MajorityTally {
    /// Yes wins ties, as long as there is at least one yes.
    pub fn outcome(&self) -> MajorityOutcome {
        if self.yes >= self.no && self.yes > 0 {
            MajorityOutcome::Yes
        } else if self.no > self.yes && self.no > 0 {
            MajorityOutcome::No
        } else {
            MajorityOutcome::NoVote
        }
    }

    pub fn expressed(&self) -> u64 {
        self.yes + self.no
    }
}

impl Display for MajorityTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let expressed = self.expressed();
        if expressed == 0 {
            return write!(
                f,
                "{} (Yes: {} / No: {} / Neutral: {}).",
                self.outcome(),
                self.yes,
                self.no,
                self.neutral
            );
        }
        let pct = |x: u64| 100.0 * (x as f64) / (expressed as f64);
        write!(
            f,
            "{} (Yes: {}/{}: {:.2}% / No: {}/{}: {:.2}% / Neutral: {}).",
            self.outcome(),
            self.yes,
            expressed,
            pct(self.yes),
            self.no,
            expressed,
            pct(self.no),
            self.neutral
        )
    }
}

/// Scores of a preference question.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MeanScore {
    pub sum: i64,
    pub count: u64,
    /// The top of the scoring scale, only used for display.
    pub scale: u32,
}

impl MeanScore {
    /// None when no score was given.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum as f64 / self.count as f64)
        }
    }
}

impl Display for MeanScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mean() {
            // Debug keeps the trailing ".0" of whole numbers.
            Some(m) => write!(
                f,
                "{:?}/{} (Sum: {} with {}).",
                m, self.scale, self.sum, self.count
            ),
            None => write!(
                f,
                "no data/{} (Sum: {} with {}).",
                self.scale, self.sum, self.count
            ),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Aggregate {
    Majority(MajorityTally),
    Mean(MeanScore),
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregate::Majority(t) => t.fmt(f),
            Aggregate::Mean(m) => m.fmt(f),
        }
    }
}

/// The tally of one question, overall and for each section group.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionResult {
    pub title: String,
    pub kind: QuestionKind,
    pub overall: Aggregate,
    /// In the order of declaration of the groups.
    pub per_group: Vec<(String, Aggregate)>,
}

/// Errors that prevent the tally from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// The lookup page of a representative did not contain a mail username.
    Resolution { identifier: u64, detail: String },
    /// A preference answer is not an integer.
    InvalidScore {
        question: Option<String>,
        answer: String,
    },
    /// The sum of the scores of a question does not fit in 64 bits.
    ScoreOverflow {
        question: Option<String>,
        answer: String,
    },
    /// The sections and the groups do not form a partition.
    InvalidLayout(String),
    /// A ballot does not have one cell per question.
    MalformedBallot { expected: usize, found: usize },
}

impl VotingErrors {
    pub(crate) fn in_question(self, title: &str) -> VotingErrors {
        match self {
            VotingErrors::InvalidScore { answer, .. } => VotingErrors::InvalidScore {
                question: Some(title.to_string()),
                answer,
            },
            VotingErrors::ScoreOverflow { answer, .. } => VotingErrors::ScoreOverflow {
                question: Some(title.to_string()),
                answer,
            },
            x => x,
        }
    }
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::Resolution { identifier, detail } => {
                write!(f, "Could not find mail username for {}: {}", identifier, detail)
            }
            VotingErrors::InvalidScore {
                question: Some(q),
                answer,
            } => write!(f, "Score {:?} is not an integer in question {:?}", answer, q),
            VotingErrors::InvalidScore {
                question: None,
                answer,
            } => write!(f, "Score {:?} is not an integer", answer),
            VotingErrors::ScoreOverflow {
                question: Some(q),
                answer,
            } => write!(f, "Sum of the scores overflows at {:?} in question {:?}", answer, q),
            VotingErrors::ScoreOverflow {
                question: None,
                answer,
            } => write!(f, "Sum of the scores overflows at {:?}", answer),
            VotingErrors::InvalidLayout(msg) => write!(f, "Invalid section layout: {}", msg),
            VotingErrors::MalformedBallot { expected, found } => write!(
                f,
                "Ballot has {} answers but the sheet has {} questions",
                found, expected
            ),
        }
    }
}

// ********* Configuration **********

/// Which representative wins when several of them match.
///
/// Scanning the whole list and keeping the last match is the historical
/// behaviour of the assembly tally, and remains the default.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum MatchPolicy {
    #[default]
    LastMatchWins,
    FirstMatchWins,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum VoteMode {
    /// Every representative with an email may vote.
    #[default]
    Online,
    /// Only the representatives marked as present may vote.
    InPerson,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRules {
    pub vote_mode: VoteMode,
    pub match_policy: MatchPolicy,
    pub decision_marker: String,
    pub preference_marker: String,
    pub hide_decision_groups: bool,
    pub hide_preference_groups: bool,
    pub score_scale: u32,
}

impl Default for TallyRules {
    fn default() -> Self {
        TallyRules {
            vote_mode: VoteMode::Online,
            match_policy: MatchPolicy::LastMatchWins,
            decision_marker: "DECISION".to_string(),
            preference_marker: "PREFERENCES".to_string(),
            hide_decision_groups: false,
            hide_preference_groups: false,
            score_scale: 10,
        }
    }
}

impl TallyRules {
    /// The decision marker is checked first: a column carrying both markers is a decision.
    pub fn classify(&self, column: &str) -> Option<QuestionKind> {
        if column.contains(&self.decision_marker) {
            Some(QuestionKind::Decision)
        } else if column.contains(&self.preference_marker) {
            Some(QuestionKind::Preference)
        } else {
            None
        }
    }

    pub fn hide_groups(&self, kind: QuestionKind) -> bool {
        match kind {
            QuestionKind::Decision => self.hide_decision_groups,
            QuestionKind::Preference => self.hide_preference_groups,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionGroup {
    pub sections: Vec<String>,
}

impl SectionGroup {
    /// The member codes joined by an underscore.
    pub fn name(&self) -> String {
        self.sections.join("_")
    }

    pub fn contains(&self, section: &ResolvedSection) -> bool {
        match section.code() {
            Some(code) => self.sections.iter().any(|s| s == code),
            None => false,
        }
    }
}

/// The closed set of sections and their partition into groups.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionLayout {
    sections: Vec<String>,
    groups: Vec<SectionGroup>,
}

const DEFAULT_SECTIONS: [&str; 19] = [
    "cms", "ar", "cgc", "gc", "gm", "el", "in", "sv", "ma", "mt", "ph", "mx", "sie", "sc", "if",
    "mte", "nx", "siq", "dh",
];

const DEFAULT_GROUPS: [&[&str]; 15] = [
    &["cms"],
    &["ar"],
    &["cgc"],
    &["gc"],
    &["gm"],
    &["el"],
    &["in"],
    &["sv", "nx"],
    &["ma"],
    &["mt"],
    &["ph", "siq"],
    &["mx"],
    &["sie"],
    &["sc"],
    &["if", "mte", "dh"],
];

impl SectionLayout {
    pub fn new(
        sections: Vec<String>,
        groups: Vec<Vec<String>>,
    ) -> Result<SectionLayout, VotingErrors> {
        let known: HashSet<&String> = sections.iter().collect();
        if known.len() != sections.len() {
            return Err(VotingErrors::InvalidLayout(
                "duplicate section code".to_string(),
            ));
        }
        let mut seen: HashSet<&String> = HashSet::new();
        for s in groups.iter().flatten() {
            if !known.contains(s) {
                return Err(VotingErrors::InvalidLayout(format!(
                    "group member {:?} is not a section",
                    s
                )));
            }
            if !seen.insert(s) {
                return Err(VotingErrors::InvalidLayout(format!(
                    "section {:?} is in more than one group",
                    s
                )));
            }
        }
        if let Some(s) = sections.iter().find(|s| !seen.contains(s)) {
            return Err(VotingErrors::InvalidLayout(format!(
                "section {:?} is in no group",
                s
            )));
        }
        Ok(SectionLayout {
            sections,
            groups: groups
                .into_iter()
                .map(|sections| SectionGroup { sections })
                .collect(),
        })
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// The groups, in their order of declaration.
    pub fn groups(&self) -> &[SectionGroup] {
        &self.groups
    }

    pub fn contains(&self, code: &str) -> bool {
        self.sections.iter().any(|s| s == code)
    }

    pub fn group_of(&self, section: &ResolvedSection) -> Option<&SectionGroup> {
        self.groups.iter().find(|g| g.contains(section))
    }
}

impl Default for SectionLayout {
    fn default() -> Self {
        SectionLayout {
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            groups: DEFAULT_GROUPS
                .iter()
                .map(|g| SectionGroup {
                    sections: g.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }
}
