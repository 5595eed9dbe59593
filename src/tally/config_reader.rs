use crate::tally::*;

use serde::{Deserialize, Serialize};

/// The names of the columns of the roster.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepColumns {
    pub name: String,
    pub identifier: String,
    pub section: String,
    pub email: String,
    pub presence: String,
}

impl Default for RepColumns {
    fn default() -> Self {
        RepColumns {
            name: "Name".to_string(),
            identifier: "Sciper".to_string(),
            section: "Section".to_string(),
            email: "Email".to_string(),
            presence: "Présence".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    #[serde(rename = "onlineVote")]
    pub online_vote: bool,
    #[serde(rename = "hideSectionDecisionVotes")]
    pub hide_section_decision_votes: bool,
    #[serde(rename = "hideSectionPreferenceVotes")]
    pub hide_section_preference_votes: bool,
    #[serde(rename = "sectionMatch")]
    pub section_match: String,
    #[serde(rename = "emailColumn")]
    pub email_column: String,
    #[serde(rename = "decisionMarker")]
    pub decision_marker: String,
    #[serde(rename = "preferencesMarker")]
    pub preferences_marker: String,
    #[serde(rename = "scoreScale")]
    pub score_scale: u32,
    #[serde(rename = "repsCachePath")]
    pub reps_cache_path: String,
    #[serde(rename = "sectionListsFolder")]
    pub section_lists_folder: String,
    #[serde(rename = "emailDomain")]
    pub email_domain: String,
    /// `{section}` is replaced by the code of the section.
    #[serde(rename = "sectionListUrl")]
    pub section_list_url: String,
    /// `{id}` is replaced by the identifier of the person.
    #[serde(rename = "peopleUrl")]
    pub people_url: String,
    pub sections: Option<Vec<String>>,
    #[serde(rename = "sectionGroups")]
    pub section_groups: Option<Vec<Vec<String>>>,
    #[serde(rename = "repColumns")]
    pub rep_columns: RepColumns,
}

impl Default for TallyConfig {
    fn default() -> Self {
        TallyConfig {
            online_vote: true,
            hide_section_decision_votes: false,
            hide_section_preference_votes: false,
            section_match: "lastMatch".to_string(),
            email_column: "Adresse e-mail".to_string(),
            decision_marker: "DECISION".to_string(),
            preferences_marker: "PREFERENCES".to_string(),
            score_scale: 10,
            reps_cache_path: "res/studentreps.csv".to_string(),
            section_lists_folder: "res/sectionlists".to_string(),
            email_domain: "epfl.ch".to_string(),
            section_list_url:
                "https://cadiwww.epfl.ch/listes/viewlist?list=etudiants.{section}@epfl.ch"
                    .to_string(),
            people_url: "https://people.epfl.ch/{id}".to_string(),
            sections: None,
            section_groups: None,
            rep_columns: RepColumns::default(),
        }
    }
}

impl TallyConfig {
    pub fn rules(&self) -> TallyResult<TallyRules> {
        let match_policy = match self.section_match.as_str() {
            "lastMatch" => MatchPolicy::LastMatchWins,
            "firstMatch" => MatchPolicy::FirstMatchWins,
            x => {
                return InvalidConfigSnafu {
                    message: format!("unknown sectionMatch {:?} (lastMatch or firstMatch)", x),
                }
                .fail()
            }
        };
        ensure!(
            !self.decision_marker.is_empty() && !self.preferences_marker.is_empty(),
            InvalidConfigSnafu {
                message: "the vote markers cannot be empty"
            }
        );
        ensure!(
            !self.email_column.is_empty(),
            InvalidConfigSnafu {
                message: "the email column cannot be empty"
            }
        );
        Ok(TallyRules {
            vote_mode: if self.online_vote {
                VoteMode::Online
            } else {
                VoteMode::InPerson
            },
            match_policy,
            decision_marker: self.decision_marker.clone(),
            preference_marker: self.preferences_marker.clone(),
            hide_decision_groups: self.hide_section_decision_votes,
            hide_preference_groups: self.hide_section_preference_votes,
            score_scale: self.score_scale,
        })
    }

    pub fn layout(&self) -> TallyResult<SectionLayout> {
        match (&self.sections, &self.section_groups) {
            (None, None) => Ok(SectionLayout::default()),
            (Some(sections), Some(groups)) => {
                SectionLayout::new(sections.clone(), groups.clone()).context(VotingSnafu {})
            }
            // The sections are listed in the order of the groups.
            (None, Some(groups)) => {
                SectionLayout::new(groups.concat(), groups.clone()).context(VotingSnafu {})
            }
            (Some(_), None) => InvalidConfigSnafu {
                message: "sections are given without sectionGroups",
            }
            .fail(),
        }
    }

    pub fn section_list_url(&self, section: &str) -> String {
        self.section_list_url.replace("{section}", section)
    }

    pub fn people_url(&self, identifier: u64) -> String {
        self.people_url.replace("{id}", &identifier.to_string())
    }
}

pub fn parse_config(contents: &str) -> TallyResult<TallyConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu {})
}

pub fn read_config(path: &str) -> TallyResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config = parse_config(&contents)?;
    info!("config: {:?}", config);
    Ok(config)
}
