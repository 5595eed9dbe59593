use log::{debug, info, warn};

use crate::config::*;

/// Access to the institutional directory.
///
/// Implementations perform the I/O. A failure to reach the directory is not
/// an error at this level: it is reported by returning `None`.
pub trait Directory {
    /// The persisted list of the members of a section, if available.
    fn section_members(&self, section: &str) -> Option<String>;

    /// The mail username of the person with the given identifier.
    ///
    /// Returns `Ok(None)` if the lookup page could not be fetched, and an
    /// error if the page was fetched but does not contain a username.
    fn mail_username(&self, identifier: u64) -> Result<Option<String>, VotingErrors>;
}

/// What to recompute when resolving a roster.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResolveOptions {
    pub reload_sections: bool,
    pub reload_emails: bool,
    pub email_domain: String,
}

impl ResolveOptions {
    /// Keeps the cached sections and emails.
    pub fn cached(email_domain: &str) -> ResolveOptions {
        ResolveOptions {
            reload_sections: false,
            reload_emails: false,
            email_domain: email_domain.to_string(),
        }
    }

    pub fn full(email_domain: &str) -> ResolveOptions {
        ResolveOptions {
            reload_sections: true,
            reload_emails: true,
            email_domain: email_domain.to_string(),
        }
    }
}

pub fn create_email_from_username(username: &str, domain: &str) -> String {
    format!("{}@{}", username, domain)
}

/// Fills in the sections and the emails of the representatives.
pub fn resolve_roster(
    representatives: &[Representative],
    directory: &dyn Directory,
    layout: &SectionLayout,
    rules: &TallyRules,
    options: &ResolveOptions,
) -> Result<Vec<Representative>, VotingErrors> {
    let mut res: Vec<Representative> = representatives.to_vec();
    if options.reload_sections {
        info!(
            "resolve_roster: resolving sections of {} representatives",
            res.len()
        );
        // The section lists are read once, not once per representative.
        let lists: Vec<(&String, Option<String>)> = layout
            .sections()
            .iter()
            .map(|s| (s, directory.section_members(s)))
            .collect();
        for rep in res.iter_mut() {
            rep.section = find_section(&rep.name, &lists, rules.match_policy);
            debug!("resolve_roster: {} -> {:?}", rep.name, rep.section);
        }
    }
    if options.reload_emails {
        info!(
            "resolve_roster: resolving emails of {} representatives",
            res.len()
        );
        for (idx, rep) in res.iter_mut().enumerate() {
            rep.email = directory
                .mail_username(rep.identifier)?
                .map(|u| create_email_from_username(&u, &options.email_domain));
            if rep.email.is_none() {
                warn!(
                    "resolve_roster: no email for {} ({})",
                    rep.name, rep.identifier
                );
            }
            debug!(
                "resolve_roster: {}/{}: {} -> {:?}",
                idx + 1,
                representatives.len(),
                rep.identifier,
                rep.email
            );
        }
    }
    Ok(res)
}

fn find_section(
    name: &str,
    lists: &[(&String, Option<String>)],
    policy: MatchPolicy,
) -> ResolvedSection {
    let matches: Vec<&String> = lists
        .iter()
        .filter(|(_, members)| members.as_deref().map_or(false, |m| m.contains(name)))
        .map(|(section, _)| *section)
        .collect();
    if matches.len() > 1 {
        warn!(
            "find_section: {:?} appears in several sections: {:?}",
            name, matches
        );
    }
    let picked = match policy {
        MatchPolicy::LastMatchWins => matches.last(),
        MatchPolicy::FirstMatchWins => matches.first(),
    };
    match picked {
        Some(s) => ResolvedSection::Known((*s).clone()),
        None => ResolvedSection::Unknown,
    }
}
