/*!
Validation and tallying of the votes of a representative assembly.

Ballots are exported from an online form as a table: one column with the
email of the voter, then one column per question. The library checks every
ballot against the roster of the representatives, then tallies each question
overall and for each group of sections.

Two kinds of questions are recognized from their column name:
- decision questions (yes / no / neutral), tallied by majority
- preference questions (integer scores), tallied by mean

```
use assembly_voting::builder::Builder;
use assembly_voting::*;

let mut alice = Representative::new("Alice Martin", 1);
alice.email = Some("alice.martin@epfl.ch".to_string());
alice.section = ResolvedSection::Known("ar".to_string());

let mut builder = Builder::new("Adresse e-mail")
    .questions(&["DECISION: budget".to_string()]);
builder.add_ballot("alice.martin@epfl.ch", &["Yes"])?;
builder.add_ballot("someone.else@epfl.ch", &["No"])?;

let results = tally_votes(
    &[alice],
    &builder.build(),
    &SectionLayout::default(),
    &TallyRules::default(),
)?;
assert_eq!(
    results[0].overall.to_string(),
    "YES (Yes: 1/1: 100.00% / No: 0/1: 0.00% / Neutral: 0)."
);
# Ok::<(), VotingErrors>(())
```
*/
mod config;
use log::{debug, info, warn};

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::roster::*;

pub mod builder;
pub mod manual;
pub mod report;
pub mod roster;

/// Returns, for each ballot, whether it counts for the given question.
///
/// A ballot counts if its email belongs to an eligible representative and the
/// answer to the question is not empty. Every rejected ballot is logged.
pub fn validate_votes(
    representatives: &[Representative],
    sheet: &BallotSheet,
    question_index: usize,
    rules: &TallyRules,
) -> Vec<bool> {
    let eligible = eligible_emails(representatives, rules.vote_mode);
    debug!(
        "validate_votes: {} eligible emails for {} ballots",
        eligible.len(),
        sheet.rows.len()
    );
    sheet
        .rows
        .iter()
        .map(|row| {
            let answer = row.answer(question_index);
            let is_eligible = row
                .email
                .as_deref()
                .map_or(false, |e| eligible.contains(e));
            if is_eligible && answer.is_some() {
                true
            } else {
                warn!(
                    "Invalid vote, {} - {}.",
                    row.email.as_deref().unwrap_or("<no email>"),
                    answer.unwrap_or("<empty>")
                );
                false
            }
        })
        .collect()
}

fn eligible_emails(representatives: &[Representative], mode: VoteMode) -> HashSet<&str> {
    if mode == VoteMode::InPerson && !representatives.iter().any(|r| r.present == Some(true)) {
        warn!(
            "No representative is marked as present: every ballot is rejected in the in-person mode"
        );
    }
    representatives
        .iter()
        .filter(|r| match mode {
            VoteMode::Online => true,
            VoteMode::InPerson => r.present == Some(true),
        })
        .filter_map(|r| r.email.as_deref())
        .collect()
}

/// The section of the representative behind each email, in the same order.
pub fn sections_for_emails(
    representatives: &[Representative],
    emails: &[&str],
    policy: MatchPolicy,
) -> Vec<ResolvedSection> {
    emails
        .iter()
        .map(|email| {
            let mut matching = representatives
                .iter()
                .filter(|r| r.email.as_deref() == Some(*email));
            let rep = match policy {
                MatchPolicy::LastMatchWins => matching.last(),
                MatchPolicy::FirstMatchWins => matching.next(),
            };
            rep.map_or(ResolvedSection::Unknown, |r| r.section.clone())
        })
        .collect()
}

/// Counts the yes, no and neutral answers.
///
/// An answer is a yes if it contains "Yes", else a no if it contains "No".
pub fn aggregate_majority(answers: &[&str]) -> MajorityTally {
    let mut res = MajorityTally::default();
    for a in answers.iter() {
        if a.contains("Yes") {
            res.yes += 1;
        } else if a.contains("No") {
            res.no += 1;
        } else {
            res.neutral += 1;
        }
    }
    res
}

/// Sums the scores. Fails on the first answer that is not an integer, or
/// that makes the sum overflow.
pub fn aggregate_mean(answers: &[&str], scale: u32) -> Result<MeanScore, VotingErrors> {
    let mut sum: i64 = 0;
    for a in answers.iter() {
        let score = a
            .trim()
            .parse::<i64>()
            .map_err(|_| VotingErrors::InvalidScore {
                question: None,
                answer: a.to_string(),
            })?;
        sum = sum
            .checked_add(score)
            .ok_or_else(|| VotingErrors::ScoreOverflow {
                question: None,
                answer: a.to_string(),
            })?;
    }
    Ok(MeanScore {
        sum,
        count: answers.len() as u64,
        scale,
    })
}

pub fn aggregate(
    kind: QuestionKind,
    answers: &[&str],
    rules: &TallyRules,
) -> Result<Aggregate, VotingErrors> {
    match kind {
        QuestionKind::Decision => Ok(Aggregate::Majority(aggregate_majority(answers))),
        QuestionKind::Preference => aggregate_mean(answers, rules.score_scale).map(Aggregate::Mean),
    }
}

/// Tallies one question overall and for each section group.
pub fn compute_question_result(
    representatives: &[Representative],
    sheet: &BallotSheet,
    question_index: usize,
    kind: QuestionKind,
    layout: &SectionLayout,
    rules: &TallyRules,
) -> Result<QuestionResult, VotingErrors> {
    let title = sheet
        .questions
        .get(question_index)
        .cloned()
        .unwrap_or_default();
    let mask = validate_votes(representatives, sheet, question_index, rules);

    let mut emails: Vec<&str> = Vec::new();
    let mut answers: Vec<&str> = Vec::new();
    for (row, valid) in sheet.rows.iter().zip(mask.iter()) {
        if let (true, Some(email), Some(answer)) =
            (*valid, row.email.as_deref(), row.answer(question_index))
        {
            emails.push(email);
            answers.push(answer);
        }
    }
    info!(
        "compute_question_result: {:?}: {} valid ballots out of {}",
        title,
        answers.len(),
        sheet.rows.len()
    );

    let overall = aggregate(kind, &answers, rules).map_err(|e| e.in_question(&title))?;

    let sections = sections_for_emails(representatives, &emails, rules.match_policy);
    let mut per_group: Vec<(String, Aggregate)> = Vec::new();
    for group in layout.groups() {
        let group_answers: Vec<&str> = answers
            .iter()
            .zip(sections.iter())
            .filter(|(_, s)| group.contains(s))
            .map(|(a, _)| *a)
            .collect();
        let agg = aggregate(kind, &group_answers, rules).map_err(|e| e.in_question(&title))?;
        per_group.push((group.name(), agg));
    }

    Ok(QuestionResult {
        title,
        kind,
        overall,
        per_group,
    })
}

/// Tallies every recognized question of the sheet, in column order.
pub fn tally_votes(
    representatives: &[Representative],
    sheet: &BallotSheet,
    layout: &SectionLayout,
    rules: &TallyRules,
) -> Result<Vec<QuestionResult>, VotingErrors> {
    info!(
        "tally_votes: {} representatives, {} ballots, {} columns",
        representatives.len(),
        sheet.rows.len(),
        sheet.questions.len()
    );
    let mut res: Vec<QuestionResult> = Vec::new();
    for (idx, column) in sheet.questions.iter().enumerate() {
        let kind = match rules.classify(column) {
            Some(k) => k,
            None => {
                debug!("tally_votes: skipping column {:?}", column);
                continue;
            }
        };
        info!("Vote: {}", column);
        res.push(compute_question_result(
            representatives,
            sheet,
            idx,
            kind,
            layout,
            rules,
        )?);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rep(name: &str, id: u64, section: &str, present: bool) -> Representative {
        let email = format!("{}@epfl.ch", name.to_lowercase().replace(' ', "."));
        Representative {
            name: name.to_string(),
            identifier: id,
            section: if section.is_empty() {
                ResolvedSection::Unknown
            } else {
                ResolvedSection::Known(section.to_string())
            },
            email: Some(email),
            present: Some(present),
        }
    }

    fn roster() -> Vec<Representative> {
        vec![
            rep("Anna Meier", 1, "cms", true),
            rep("Bruno Keller", 2, "sv", false),
            rep("Chloe Favre", 3, "nx", true),
            rep("Denis Roth", 4, "", true),
            rep("Eva Brun", 5, "ph", true),
        ]
    }

    fn sheet() -> BallotSheet {
        let mut b = Builder::new("Adresse e-mail").questions(&[
            "Name".to_string(),
            "PREFERENCES: venue".to_string(),
            "DECISION: statutes".to_string(),
            "Comment".to_string(),
        ]);
        b.add_ballot("anna.meier@epfl.ch", &["Anna", "8", "Yes", ""])
            .unwrap();
        b.add_ballot("bruno.keller@epfl.ch", &["Bruno", "4", "No", "meh"])
            .unwrap();
        b.add_ballot("chloe.favre@epfl.ch", &["Chloe", "", "Yes, of course", ""])
            .unwrap();
        b.add_ballot("denis.roth@epfl.ch", &["Denis", "6", "Abstention", ""])
            .unwrap();
        b.add_ballot("mallory@example.com", &["Mallory", "10", "No", ""])
            .unwrap();
        b.add_ballot("", &["", "10", "No", ""]).unwrap();
        b.build()
    }

    #[test]
    fn majority_example() {
        let t = aggregate_majority(&["Yes", "Yes", "No"]);
        assert_eq!(
            t,
            MajorityTally {
                yes: 2,
                no: 1,
                neutral: 0
            }
        );
        assert_eq!(t.outcome(), MajorityOutcome::Yes);
        assert_eq!(
            t.to_string(),
            "YES (Yes: 2/3: 66.67% / No: 1/3: 33.33% / Neutral: 0)."
        );
    }

    #[test]
    fn majority_empty() {
        let t = aggregate_majority(&[]);
        assert_eq!(t, MajorityTally::default());
        assert_eq!(t.outcome(), MajorityOutcome::NoVote);
        assert_eq!(t.to_string(), "no vote (Yes: 0 / No: 0 / Neutral: 0).");
    }

    #[test]
    fn majority_outcomes() {
        assert_eq!(
            aggregate_majority(&["Yes", "No"]).outcome(),
            MajorityOutcome::Yes
        );
        assert_eq!(
            aggregate_majority(&["No", "No", "Yes", "Blank"]).outcome(),
            MajorityOutcome::No
        );
        assert_eq!(
            aggregate_majority(&["Abstention", "Blank"]).outcome(),
            MajorityOutcome::NoVote
        );
        assert_eq!(
            aggregate_majority(&["Abstention"]).to_string(),
            "no vote (Yes: 0 / No: 0 / Neutral: 1)."
        );
        // Both tokens: counted as a yes.
        assert_eq!(aggregate_majority(&["Yes / No"]).yes, 1);
    }

    #[test]
    fn majority_is_order_independent() {
        let answers = ["No", "Yes", "Abstention", "No", "Yes", "No"];
        let mut reversed = answers;
        reversed.reverse();
        let mut rotated = answers;
        rotated.rotate_left(2);
        let t = aggregate_majority(&answers);
        assert_eq!(t, aggregate_majority(&reversed));
        assert_eq!(t, aggregate_majority(&rotated));
    }

    #[test]
    fn mean_example() {
        let m = aggregate_mean(&["3", "5", "7"], 10).unwrap();
        assert_eq!(m.sum, 15);
        assert_eq!(m.count, 3);
        assert_eq!(m.mean(), Some(5.0));
        assert_eq!(m.to_string(), "5.0/10 (Sum: 15 with 3).");
    }

    #[test]
    fn mean_fractional() {
        let m = aggregate_mean(&["3", " 4 "], 10).unwrap();
        assert_eq!(m.to_string(), "3.5/10 (Sum: 7 with 2).");
    }

    #[test]
    fn mean_invalid_score() {
        let res = aggregate_mean(&["3", "x", "7"], 10);
        assert_eq!(
            res,
            Err(VotingErrors::InvalidScore {
                question: None,
                answer: "x".to_string()
            })
        );
    }

    #[test]
    fn mean_overflow() {
        let res = aggregate_mean(&["9223372036854775807", "1"], 10);
        assert_eq!(
            res,
            Err(VotingErrors::ScoreOverflow {
                question: None,
                answer: "1".to_string()
            })
        );
        let res = aggregate_mean(&["-9223372036854775808", "-1"], 10);
        assert!(matches!(res, Err(VotingErrors::ScoreOverflow { .. })));
        let m = aggregate_mean(&["9223372036854775807", "-1"], 10).unwrap();
        assert_eq!(m.sum, 9223372036854775806);
    }

    #[test]
    fn mean_empty() {
        let m = aggregate_mean(&[], 10).unwrap();
        assert_eq!(m.mean(), None);
        assert_eq!(m.to_string(), "no data/10 (Sum: 0 with 0).");
    }

    #[test]
    fn validity_mask() {
        init();
        let s = sheet();
        let reps = roster();
        let rules = TallyRules::default();
        let mask = validate_votes(&reps, &s, 1, &rules);
        assert_eq!(mask.len(), s.rows.len());
        assert_eq!(mask, vec![true, true, false, true, false, false]);
        let mask = validate_votes(&reps, &s, 2, &rules);
        assert_eq!(mask, vec![true, true, true, true, false, false]);
        // Nobody answered the comment, except one voter.
        let mask = validate_votes(&reps, &s, 3, &rules);
        assert_eq!(mask.iter().filter(|x| **x).count(), 1);
    }

    #[test]
    fn in_person_mode_requires_presence() {
        init();
        let rules = TallyRules {
            vote_mode: VoteMode::InPerson,
            ..TallyRules::default()
        };
        let mask = validate_votes(&roster(), &sheet(), 2, &rules);
        // Bruno was not present.
        assert_eq!(mask, vec![true, false, true, true, false, false]);
    }

    #[test]
    fn in_person_mode_without_presence() {
        init();
        let rules = TallyRules {
            vote_mode: VoteMode::InPerson,
            ..TallyRules::default()
        };
        let mut reps = roster();
        for r in reps.iter_mut() {
            r.present = None;
        }
        assert!(eligible_emails(&reps, rules.vote_mode).is_empty());
        let mask = validate_votes(&reps, &sheet(), 2, &rules);
        assert!(mask.iter().all(|x| !x));
        assert_eq!(eligible_emails(&reps, VoteMode::Online).len(), 5);
    }

    #[test]
    fn shared_email_is_eligible() {
        let mut reps = roster();
        let mut twin = rep("Anna Meier", 6, "ar", true);
        twin.email = reps[0].email.clone();
        reps.push(twin);
        let mask = validate_votes(&reps, &sheet(), 2, &TallyRules::default());
        assert!(mask[0]);
    }

    #[test]
    fn sections_last_and_first_match() {
        let mut reps = roster();
        let mut twin = rep("Anna Meier", 6, "ar", true);
        twin.email = reps[0].email.clone();
        reps.push(twin);
        let emails = ["anna.meier@epfl.ch", "nobody@epfl.ch"];
        assert_eq!(
            sections_for_emails(&reps, &emails, MatchPolicy::LastMatchWins),
            vec![ResolvedSection::Known("ar".to_string()), ResolvedSection::Unknown]
        );
        assert_eq!(
            sections_for_emails(&reps, &emails, MatchPolicy::FirstMatchWins)[0],
            ResolvedSection::Known("cms".to_string())
        );
    }

    #[test]
    fn default_layout_is_a_partition() {
        let layout = SectionLayout::default();
        let mut members: Vec<String> = layout
            .groups()
            .iter()
            .flat_map(|g| g.sections.clone())
            .collect();
        assert_eq!(members.len(), layout.sections().len());
        members.sort();
        let mut sections = layout.sections().to_vec();
        sections.sort();
        assert_eq!(members, sections);
        for s in layout.sections() {
            let n = layout
                .groups()
                .iter()
                .filter(|g| g.contains(&ResolvedSection::Known(s.clone())))
                .count();
            assert_eq!(n, 1, "section {}", s);
        }
        // The layout is rebuilt identically through the checked constructor.
        let rebuilt = SectionLayout::new(
            layout.sections().to_vec(),
            layout.groups().iter().map(|g| g.sections.clone()).collect(),
        )
        .unwrap();
        assert_eq!(rebuilt, layout);
        assert_eq!(
            layout.group_of(&ResolvedSection::Known("siq".to_string())).map(|g| g.name()),
            Some("ph_siq".to_string())
        );
        assert_eq!(layout.group_of(&ResolvedSection::Unknown), None);
    }

    #[test]
    fn invalid_layouts() {
        let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<String>>();
        assert!(SectionLayout::new(s(&["a", "b"]), vec![s(&["a"])]).is_err());
        assert!(SectionLayout::new(s(&["a", "b"]), vec![s(&["a", "b"]), s(&["b"])]).is_err());
        assert!(SectionLayout::new(s(&["a"]), vec![s(&["a", "c"])]).is_err());
        assert!(SectionLayout::new(s(&["a", "a"]), vec![s(&["a"])]).is_err());
        assert!(SectionLayout::new(s(&["a", "b"]), vec![s(&["b"]), s(&["a"])]).is_ok());
    }

    #[test]
    fn cached_sections_are_checked() {
        let layout = SectionLayout::default();
        assert_eq!(
            ResolvedSection::from_cached("mte", &layout),
            ResolvedSection::Known("mte".to_string())
        );
        assert_eq!(
            ResolvedSection::from_cached("xyz", &layout),
            ResolvedSection::Unknown
        );
        assert_eq!(ResolvedSection::from_cached("", &layout), ResolvedSection::Unknown);
    }

    #[test]
    fn classify_columns() {
        let rules = TallyRules::default();
        assert_eq!(
            rules.classify("DECISION: statutes"),
            Some(QuestionKind::Decision)
        );
        assert_eq!(
            rules.classify("Rate the venue [PREFERENCES]"),
            Some(QuestionKind::Preference)
        );
        assert_eq!(
            rules.classify("DECISION or PREFERENCES"),
            Some(QuestionKind::Decision)
        );
        assert_eq!(rules.classify("Horodateur"), None);
    }

    #[test]
    fn tally_whole_sheet() {
        init();
        let results = tally_votes(
            &roster(),
            &sheet(),
            &SectionLayout::default(),
            &TallyRules::default(),
        )
        .unwrap();
        // Only the two marked columns, in column order.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "PREFERENCES: venue");
        assert_eq!(results[1].title, "DECISION: statutes");

        // Anna 8, Bruno 4, Denis 6.
        assert_eq!(
            results[0].overall.to_string(),
            "6.0/10 (Sum: 18 with 3)."
        );
        let groups: Vec<&str> = results[0].per_group.iter().map(|(g, _)| g.as_str()).collect();
        let layout = SectionLayout::default();
        let expected: Vec<String> = layout.groups().iter().map(|g| g.name()).collect();
        assert_eq!(groups, expected);

        let get = |r: &QuestionResult, name: &str| {
            r.per_group
                .iter()
                .find(|(g, _)| g == name)
                .map(|(_, a)| a.to_string())
                .unwrap()
        };
        assert_eq!(get(&results[0], "cms"), "8.0/10 (Sum: 8 with 1).");
        // Chloe did not answer the preference question.
        assert_eq!(get(&results[0], "sv_nx"), "4.0/10 (Sum: 4 with 1).");
        assert_eq!(get(&results[0], "mx"), "no data/10 (Sum: 0 with 0).");

        // Denis has no section: counted overall only.
        assert_eq!(
            results[1].overall,
            Aggregate::Majority(MajorityTally {
                yes: 2,
                no: 1,
                neutral: 1
            })
        );
        assert_eq!(
            get(&results[1], "sv_nx"),
            "YES (Yes: 1/2: 50.00% / No: 1/2: 50.00% / Neutral: 0)."
        );
        // Eva did not vote.
        assert_eq!(
            get(&results[1], "ph_siq"),
            "no vote (Yes: 0 / No: 0 / Neutral: 0)."
        );
    }

    #[test]
    fn absent_representative_contributes_nothing() {
        let mut reps = roster();
        let mut frank = rep("Frank Stern", 7, "mx", true);
        frank.email = Some("frank.stern@epfl.ch".to_string());
        reps.push(frank);
        let with = tally_votes(
            &reps,
            &sheet(),
            &SectionLayout::default(),
            &TallyRules::default(),
        )
        .unwrap();
        let without = tally_votes(
            &roster(),
            &sheet(),
            &SectionLayout::default(),
            &TallyRules::default(),
        )
        .unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn invalid_score_names_the_question() {
        let mut b = Builder::new("Adresse e-mail")
            .questions(&["PREFERENCES: venue".to_string()]);
        b.add_ballot("anna.meier@epfl.ch", &["3"]).unwrap();
        b.add_ballot("bruno.keller@epfl.ch", &["x"]).unwrap();
        let res = tally_votes(
            &roster(),
            &b.build(),
            &SectionLayout::default(),
            &TallyRules::default(),
        );
        assert_eq!(
            res,
            Err(VotingErrors::InvalidScore {
                question: Some("PREFERENCES: venue".to_string()),
                answer: "x".to_string()
            })
        );
    }

    #[test]
    fn malformed_ballot() {
        let mut b = Builder::new("Adresse e-mail").questions(&["DECISION".to_string()]);
        assert_eq!(
            b.add_ballot("anna.meier@epfl.ch", &["Yes", "No"]),
            Err(VotingErrors::MalformedBallot {
                expected: 1,
                found: 2
            })
        );
    }
}
