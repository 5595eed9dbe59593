use crate::config::*;

/// Formats the result of one question as a block of lines, followed by a blank line.
pub fn format_question_result(result: &QuestionResult, hide_group_detail: bool) -> String {
    let mut res = format!("{}\n", result.title);
    res.push_str(&format!("Total: {}\n", result.overall));
    if !hide_group_detail {
        res.push_str("Per section group:\n");
        for (group, agg) in result.per_group.iter() {
            res.push_str(&format!("{}: {}\n", group, agg));
        }
    }
    res.push('\n');
    res
}

/// The complete report: the destination on the first line, then one block per question.
pub fn format_report(destination: &str, results: &[QuestionResult], rules: &TallyRules) -> String {
    let mut res = format!("{}\n\n", destination);
    for r in results.iter() {
        res.push_str(&format_question_result(r, rules.hide_groups(r.kind)));
    }
    res
}
