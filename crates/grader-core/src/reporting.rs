//! Text and JSON rendering of feedback reports.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use crossterm::style::Stylize;
use grader_state::EssayId;
use serde::{Deserialize, Serialize};

use crate::domain::{FeedbackReport, OutcomeStatus, Result, RuleOutcome};

const RULE: &str = "------------------------------------------------------------";

/// Identifies the submission a report belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub student: String,
    pub title: String,
    pub essay_id: EssayId,
    pub version: u32,
    pub generated_at: DateTime<Utc>,
}

/// `essay_report_<essay>_v<version>.txt`
pub fn default_report_file_name(essay_id: EssayId, version: u32) -> String {
    format!("essay_report_{essay_id}_v{version}.txt")
}

fn status_label(status: OutcomeStatus, colored: bool) -> String {
    let label = status.as_str().to_uppercase();
    if !colored {
        return label;
    }
    match status {
        OutcomeStatus::Ok => label.green().bold().to_string(),
        OutcomeStatus::Violation => label.red().bold().to_string(),
        OutcomeStatus::EvaluationError => label.yellow().bold().to_string(),
    }
}

fn push_outcome(out: &mut String, outcome: &RuleOutcome, points: Option<(u32, u32)>, colored: bool) {
    let name = if colored {
        outcome.rule.as_str().bold().to_string()
    } else {
        outcome.rule.clone()
    };
    let _ = writeln!(out, "{name}");
    let _ = writeln!(out, "  Status:  {}", status_label(outcome.status, colored));
    let _ = writeln!(out, "  Comment: {}", outcome.comment);
    if let Some((points, max)) = points {
        let _ = writeln!(out, "  Points:  {points}/{max}");
    }
    out.push('\n');
}

/// Header lines for a filed submission.
pub fn render_header(header: &ReportHeader) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ESSAY FEEDBACK REPORT");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Student: {}", header.student);
    let _ = writeln!(out, "Title:   {}", header.title);
    let _ = writeln!(out, "Essay:   {} (version {})", header.essay_id, header.version);
    let _ = writeln!(
        out,
        "Date:    {}",
        header.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "{RULE}");
    out
}

/// Render one block per rule, followed by the summary when scored.
pub fn render_report(report: &FeedbackReport, colored: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "RULE FEEDBACK");
    let _ = writeln!(out, "{RULE}");

    match report {
        FeedbackReport::Scored(scored) => {
            for entry in scored.outcomes() {
                push_outcome(&mut out, &entry.outcome, Some((entry.points, entry.max)), colored);
            }
            let summary = scored.summary();
            let _ = writeln!(out, "{RULE}");
            let _ = writeln!(
                out,
                "Total points: {}/{}",
                summary.total_points, summary.total_max
            );
            let grade = format!("{:.2}", summary.final_grade);
            let grade = if colored {
                grade.bold().to_string()
            } else {
                grade
            };
            let _ = writeln!(out, "Final grade:  {grade} / 10");
        }
        FeedbackReport::CommentOnly(comments) => {
            for outcome in comments.outcomes() {
                push_outcome(&mut out, outcome, None, colored);
            }
            let _ = writeln!(out, "{RULE}");
            let _ = writeln!(
                out,
                "Rules satisfied: {}/{}",
                report.count_status(OutcomeStatus::Ok),
                comments.len()
            );
        }
    }
    out
}

/// Write the plain-text report (no colour codes), with optional header.
pub fn write_report_text(
    path: &Path,
    report: &FeedbackReport,
    header: Option<&ReportHeader>,
) -> Result<()> {
    let mut content = header.map(render_header).unwrap_or_default();
    content.push_str(&render_report(report, false));
    std::fs::write(path, content)?;
    Ok(())
}

/// Write the report as pretty JSON.
pub fn write_report_json(path: &Path, report: &FeedbackReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate_default;

    #[test]
    fn file_name_pattern() {
        assert_eq!(
            default_report_file_name(EssayId(4), 2),
            "essay_report_4_v2.txt"
        );
    }

    #[test]
    fn plain_render_has_no_escape_codes() {
        let report = FeedbackReport::from(evaluate_default(""));
        let text = render_report(&report, false);
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("Minimum length"));
        assert!(text.contains("VIOLATION"));
        assert!(text.contains("Total points: 20/60"));
        assert!(text.contains("Final grade:  3.33 / 10"));
    }

    #[test]
    fn colored_render_styles_statuses() {
        let report = FeedbackReport::from(evaluate_default(""));
        let text = render_report(&report, true);
        assert!(text.contains('\u{1b}'));
    }
}
