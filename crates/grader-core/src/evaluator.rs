//! Applies a catalogue to a text.
//!
//! Rules run sequentially in catalogue order with no short-circuiting; a
//! violation or failure in one rule never skips the rest.

use tracing::debug;

use crate::catalogue::{default_catalogue, Catalogue, FeedbackStyle};
use crate::domain::{CommentReport, FeedbackReport, OutcomeStatus, RuleOutcome, ScoredReport};
use crate::scorer;

/// One outcome per rule, in catalogue order.
pub fn evaluate_rules(text: &str, catalogue: &Catalogue) -> Vec<RuleOutcome> {
    let outcomes: Vec<RuleOutcome> = catalogue
        .rules()
        .map(|rule| {
            let outcome = rule.evaluate(text);
            debug!(rule = rule.name(), kind = %rule.kind(), status = %outcome.status, "rule applied");
            outcome
        })
        .collect();

    let violations = outcomes
        .iter()
        .filter(|o| o.status != OutcomeStatus::Ok)
        .count();
    debug!(rules = outcomes.len(), violations, "evaluation finished");
    outcomes
}

/// Evaluate with the catalogue's own feedback style.
pub fn evaluate(text: &str, catalogue: &Catalogue) -> FeedbackReport {
    match catalogue.style() {
        FeedbackStyle::Scored => evaluate_scored(text, catalogue).into(),
        FeedbackStyle::CommentOnly => evaluate_comments(text, catalogue).into(),
    }
}

/// Evaluate and score, regardless of the catalogue's style.
pub fn evaluate_scored(text: &str, catalogue: &Catalogue) -> ScoredReport {
    scorer::score(evaluate_rules(text, catalogue))
}

/// Evaluate without points, regardless of the catalogue's style.
pub fn evaluate_comments(text: &str, catalogue: &Catalogue) -> CommentReport {
    CommentReport::new(evaluate_rules(text, catalogue))
}

/// Evaluate against the default catalogue, scored.
pub fn evaluate_default(text: &str) -> ScoredReport {
    evaluate_scored(text, &default_catalogue())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReportEntry;
    use crate::rule::{FixedCheck, FixedRule};

    #[test]
    fn default_report_has_summary_last() {
        let report = evaluate_default("Um texto qualquer.");
        let entries = report.entries();
        assert_eq!(entries.len(), 7);
        assert!(matches!(entries.last(), Some(ReportEntry::Summary(_))));
        assert!(entries[..6]
            .iter()
            .all(|e| matches!(e, ReportEntry::Rule(_))));
    }

    #[test]
    fn style_selects_shape() {
        let catalogue = Catalogue::new(FeedbackStyle::CommentOnly).with_rule(FixedRule::new(
            "Length",
            "",
            FixedCheck::MinimumLength,
        ));
        let report = evaluate("curto", &catalogue);
        assert!(matches!(report, FeedbackReport::CommentOnly(_)));
        assert!(report.summary().is_none());

        let report = evaluate("curto", &catalogue.with_style(FeedbackStyle::Scored));
        assert_eq!(report.summary().map(|s| s.total_max), Some(10));
    }

    #[test]
    fn empty_catalogue_grades_zero() {
        let report = evaluate_scored("texto", &Catalogue::new(FeedbackStyle::Scored));
        assert_eq!(report.len(), 1);
        assert_eq!(report.summary().final_grade, 0.0);
    }
}
