//! Feedback reports handed to the presentation layer.
//!
//! Two explicit shapes exist:
//!
//! - [`ScoredReport`]: one scored entry per rule in catalogue order followed
//!   by exactly one [`ScoreSummary`]. Serialized as an array of externally
//!   tagged entries, `{"rule": {...}}` or `{"summary": {...}}`.
//! - [`CommentReport`]: rule outcomes only, no points and no summary.

use serde::{Deserialize, Serialize};

use super::error::GraderError;
use super::outcome::{OutcomeStatus, RuleOutcome, ScoredOutcome};

/// Aggregate score appended after the per-rule entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total_points: u32,
    pub total_max: u32,
    /// Grade on a 0–10 scale, rounded to 2 decimals.
    pub final_grade: f64,
}

/// One serialized entry of a scored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportEntry {
    Rule(ScoredOutcome),
    Summary(ScoreSummary),
}

/// Scored feedback: per-rule entries plus a terminal summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<ReportEntry>", try_from = "Vec<ReportEntry>")]
pub struct ScoredReport {
    outcomes: Vec<ScoredOutcome>,
    summary: ScoreSummary,
}

impl ScoredReport {
    pub(crate) fn from_parts(outcomes: Vec<ScoredOutcome>, summary: ScoreSummary) -> Self {
        Self { outcomes, summary }
    }

    pub fn outcomes(&self) -> &[ScoredOutcome] {
        &self.outcomes
    }

    pub fn summary(&self) -> &ScoreSummary {
        &self.summary
    }

    /// Entries in serialized order, summary last.
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.clone().into()
    }

    /// Number of entries including the summary.
    pub fn len(&self) -> usize {
        self.outcomes.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl From<ScoredReport> for Vec<ReportEntry> {
    fn from(report: ScoredReport) -> Self {
        report
            .outcomes
            .into_iter()
            .map(ReportEntry::Rule)
            .chain(std::iter::once(ReportEntry::Summary(report.summary)))
            .collect()
    }
}

impl TryFrom<Vec<ReportEntry>> for ScoredReport {
    type Error = GraderError;

    fn try_from(mut entries: Vec<ReportEntry>) -> Result<Self, Self::Error> {
        let summary = match entries.pop() {
            Some(ReportEntry::Summary(summary)) => summary,
            _ => {
                return Err(GraderError::MalformedReport(
                    "scored report must end with a summary entry".to_string(),
                ))
            }
        };

        let outcomes = entries
            .into_iter()
            .map(|entry| match entry {
                ReportEntry::Rule(outcome) => Ok(outcome),
                ReportEntry::Summary(_) => Err(GraderError::MalformedReport(
                    "summary entry must appear exactly once".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let max: u32 = outcomes.iter().map(|o| o.max).sum();
        if max != summary.total_max {
            return Err(GraderError::MalformedReport(format!(
                "summary total_max {} does not match rule maxima {}",
                summary.total_max, max
            )));
        }

        Ok(Self { outcomes, summary })
    }
}

/// Comment-only feedback: outcomes without points or summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentReport {
    outcomes: Vec<RuleOutcome>,
}

impl CommentReport {
    pub fn new(outcomes: Vec<RuleOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Feedback for one text against one catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum FeedbackReport {
    Scored(ScoredReport),
    CommentOnly(CommentReport),
}

impl FeedbackReport {
    /// Rule outcomes in catalogue order, regardless of shape.
    pub fn rule_outcomes(&self) -> Vec<&RuleOutcome> {
        match self {
            Self::Scored(report) => report.outcomes().iter().map(|o| &o.outcome).collect(),
            Self::CommentOnly(report) => report.outcomes().iter().collect(),
        }
    }

    /// The aggregate score, present only for scored reports.
    pub fn summary(&self) -> Option<&ScoreSummary> {
        match self {
            Self::Scored(report) => Some(report.summary()),
            Self::CommentOnly(_) => None,
        }
    }

    /// Count of outcomes with the given status.
    pub fn count_status(&self, status: OutcomeStatus) -> usize {
        self.rule_outcomes()
            .iter()
            .filter(|o| o.status == status)
            .count()
    }

    /// Whether every rule was satisfied.
    pub fn all_ok(&self) -> bool {
        self.rule_outcomes().iter().all(|o| o.status.is_ok())
    }
}

impl From<ScoredReport> for FeedbackReport {
    fn from(report: ScoredReport) -> Self {
        Self::Scored(report)
    }
}

impl From<CommentReport> for FeedbackReport {
    fn from(report: CommentReport) -> Self {
        Self::CommentOnly(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ScoredReport {
        ScoredReport::from_parts(
            vec![
                ScoredOutcome {
                    outcome: RuleOutcome::ok("A", "fine"),
                    points: 10,
                    max: 10,
                },
                ScoredOutcome {
                    outcome: RuleOutcome::violation("B", "bad"),
                    points: 0,
                    max: 10,
                },
            ],
            ScoreSummary {
                total_points: 10,
                total_max: 20,
                final_grade: 5.0,
            },
        )
    }

    #[test]
    fn scored_report_serializes_with_markers() {
        let value = serde_json::to_value(sample()).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["rule"]["rule"], json!("A"));
        assert!(entries[0].get("summary").is_none());
        assert_eq!(entries[2]["summary"]["total_max"], json!(20));
        assert!(entries[2].get("rule").is_none());
    }

    #[test]
    fn scored_report_deserializes_back() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: ScoredReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn scored_report_rejects_missing_summary() {
        let json = json!([{"rule": {"rule": "A", "status": "ok", "comment": "", "points": 10, "max": 10}}]);
        assert!(serde_json::from_value::<ScoredReport>(json).is_err());
    }

    #[test]
    fn scored_report_rejects_inner_summary() {
        let summary = json!({"summary": {"total_points": 0, "total_max": 0, "final_grade": 0.0}});
        let json = json!([summary.clone(), summary]);
        assert!(serde_json::from_value::<ScoredReport>(json).is_err());
    }

    #[test]
    fn feedback_report_variants_are_tagged() {
        let comments = FeedbackReport::from(CommentReport::new(vec![RuleOutcome::violation(
            "Cohesion",
            "few connectives",
        )]));
        let value = serde_json::to_value(&comments).unwrap();
        assert_eq!(value["kind"], json!("comment_only"));
        assert_eq!(value["entries"][0]["status"], json!("violation"));
        assert!(comments.summary().is_none());
        assert!(!comments.all_ok());

        let scored = FeedbackReport::from(sample());
        assert_eq!(serde_json::to_value(&scored).unwrap()["kind"], json!("scored"));
        assert_eq!(scored.summary().map(|s| s.total_points), Some(10));
        assert_eq!(scored.count_status(OutcomeStatus::Violation), 1);
    }
}
