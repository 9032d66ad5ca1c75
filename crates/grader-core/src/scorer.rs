//! Points-per-rule scoring.
//!
//! Every rule is worth [`POINTS_PER_RULE`]; a rule earns its points only
//! when its outcome is `ok`. The final grade is the earned share scaled to
//! 0–10 and rounded to 2 decimals. An empty outcome list grades 0.0.

use crate::domain::{RuleOutcome, ScoreSummary, ScoredOutcome, ScoredReport};

pub const POINTS_PER_RULE: u32 = 10;

/// Points earned by one outcome.
pub fn points_for(outcome: &RuleOutcome) -> u32 {
    if outcome.status.is_ok() {
        POINTS_PER_RULE
    } else {
        0
    }
}

/// Round half away from zero to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn final_grade(total_points: u32, total_max: u32) -> f64 {
    if total_max == 0 {
        return 0.0;
    }
    round2(f64::from(total_points) / f64::from(total_max) * 10.0)
}

/// Attach points to each outcome and append the summary.
pub fn score(outcomes: Vec<RuleOutcome>) -> ScoredReport {
    let scored: Vec<ScoredOutcome> = outcomes
        .into_iter()
        .map(|outcome| ScoredOutcome {
            points: points_for(&outcome),
            max: POINTS_PER_RULE,
            outcome,
        })
        .collect();

    let total_points = scored.iter().map(|o| o.points).sum();
    let total_max = POINTS_PER_RULE * scored.len() as u32;

    ScoredReport::from_parts(
        scored,
        ScoreSummary {
            total_points,
            total_max,
            final_grade: final_grade(total_points, total_max),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_formula() {
        assert_eq!(final_grade(40, 60), 6.67);
        assert_eq!(final_grade(20, 60), 3.33);
        assert_eq!(final_grade(60, 60), 10.0);
        assert_eq!(final_grade(0, 60), 0.0);
        assert_eq!(final_grade(0, 0), 0.0);
    }

    #[test]
    fn score_appends_summary() {
        let report = score(vec![
            RuleOutcome::ok("A", ""),
            RuleOutcome::violation("B", ""),
            RuleOutcome::evaluation_error("C", ""),
        ]);
        assert_eq!(report.len(), 4);
        let points: Vec<u32> = report.outcomes().iter().map(|o| o.points).collect();
        assert_eq!(points, vec![10, 0, 0]);
        assert_eq!(report.summary().total_points, 10);
        assert_eq!(report.summary().total_max, 30);
        assert_eq!(report.summary().final_grade, 3.33);
    }

    #[test]
    fn empty_outcomes_grade_zero() {
        let report = score(Vec::new());
        assert_eq!(report.summary().total_max, 0);
        assert_eq!(report.summary().final_grade, 0.0);
    }
}
