//! Grader Core Library
//!
//! The rule evaluation engine: rules, catalogues, the evaluator, scoring and
//! feedback reports, plus the submission workflow over `grader-state`.

pub mod catalogue;
pub mod domain;
pub mod evaluator;
pub mod reporting;
pub mod rule;
pub mod scorer;
pub mod submission;
pub mod telemetry;
pub mod text;

pub use catalogue::{
    canonical_rule_definitions, default_catalogue, default_parameters, load_catalogue,
    load_catalogue_for_model, seed_rules, Catalogue, FeedbackStyle,
};
pub use domain::{
    CommentReport, FeedbackReport, GraderError, OutcomeStatus, ReportEntry, Result, RuleError,
    RuleOutcome, ScoreSummary, ScoredOutcome, ScoredReport,
};
pub use evaluator::{evaluate, evaluate_comments, evaluate_default, evaluate_rules, evaluate_scored};
pub use reporting::{
    default_report_file_name, render_header, render_report, write_report_json,
    write_report_text, ReportHeader,
};
pub use rule::{FixedCheck, FixedRule, ParameterizedRule, Rule, Verdict};
pub use scorer::{final_grade, score, POINTS_PER_RULE};
pub use submission::{grade_submission, SubmissionRequest, SubmissionResult};
pub use text::{word_count, KeywordMatcher};
