//! Domain types for the grading engine.
//!
//! - `RuleOutcome` / `ScoredOutcome`: one rule applied to one text
//! - `FeedbackReport`: scored or comment-only result of one evaluation
//! - `GraderError` / `RuleError`: error taxonomy

pub mod error;
pub mod outcome;
pub mod report;

pub use error::{GraderError, Result, RuleError};
pub use outcome::{OutcomeStatus, RuleOutcome, ScoredOutcome};
pub use report::{CommentReport, FeedbackReport, ReportEntry, ScoreSummary, ScoredReport};
