//! The rule abstraction.
//!
//! A [`Rule`] is a named, described check over essay text. Implementations
//! provide [`Rule::check`]; callers use [`Rule::evaluate`], which never fails:
//! an `Err` or a panic inside the check becomes an `evaluation-error`
//! outcome naming the rule and the cause.
//!
//! Two implementations exist:
//! - [`FixedRule`]: hardcoded thresholds and keyword lists
//! - [`ParameterizedRule`]: reads its settings from a stored parameter bag

pub mod checks;
mod fixed;
mod parameterized;
mod params;

use std::panic::{self, AssertUnwindSafe};

use grader_state::{ParameterBag, RuleKind};
use tracing::warn;

use crate::domain::{RuleError, RuleOutcome};

pub use fixed::{FixedCheck, FixedRule};
pub use parameterized::ParameterizedRule;

/// Raw result of a check, before it is attached to a rule name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied(String),
    Violated(String),
}

impl Verdict {
    pub fn is_violated(&self) -> bool {
        matches!(self, Self::Violated(_))
    }

    pub fn comment(&self) -> &str {
        match self {
            Self::Satisfied(c) | Self::Violated(c) => c,
        }
    }
}

/// A single heuristic check applied to essay text.
pub trait Rule: Send + Sync {
    /// Display name, unique within a catalogue.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Capability exercised by this rule.
    fn kind(&self) -> RuleKind;

    /// Parameters the rule reads. Empty for fixed rules.
    fn parameters(&self) -> &ParameterBag;

    /// Run the rule logic. May fail; use [`Rule::evaluate`] to contain it.
    fn check(&self, text: &str) -> Result<Verdict, RuleError>;

    /// Apply the rule, converting any failure into an `evaluation-error`.
    fn evaluate(&self, text: &str) -> RuleOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.check(text)))
            .unwrap_or_else(|payload| Err(RuleError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(Verdict::Satisfied(comment)) => RuleOutcome::ok(self.name(), comment),
            Ok(Verdict::Violated(comment)) => RuleOutcome::violation(self.name(), comment),
            Err(err) => {
                warn!(rule = self.name(), error = %err, "rule evaluation failed");
                RuleOutcome::evaluation_error(
                    self.name(),
                    format!("Error applying rule '{}': {err}", self.name()),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
