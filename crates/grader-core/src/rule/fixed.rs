//! Rules with hardcoded behavior.

use grader_state::{ParameterBag, RuleKind};

use super::checks::{self, ConnectiveSettings};
use super::{Rule, Verdict};
use crate::domain::RuleError;

/// Capabilities available as fixed rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedCheck {
    NormCompliance,
    ThemeAdequacy,
    ArgumentPertinence,
    TextualCohesion,
    MinimumLength,
    FirstPersonAvoidance,
}

impl FixedCheck {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::NormCompliance => RuleKind::NormCompliance,
            Self::ThemeAdequacy => RuleKind::ThemeAdequacy,
            Self::ArgumentPertinence => RuleKind::ArgumentPertinence,
            Self::TextualCohesion => RuleKind::Cohesion,
            Self::MinimumLength => RuleKind::MinimumLength,
            Self::FirstPersonAvoidance => RuleKind::FirstPerson,
        }
    }

    fn run(&self, text: &str) -> Result<Verdict, RuleError> {
        match self {
            Self::NormCompliance => checks::norm_compliance(text, &Default::default()),
            Self::ThemeAdequacy => checks::theme_adequacy(text, &Default::default()),
            Self::ArgumentPertinence => {
                checks::argument_pertinence(text, &ConnectiveSettings::argumentative())
            }
            Self::TextualCohesion => checks::cohesion(text, &ConnectiveSettings::cohesive()),
            Self::MinimumLength => checks::minimum_length(text, &Default::default()),
            Self::FirstPersonAvoidance => checks::first_person(text, &Default::default()),
        }
    }
}

/// A rule whose behavior ignores parameters.
#[derive(Debug, Clone)]
pub struct FixedRule {
    name: String,
    description: String,
    check: FixedCheck,
    parameters: ParameterBag,
}

impl FixedRule {
    pub fn new(name: impl Into<String>, description: impl Into<String>, check: FixedCheck) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            check,
            parameters: ParameterBag::new(),
        }
    }

    pub fn fixed_check(&self) -> FixedCheck {
        self.check
    }
}

impl Rule for FixedRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> RuleKind {
        self.check.kind()
    }

    fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }

    fn check(&self, text: &str) -> Result<Verdict, RuleError> {
        self.check.run(text)
    }
}
