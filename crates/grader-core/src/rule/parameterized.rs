//! Rules driven by a stored parameter bag.

use grader_state::{ParameterBag, RuleKind, RuleRecord};

use super::checks::{
    self, ConnectiveSettings, FirstPersonSettings, InterventionSettings, LengthSettings,
    NormSettings, ReferenceSettings, RepetitionSettings, StructureSettings, ThemeSettings,
    ARGUMENT_CONNECTIVES, COHESION_CONNECTIVES,
};
use super::{Rule, Verdict};
use crate::domain::RuleError;

/// A rule whose thresholds and keyword lists come from its parameters.
///
/// Parameters are resolved on every check, so a malformed value surfaces as
/// an evaluation error for this rule only.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedRule {
    name: String,
    description: String,
    kind: RuleKind,
    parameters: ParameterBag,
}

impl ParameterizedRule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: RuleKind,
        parameters: ParameterBag,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            parameters,
        }
    }

    /// Replace the parameters with `overrides` merged on top.
    pub fn with_overrides(mut self, overrides: &ParameterBag) -> Self {
        self.parameters = self.parameters.merged_with(overrides);
        self
    }
}

impl From<RuleRecord> for ParameterizedRule {
    fn from(record: RuleRecord) -> Self {
        Self::new(
            record.name,
            record.description,
            record.kind,
            record.parameters,
        )
    }
}

impl Rule for ParameterizedRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn kind(&self) -> RuleKind {
        self.kind
    }

    fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }

    fn check(&self, text: &str) -> Result<Verdict, RuleError> {
        let p = &self.parameters;
        match self.kind {
            RuleKind::NormCompliance => {
                checks::norm_compliance(text, &NormSettings::from_params(p)?)
            }
            RuleKind::ThemeAdequacy => {
                checks::theme_adequacy(text, &ThemeSettings::from_params(p)?)
            }
            RuleKind::EssayStructure => {
                checks::essay_structure(text, &StructureSettings::from_params(p)?)
            }
            RuleKind::ArgumentPertinence => checks::argument_pertinence(
                text,
                &ConnectiveSettings::from_params(p, ARGUMENT_CONNECTIVES)?,
            ),
            RuleKind::Cohesion => checks::cohesion(
                text,
                &ConnectiveSettings::from_params(p, COHESION_CONNECTIVES)?,
            ),
            RuleKind::VocabularyRepetition => {
                checks::vocabulary_repetition(text, &RepetitionSettings::from_params(p)?)
            }
            RuleKind::Referencing => {
                checks::referencing(text, &ReferenceSettings::from_params(p)?)
            }
            RuleKind::InterventionProposal => {
                checks::intervention_proposal(text, &InterventionSettings::from_params(p)?)
            }
            RuleKind::MinimumLength => {
                checks::minimum_length(text, &LengthSettings::from_params(p)?)
            }
            RuleKind::FirstPerson => {
                checks::first_person(text, &FirstPersonSettings::from_params(p)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutcomeStatus;
    use serde_json::json;

    fn rule(kind: RuleKind, parameters: ParameterBag) -> ParameterizedRule {
        ParameterizedRule::new(kind.as_str(), "", kind, parameters)
    }

    #[test]
    fn missing_parameters_fall_back_to_defaults() {
        let r = rule(RuleKind::MinimumLength, ParameterBag::new());
        let text = vec!["texto"; 120].join(" ");
        assert_eq!(r.evaluate(&text).status, OutcomeStatus::Ok);
    }

    #[test]
    fn parameters_change_thresholds() {
        let r = rule(
            RuleKind::MinimumLength,
            ParameterBag::new().with("min_words", json!(200)),
        );
        let text = vec!["texto"; 150].join(" ");
        let outcome = r.evaluate(&text);
        assert_eq!(outcome.status, OutcomeStatus::Violation);
        assert!(outcome.comment.contains("200"));
    }

    #[test]
    fn wrong_parameter_type_is_contained() {
        let r = rule(
            RuleKind::FirstPerson,
            ParameterBag::new().with("forbidden", json!(42)),
        );
        let outcome = r.evaluate("eu acho");
        assert_eq!(outcome.status, OutcomeStatus::EvaluationError);
        assert!(outcome.comment.contains("forbidden"));
    }

    #[test]
    fn custom_forbidden_list() {
        let r = rule(
            RuleKind::FirstPerson,
            ParameterBag::new().with("forbidden", json!(["nós", "nosso"])),
        );
        assert_eq!(r.evaluate("eu acho").status, OutcomeStatus::Ok);
        assert_eq!(r.evaluate("Nós sabemos").status, OutcomeStatus::Violation);
    }

    #[test]
    fn overrides_merge_over_parameters() {
        let r = rule(
            RuleKind::Cohesion,
            ParameterBag::new()
                .with("connectives", json!(["todavia"]))
                .with("min_count", json!(1)),
        )
        .with_overrides(&ParameterBag::new().with("min_count", json!(2)));

        assert_eq!(r.parameters().get("connectives"), Some(&json!(["todavia"])));
        assert_eq!(r.evaluate("todavia").status, OutcomeStatus::Violation);
        assert_eq!(r.evaluate("todavia, todavia").status, OutcomeStatus::Ok);
    }

    #[test]
    fn from_record_keeps_identity() {
        let record = RuleRecord {
            id: grader_state::RuleId(4),
            name: "Cohesion".to_string(),
            description: "Connectives".to_string(),
            kind: RuleKind::Cohesion,
            parameters: ParameterBag::new(),
            created_at: chrono::Utc::now(),
        };
        let r = ParameterizedRule::from(record);
        assert_eq!(r.name(), "Cohesion");
        assert_eq!(r.kind(), RuleKind::Cohesion);
    }
}
