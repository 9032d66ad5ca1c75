//! Rule catalogues: the ordered rule sets applied to a submission.
//!
//! Two sources exist. [`default_catalogue`] is a pure factory for the six
//! fixed rules. [`load_catalogue`] reads persisted rules (seeding the ten
//! canonical definitions into an empty store first) and wraps them as
//! parameterized rules; [`load_catalogue_for_model`] additionally merges a
//! model's per-kind overrides.

use grader_state::{
    ModelId, ModelStore, NewRule, ParameterBag, RuleKind, RuleRecord, RuleStore,
};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::domain::Result;
use crate::rule::checks::{
    ARGUMENT_CONNECTIVES, COHESION_CONNECTIVES, CONCLUSION_MARKERS, FIRST_PERSON_MARKERS,
    INTERVENTION_COMPONENTS, REFERENCE_MARKERS,
};
use crate::rule::{FixedCheck, FixedRule, ParameterizedRule, Rule};

/// Which report shape a catalogue produces by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStyle {
    /// Points per rule plus a summary.
    Scored,
    /// Status and comment per rule only.
    CommentOnly,
}

/// An ordered collection of rules.
pub struct Catalogue {
    rules: Vec<Box<dyn Rule>>,
    style: FeedbackStyle,
}

impl Catalogue {
    pub fn new(style: FeedbackStyle) -> Self {
        Self {
            rules: Vec::new(),
            style,
        }
    }

    pub fn push(&mut self, rule: impl Rule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Builder-style push.
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn with_style(mut self, style: FeedbackStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> FeedbackStyle {
        self.style
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalogue")
            .field("rules", &self.names())
            .field("style", &self.style)
            .finish()
    }
}

/// The six fixed rules in canonical order, scored.
pub fn default_catalogue() -> Catalogue {
    Catalogue::new(FeedbackStyle::Scored)
        .with_rule(FixedRule::new(
            "Norm compliance",
            "Checks for formal written register.",
            FixedCheck::NormCompliance,
        ))
        .with_rule(FixedRule::new(
            "Theme adequacy",
            "Checks that the text develops the theme.",
            FixedCheck::ThemeAdequacy,
        ))
        .with_rule(FixedRule::new(
            "Argument pertinence",
            "Looks for argumentative connectives.",
            FixedCheck::ArgumentPertinence,
        ))
        .with_rule(FixedRule::new(
            "Textual cohesion",
            "Looks for cohesive connectives.",
            FixedCheck::TextualCohesion,
        ))
        .with_rule(FixedRule::new(
            "Minimum length",
            "Checks for at least 120 words.",
            FixedCheck::MinimumLength,
        ))
        .with_rule(FixedRule::new(
            "First-person avoidance",
            "Keeps the text impersonal.",
            FixedCheck::FirstPersonAvoidance,
        ))
}

fn list(words: &[&str]) -> Value {
    json!(words)
}

/// Default parameter bag stored for a rule of `kind`.
pub fn default_parameters(kind: RuleKind) -> ParameterBag {
    let bag = ParameterBag::new();
    match kind {
        RuleKind::NormCompliance => bag
            .with("extra_allowed", json!(""))
            .with("max_disallowed", json!(0)),
        RuleKind::ThemeAdequacy => bag
            .with("keywords", json!([]))
            .with("min_keyword_hits", json!(1))
            .with("min_words", json!(30)),
        RuleKind::EssayStructure => bag
            .with("min_paragraphs", json!(3))
            .with("conclusion_markers", list(CONCLUSION_MARKERS)),
        RuleKind::ArgumentPertinence => bag
            .with("connectives", list(ARGUMENT_CONNECTIVES))
            .with("min_count", json!(1)),
        RuleKind::Cohesion => bag
            .with("connectives", list(COHESION_CONNECTIVES))
            .with("min_count", json!(1)),
        RuleKind::VocabularyRepetition => bag
            .with("max_repetitions", json!(5))
            .with("min_word_length", json!(4))
            .with("ignore", json!([])),
        RuleKind::Referencing => bag
            .with("markers", list(REFERENCE_MARKERS))
            .with("min_references", json!(1)),
        RuleKind::InterventionProposal => {
            let components: serde_json::Map<String, Value> = INTERVENTION_COMPONENTS
                .iter()
                .map(|(name, words)| (name.to_string(), list(words)))
                .collect();
            bag.with("components", Value::Object(components))
                .with("min_components", json!(3))
        }
        RuleKind::MinimumLength => bag.with("min_words", json!(120)),
        RuleKind::FirstPerson => bag
            .with("forbidden", list(FIRST_PERSON_MARKERS))
            .with("max_occurrences", json!(0)),
    }
}

fn canonical_name(kind: RuleKind) -> (&'static str, &'static str) {
    match kind {
        RuleKind::NormCompliance => ("Norm compliance", "Checks for formal written register."),
        RuleKind::ThemeAdequacy => ("Theme adequacy", "Checks coverage of the proposed theme."),
        RuleKind::EssayStructure => (
            "Dissertative-argumentative structure",
            "Checks for introduction, development and conclusion.",
        ),
        RuleKind::ArgumentPertinence => (
            "Argument pertinence",
            "Looks for argumentative connectives.",
        ),
        RuleKind::Cohesion => ("Cohesion", "Looks for cohesive connectives."),
        RuleKind::VocabularyRepetition => (
            "Vocabulary repetition",
            "Flags words repeated too often.",
        ),
        RuleKind::Referencing => (
            "Referencing",
            "Looks for references to outside knowledge.",
        ),
        RuleKind::InterventionProposal => (
            "Intervention proposal",
            "Checks for agent, action, means, purpose and detail.",
        ),
        RuleKind::MinimumLength => ("Minimum length", "Checks the word count."),
        RuleKind::FirstPerson => ("First-person avoidance", "Keeps the text impersonal."),
    }
}

/// The ten canonical rule definitions seeded into an empty store.
pub fn canonical_rule_definitions() -> Vec<NewRule> {
    RuleKind::ALL
        .into_iter()
        .map(|kind| {
            let (name, description) = canonical_name(kind);
            NewRule {
                name: name.to_string(),
                description: description.to_string(),
                kind,
                parameters: default_parameters(kind),
            }
        })
        .collect()
}

/// Insert the canonical definitions unless any rule already exists.
///
/// Returns the number of rules inserted (0 when skipped).
#[instrument(skip(store))]
pub async fn seed_rules(store: &dyn RuleStore) -> Result<usize> {
    let existing = store.count_rules().await?;
    if existing > 0 {
        debug!(existing, "rule store already populated, skipping seed");
        return Ok(0);
    }

    let definitions = canonical_rule_definitions();
    let count = definitions.len();
    for rule in definitions {
        store.insert_rule(rule).await?;
    }
    info!(count, "seeded canonical rules");
    Ok(count)
}

/// Stored rule records in id order, seeding the canonical set first if empty.
async fn fetch_or_seed(store: &dyn RuleStore) -> Result<Vec<RuleRecord>> {
    let records = store.fetch_rules().await?;
    if !records.is_empty() {
        return Ok(records);
    }
    seed_rules(store).await?;
    Ok(store.fetch_rules().await?)
}

/// Load every persisted rule as a comment-only catalogue, seeding if empty.
#[instrument(skip(store))]
pub async fn load_catalogue(store: &dyn RuleStore) -> Result<Catalogue> {
    let records = fetch_or_seed(store).await?;

    let mut catalogue = Catalogue::new(FeedbackStyle::CommentOnly);
    for record in records {
        catalogue.push(ParameterizedRule::from(record));
    }
    debug!(rules = catalogue.len(), "catalogue loaded");
    Ok(catalogue)
}

/// Load the stored catalogue with `model_id`'s per-kind overrides applied.
///
/// The model's parameter bag maps rule kinds to override objects, e.g.
/// `{"minimum_length": {"min_words": 200}}`. A missing model is
/// `GraderError::ModelNotFound`.
#[instrument(skip(rules, models))]
pub async fn load_catalogue_for_model(
    rules: &dyn RuleStore,
    models: &dyn ModelStore,
    model_id: ModelId,
) -> Result<Catalogue> {
    let model = models.get_model(model_id).await?;
    let records = fetch_or_seed(rules).await?;

    let mut catalogue = Catalogue::new(FeedbackStyle::CommentOnly);
    for record in records {
        let kind = record.kind;
        let mut rule = ParameterizedRule::from(record);
        match model.parameters.get(kind.as_str()) {
            Some(Value::Object(overrides)) => {
                rule = rule.with_overrides(&ParameterBag::from(overrides.clone()));
            }
            Some(other) => {
                warn!(model = %model_id, %kind, value = %other, "ignoring non-object override");
            }
            None => {}
        }
        catalogue.push(rule);
    }
    Ok(catalogue)
}
