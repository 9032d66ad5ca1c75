//! Rule logic per capability.
//!
//! Each check has a settings struct whose `Default` holds the documented
//! thresholds and keyword lists, and a `from_params` constructor reading
//! overrides from a parameter bag. Fixed rules run the defaults;
//! parameterized rules run whatever the bag resolves to.

use std::collections::HashMap;

use grader_state::ParameterBag;

use super::params::Params;
use super::Verdict;
use crate::domain::RuleError;
use crate::text::{self, KeywordMatcher};

pub const ARGUMENT_CONNECTIVES: &[&str] = &[
    "portanto",
    "logo",
    "pois",
    "assim",
    "desse modo",
    "por isso",
    "consequentemente",
];

pub const COHESION_CONNECTIVES: &[&str] = &[
    "e",
    "mas",
    "porém",
    "entretanto",
    "assim",
    "além disso",
    "portanto",
];

pub const FIRST_PERSON_MARKERS: &[&str] = &["eu", "minha", "meu", "acho", "penso"];

pub const CONCLUSION_MARKERS: &[&str] = &[
    "portanto",
    "logo",
    "dessa forma",
    "assim",
    "em suma",
    "conclui-se",
];

pub const REFERENCE_MARKERS: &[&str] = &[
    "segundo",
    "de acordo com",
    "conforme",
    "dados",
    "pesquisa",
    "lei",
    "constituição",
    "filósofo",
    "estudo",
];

pub const INTERVENTION_COMPONENTS: &[(&str, &[&str])] = &[
    (
        "agent",
        &["governo", "estado", "ministério", "escola", "sociedade", "mídia", "ong"],
    ),
    (
        "action",
        &["deve", "devem", "criar", "promover", "implementar", "investir", "ampliar"],
    ),
    (
        "means",
        &["por meio de", "através de", "mediante", "por intermédio de"],
    ),
    (
        "purpose",
        &["a fim de", "para que", "com o objetivo de", "com a finalidade de"],
    ),
    ("detail", &["como", "por exemplo", "ou seja", "isto é"]),
];

// ---------------------------------------------------------------------------
// Norm compliance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormSettings {
    /// Characters accepted on top of the base allow-list.
    pub extra_allowed: String,
    pub max_disallowed: usize,
}

impl NormSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        Ok(Self {
            extra_allowed: p.text("extra_allowed", "")?,
            max_disallowed: p.count("max_disallowed", 0)?,
        })
    }
}

pub fn norm_compliance(text: &str, settings: &NormSettings) -> Result<Verdict, RuleError> {
    let bad = text::disallowed_chars(text, &settings.extra_allowed);
    if bad.len() > settings.max_disallowed {
        let mut shown: Vec<char> = Vec::new();
        for c in &bad {
            if !shown.contains(c) && shown.len() < 5 {
                shown.push(*c);
            }
        }
        let shown: String = shown.into_iter().collect();
        return Ok(Verdict::Violated(format!(
            "Unusual characters suggest writing errors ({} found: {shown}).",
            bad.len()
        )));
    }
    Ok(Verdict::Satisfied(
        "Good command of the standard written norm.".to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Theme adequacy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSettings {
    pub keywords: Vec<String>,
    pub min_keyword_hits: usize,
    pub min_words: usize,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            min_keyword_hits: 1,
            min_words: 30,
        }
    }
}

impl ThemeSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        let d = Self::default();
        Ok(Self {
            keywords: p.words("keywords", &[])?,
            min_keyword_hits: p.count("min_keyword_hits", d.min_keyword_hits)?,
            min_words: p.count("min_words", d.min_words)?,
        })
    }
}

pub fn theme_adequacy(text: &str, settings: &ThemeSettings) -> Result<Verdict, RuleError> {
    let words = text::word_count(text);
    if words < settings.min_words {
        return Ok(Verdict::Violated(format!(
            "The text is short and may not develop the theme ({words} words, minimum {}).",
            settings.min_words
        )));
    }

    if !settings.keywords.is_empty() {
        let found = KeywordMatcher::new(&settings.keywords)?.distinct_matches(text);
        if found.len() < settings.min_keyword_hits {
            return Ok(Verdict::Violated(format!(
                "Few theme keywords found ({} of at least {}).",
                found.len(),
                settings.min_keyword_hits
            )));
        }
        return Ok(Verdict::Satisfied(format!(
            "The text addresses the theme ({} keywords found).",
            found.len()
        )));
    }

    Ok(Verdict::Satisfied(
        "The text appears to address the theme at an initial level.".to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Dissertative-argumentative structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StructureSettings {
    pub min_paragraphs: usize,
    pub conclusion_markers: Vec<String>,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            min_paragraphs: 3,
            conclusion_markers: CONCLUSION_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl StructureSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        Ok(Self {
            min_paragraphs: p.count("min_paragraphs", 3)?,
            conclusion_markers: p.words("conclusion_markers", CONCLUSION_MARKERS)?,
        })
    }
}

pub fn essay_structure(text: &str, settings: &StructureSettings) -> Result<Verdict, RuleError> {
    let paragraphs = text::paragraphs(text);
    if paragraphs.len() < settings.min_paragraphs {
        return Ok(Verdict::Violated(format!(
            "Only {} paragraphs; expected introduction, development and conclusion (minimum {}).",
            paragraphs.len(),
            settings.min_paragraphs
        )));
    }

    if !settings.conclusion_markers.is_empty() {
        let matcher = KeywordMatcher::new(&settings.conclusion_markers)?;
        let concluded = paragraphs.last().is_some_and(|p| matcher.is_match(p));
        if !concluded {
            return Ok(Verdict::Violated(
                "The last paragraph has no conclusion marker.".to_string(),
            ));
        }
    }

    Ok(Verdict::Satisfied(format!(
        "Recognisable structure across {} paragraphs.",
        paragraphs.len()
    )))
}

// ---------------------------------------------------------------------------
// Connectives (argument pertinence, cohesion)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectiveSettings {
    pub connectives: Vec<String>,
    pub min_count: usize,
}

impl ConnectiveSettings {
    pub fn argumentative() -> Self {
        Self::with_list(ARGUMENT_CONNECTIVES)
    }

    pub fn cohesive() -> Self {
        Self::with_list(COHESION_CONNECTIVES)
    }

    fn with_list(list: &[&str]) -> Self {
        Self {
            connectives: list.iter().map(|s| s.to_string()).collect(),
            min_count: 1,
        }
    }

    pub fn from_params(bag: &ParameterBag, default_list: &[&str]) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        Ok(Self {
            connectives: p.words("connectives", default_list)?,
            min_count: p.count("min_count", 1)?,
        })
    }
}

pub fn argument_pertinence(
    text: &str,
    settings: &ConnectiveSettings,
) -> Result<Verdict, RuleError> {
    let count = KeywordMatcher::new(&settings.connectives)?.count(text);
    if count < settings.min_count {
        return Ok(Verdict::Violated(format!(
            "Few argumentative connectives ({count} found, minimum {}); arguments are weakly articulated.",
            settings.min_count
        )));
    }
    Ok(Verdict::Satisfied(format!(
        "Argumentative connectives are present ({count} found)."
    )))
}

pub fn cohesion(text: &str, settings: &ConnectiveSettings) -> Result<Verdict, RuleError> {
    let count = KeywordMatcher::new(&settings.connectives)?.count(text);
    if count < settings.min_count {
        return Ok(Verdict::Violated(format!(
            "Little use of connectives to ensure textual cohesion ({count} found, minimum {}).",
            settings.min_count
        )));
    }
    Ok(Verdict::Satisfied(format!(
        "Adequate use of connectives ({count} found)."
    )))
}

// ---------------------------------------------------------------------------
// Vocabulary repetition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RepetitionSettings {
    pub max_repetitions: usize,
    pub min_word_length: usize,
    pub ignore: Vec<String>,
}

impl Default for RepetitionSettings {
    fn default() -> Self {
        Self {
            max_repetitions: 5,
            min_word_length: 4,
            ignore: Vec::new(),
        }
    }
}

impl RepetitionSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        Ok(Self {
            max_repetitions: p.count("max_repetitions", 5)?,
            min_word_length: p.count("min_word_length", 4)?,
            ignore: p.words("ignore", &[])?,
        })
    }
}

pub fn vocabulary_repetition(
    text: &str,
    settings: &RepetitionSettings,
) -> Result<Verdict, RuleError> {
    let ignore: Vec<String> = settings.ignore.iter().map(|w| w.to_lowercase()).collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in text::words_lowercase(text) {
        if word.chars().count() >= settings.min_word_length && !ignore.contains(&word) {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut repeated: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, n)| *n > settings.max_repetitions)
        .collect();

    if repeated.is_empty() {
        return Ok(Verdict::Satisfied(
            "Varied vocabulary without excessive repetition.".to_string(),
        ));
    }

    repeated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let listed = repeated
        .iter()
        .take(3)
        .map(|(w, n)| format!("{w} ({n}x)"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Verdict::Violated(format!(
        "Repeated words above {} occurrences: {listed}.",
        settings.max_repetitions
    )))
}

// ---------------------------------------------------------------------------
// Referencing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSettings {
    pub markers: Vec<String>,
    pub min_references: usize,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            markers: REFERENCE_MARKERS.iter().map(|s| s.to_string()).collect(),
            min_references: 1,
        }
    }
}

impl ReferenceSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        Ok(Self {
            markers: p.words("markers", REFERENCE_MARKERS)?,
            min_references: p.count("min_references", 1)?,
        })
    }
}

pub fn referencing(text: &str, settings: &ReferenceSettings) -> Result<Verdict, RuleError> {
    let count = KeywordMatcher::new(&settings.markers)?.count(text);
    if count < settings.min_references {
        return Ok(Verdict::Violated(format!(
            "Few references to outside knowledge ({count} found, minimum {}).",
            settings.min_references
        )));
    }
    Ok(Verdict::Satisfied(format!(
        "Draws on outside knowledge ({count} references)."
    )))
}

// ---------------------------------------------------------------------------
// Intervention proposal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct InterventionSettings {
    /// Component name paired with the markers that evidence it.
    pub components: Vec<(String, Vec<String>)>,
    pub min_components: usize,
}

impl Default for InterventionSettings {
    fn default() -> Self {
        Self {
            components: INTERVENTION_COMPONENTS
                .iter()
                .map(|(name, words)| {
                    (
                        name.to_string(),
                        words.iter().map(|w| w.to_string()).collect(),
                    )
                })
                .collect(),
            min_components: 3,
        }
    }
}

impl InterventionSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        Ok(Self {
            components: p.word_groups("components", INTERVENTION_COMPONENTS)?,
            min_components: p.count("min_components", 3)?,
        })
    }
}

pub fn intervention_proposal(
    text: &str,
    settings: &InterventionSettings,
) -> Result<Verdict, RuleError> {
    let mut present = Vec::new();
    let mut missing = Vec::new();
    for (name, markers) in &settings.components {
        if KeywordMatcher::new(markers)?.is_match(text) {
            present.push(name.as_str());
        } else {
            missing.push(name.as_str());
        }
    }

    if present.len() < settings.min_components {
        let missing = if missing.is_empty() {
            "none".to_string()
        } else {
            missing.join(", ")
        };
        return Ok(Verdict::Violated(format!(
            "Incomplete intervention proposal ({} of at least {} components; missing: {missing}).",
            present.len(),
            settings.min_components
        )));
    }
    Ok(Verdict::Satisfied(format!(
        "Intervention proposal covers {}.",
        present.join(", ")
    )))
}

// ---------------------------------------------------------------------------
// Minimum length
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LengthSettings {
    pub min_words: usize,
}

impl Default for LengthSettings {
    fn default() -> Self {
        Self { min_words: 120 }
    }
}

impl LengthSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        Ok(Self {
            min_words: Params::new(bag).count("min_words", 120)?,
        })
    }
}

pub fn minimum_length(text: &str, settings: &LengthSettings) -> Result<Verdict, RuleError> {
    let words = text::word_count(text);
    if words < settings.min_words {
        return Ok(Verdict::Violated(format!(
            "Short text: {words} words (recommended minimum: {}).",
            settings.min_words
        )));
    }
    Ok(Verdict::Satisfied(format!(
        "Adequate length: {words} words (minimum: {}).",
        settings.min_words
    )))
}

// ---------------------------------------------------------------------------
// First person
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FirstPersonSettings {
    pub forbidden: Vec<String>,
    pub max_occurrences: usize,
}

impl Default for FirstPersonSettings {
    fn default() -> Self {
        Self {
            forbidden: FIRST_PERSON_MARKERS.iter().map(|s| s.to_string()).collect(),
            max_occurrences: 0,
        }
    }
}

impl FirstPersonSettings {
    pub fn from_params(bag: &ParameterBag) -> Result<Self, RuleError> {
        let p = Params::new(bag);
        Ok(Self {
            forbidden: p.words("forbidden", FIRST_PERSON_MARKERS)?,
            max_occurrences: p.count("max_occurrences", 0)?,
        })
    }
}

pub fn first_person(text: &str, settings: &FirstPersonSettings) -> Result<Verdict, RuleError> {
    let matcher = KeywordMatcher::new(&settings.forbidden)?;
    let count = matcher.count(text);
    if count > settings.max_occurrences {
        let found = matcher
            .distinct_matches(text)
            .into_iter()
            .collect::<Vec<_>>()
            .join(", ");
        return Ok(Verdict::Violated(format!(
            "First-person usage found ({found}); keep dissertative-argumentative writing impersonal."
        )));
    }
    Ok(Verdict::Satisfied(
        "No clear first-person markers.".to_string(),
    ))
}
