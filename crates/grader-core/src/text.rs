//! Text primitives shared by every rule.
//!
//! Word counting, the allow-listed character set used for norm screening,
//! paragraph splitting and whole-word keyword matching.

use std::collections::BTreeSet;

use regex::Regex;

/// Accented Latin letters accepted by norm screening (both cases).
pub const ACCENTED_LETTERS: &str = "áéíóúâêôãõçÁÉÍÓÚÂÊÔÃÕÇ";

/// Punctuation and symbols accepted by norm screening.
pub const ALLOWED_SYMBOLS: &str = ".,;:!?()-\"'ªº%€$[]";

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether `c` belongs to the base allow-list or to `extra`.
pub fn is_allowed_char(c: char, extra: &str) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || ACCENTED_LETTERS.contains(c)
        || ALLOWED_SYMBOLS.contains(c)
        || extra.contains(c)
}

/// Every character of `text` outside the allow-list, in order of appearance.
pub fn disallowed_chars(text: &str, extra: &str) -> Vec<char> {
    text.chars().filter(|c| !is_allowed_char(*c, extra)).collect()
}

/// Non-blank lines of `text`, trimmed.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Lowercased word tokens (Unicode `\w+` runs).
pub fn words_lowercase(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Case-insensitive whole-word matcher over a list of keywords.
///
/// Multi-word keywords match across any run of whitespace. Word boundaries
/// are Unicode-aware, so `eu` never matches inside `eufemismo`. An empty
/// keyword list matches nothing.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    regex: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut alternatives: Vec<String> = keywords
            .into_iter()
            .filter_map(|k| keyword_pattern(k.as_ref()))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { regex: None });
        }

        // Longest first so overlapping phrases prefer the fuller match.
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        alternatives.dedup();

        let regex = Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))?;
        Ok(Self { regex: Some(regex) })
    }

    /// Number of non-overlapping matches in `text`.
    pub fn count(&self, text: &str) -> usize {
        match &self.regex {
            Some(re) => re.find_iter(text).count(),
            None => 0,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Distinct matched keywords, lowercased with whitespace collapsed.
    pub fn distinct_matches(&self, text: &str) -> BTreeSet<String> {
        let Some(re) = &self.regex else {
            return BTreeSet::new();
        };
        re.find_iter(text)
            .map(|m| {
                m.as_str()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase()
            })
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn keyword_pattern(keyword: &str) -> Option<String> {
    let words: Vec<&str> = keyword.split_whitespace().collect();
    let (first, last) = (words.first()?, words.last()?);

    let body = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join(r"\s+");

    let lead = if first.starts_with(is_word_char) { r"\b" } else { "" };
    let tail = if last.ends_with(is_word_char) { r"\b" } else { "" };
    Some(format!("{lead}{body}{tail}"))
}
