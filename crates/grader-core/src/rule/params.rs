//! Typed reads from a rule's parameter bag.
//!
//! An absent key (or an explicit `null`) yields the documented default; a
//! present key with the wrong JSON type is a [`RuleError`].

use grader_state::ParameterBag;
use serde_json::Value;

use crate::domain::RuleError;

pub(crate) struct Params<'a> {
    bag: &'a ParameterBag,
}

impl<'a> Params<'a> {
    pub(crate) fn new(bag: &'a ParameterBag) -> Self {
        Self { bag }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.bag.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn count(&self, key: &str, default: usize) -> Result<usize, RuleError> {
        match self.present(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| RuleError::invalid(key, "a non-negative integer", value)),
        }
    }

    pub(crate) fn text(&self, key: &str, default: &str) -> Result<String, RuleError> {
        match self.present(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(value) => Err(RuleError::invalid(key, "a string", value)),
        }
    }

    pub(crate) fn words(&self, key: &str, default: &[&str]) -> Result<Vec<String>, RuleError> {
        match self.present(key) {
            None => Ok(owned(default)),
            Some(value) => string_list(value).ok_or_else(|| {
                RuleError::invalid(key, "an array of strings", value)
            }),
        }
    }

    /// A JSON object mapping group names to keyword lists, in key order.
    pub(crate) fn word_groups(
        &self,
        key: &str,
        default: &[(&str, &[&str])],
    ) -> Result<Vec<(String, Vec<String>)>, RuleError> {
        let Some(value) = self.present(key) else {
            return Ok(default
                .iter()
                .map(|(name, words)| (name.to_string(), owned(words)))
                .collect());
        };

        let expected = "an object of string arrays";
        let map = value
            .as_object()
            .ok_or_else(|| RuleError::invalid(key, expected, value))?;

        map.iter()
            .map(|(name, words)| {
                string_list(words)
                    .map(|list| (name.clone(), list))
                    .ok_or_else(|| RuleError::invalid(&format!("{key}.{name}"), expected, words))
            })
            .collect()
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
