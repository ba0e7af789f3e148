//! Variable type inference
//!
//! Guesses a [`VariableType`] from the words that make up a variable name,
//! falling back to how the name is used in the surrounding SQL.
//!
//! The rule tables are checked in a fixed order and the first match wins,
//! so a name like `created_id` is an integer, not a date.

use regex::Regex;
use sqlpeek_core::VariableType;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `name IN (` and `IN ({{ name`, captured in one pass
static IN_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:\b([A-Za-z_][A-Za-z0-9_]*)\s+)?",
        r"\bIN\s*\(\s*(?:\{\{[-+]?\s*([A-Za-z_][A-Za-z0-9_]*))?",
    ))
    .unwrap()
});

const INTEGER_WORDS: &[&str] = &[
    "age", "count", "limit", "offset", "id", "num", "amount", "total", "quantity", "number",
];

const BOOLEAN_PREFIXES: &[&str] = &["is", "has", "can", "should", "will"];

const BOOLEAN_WORDS: &[&str] = &["enabled", "disabled", "active", "inactive"];

const DATE_WORDS: &[&str] = &[
    "date", "time", "created", "updated", "birth", "start", "end", "begin", "finish", "datetime",
];

const STRING_WORDS: &[&str] = &[
    "name", "email", "username", "title", "description", "text", "status", "uuid", "id",
];

/// Infers variable types from naming and context
pub struct TypeInferencer;

impl TypeInferencer {
    /// Infer the type of `name`, using `context` (usually the whole template)
    /// only when the name itself is inconclusive
    pub fn infer(name: &str, context: &str) -> VariableType {
        Self::infer_with(name, &Self::in_list_names(context))
    }

    /// Infer the type of `name` given the names [`Self::in_list_names`]
    /// found in its template
    pub fn infer_with(name: &str, in_list: &HashSet<String>) -> VariableType {
        let words = name_words(name);
        let has_word = |table: &[&str]| words.iter().any(|w| table.contains(&w.as_str()));

        if has_word(INTEGER_WORDS) {
            return VariableType::Integer;
        }

        if Self::has_boolean_prefix(&words) || has_word(BOOLEAN_WORDS) {
            return VariableType::Boolean;
        }

        if has_word(DATE_WORDS) {
            return VariableType::Date;
        }

        if has_word(STRING_WORDS) {
            return VariableType::String;
        }

        if in_list.contains(&name.to_ascii_lowercase()) {
            return VariableType::List;
        }

        VariableType::String
    }

    /// Lowercased names used as the left operand of an SQL `IN (` list or
    /// rendered directly inside one
    pub fn in_list_names(context: &str) -> HashSet<String> {
        IN_LIST
            .captures_iter(context)
            .flat_map(|capture| [capture.get(1), capture.get(2)])
            .flatten()
            .map(|name| name.as_str().to_ascii_lowercase())
            .collect()
    }

    /// `is_deleted`, `hasAccess`: a flag prefix followed by at least one more word
    fn has_boolean_prefix(words: &[String]) -> bool {
        words.len() > 1 && BOOLEAN_PREFIXES.contains(&words[0].as_str())
    }
}

/// Split a name into lowercase words on `_`, punctuation and camelCase humps
fn name_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }

        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}
