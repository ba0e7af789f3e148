//! Variable discovery from raw template text
//!
//! Finds `{{ ... }}` expression sites and `{% if ... %}` guards without a
//! full parse. Spans that are not well formed are ignored.

use regex::Regex;
use sqlpeek_core::{is_identifier, VariableSource};
use std::collections::HashSet;
use std::sync::LazyLock;

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^}]+?)\}\}").unwrap());

static CONDITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%[-+]?\s*(?:el)?if\s+([^%]+?)\s*[-+]?%\}").unwrap()
});

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'[^']*'|"[^"]*""#).unwrap());

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap());

/// Words in a guard that are never variables
const RESERVED_WORDS: &[&str] = &[
    "if", "elif", "else", "endif", "not", "and", "or", "in", "is", "defined",
];

const LITERAL_CONSTANTS: &[&str] = &["true", "false", "none"];

/// Names the engine defines itself inside blocks
const ENGINE_NAMES: &[&str] = &["loop"];

/// A name found in template text, before type inference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedVariable {
    pub name: String,
    pub source: VariableSource,
    pub context: String,
}

/// Extracts free variable names from template text
pub struct VariableExtractor;

impl VariableExtractor {
    /// Extract all variables, expression sites first, then conditional guards
    ///
    /// `undeclared` is the engine's set of undeclared names. When non-empty,
    /// expression-derived names outside it are dropped. The first discovery
    /// of a name wins.
    pub fn extract(text: &str, undeclared: &HashSet<String>) -> Vec<ExtractedVariable> {
        let mut seen = HashSet::new();

        Self::expression_variables(text, undeclared)
            .into_iter()
            .chain(Self::conditional_variables(text))
            .filter(|var| seen.insert(var.name.clone()))
            .collect()
    }

    /// Variables referenced by `{{ ... }}` expressions, in source order
    pub fn expression_variables(
        text: &str,
        undeclared: &HashSet<String>,
    ) -> Vec<ExtractedVariable> {
        let mut variables = Vec::new();

        for capture in EXPRESSION.captures_iter(text) {
            let expression = strip_whitespace_control(&capture[1]);

            let Some(name) = Self::base_variable(expression) else {
                continue;
            };

            if !undeclared.is_empty() && !undeclared.contains(name) {
                continue;
            }

            variables.push(ExtractedVariable {
                name: name.to_string(),
                source: VariableSource::Expression,
                context: format!("Expression: {}", expression),
            });
        }

        variables
    }

    /// Variables referenced by `{% if %}` / `{% elif %}` guards, in source order
    pub fn conditional_variables(text: &str) -> Vec<ExtractedVariable> {
        let mut variables = Vec::new();

        for capture in CONDITIONAL.captures_iter(text) {
            let condition = capture[1].trim();

            for name in Self::guard_names(condition) {
                variables.push(ExtractedVariable {
                    name,
                    source: VariableSource::Conditional,
                    context: format!("Condition: {}", condition),
                });
            }
        }

        variables
    }

    /// Reduce an expression to the variable it reads
    ///
    /// Examples:
    /// - `user.name` → `user`
    /// - `rows[0]` → `rows`
    /// - `title | upper` → `title`
    /// - `'literal'` → none
    pub fn base_variable(expression: &str) -> Option<&str> {
        let expr = expression.split('|').next()?.trim();
        let expr = expr.split('.').next()?;
        let expr = expr.split('[').next()?.trim();

        is_identifier(expr).then_some(expr)
    }

    /// Candidate variable names in a guard
    fn guard_names(condition: &str) -> Vec<String> {
        let stripped = STRING_LITERAL.replace_all(condition, " ");
        let mut names = Vec::new();

        for word in WORD.find_iter(&stripped) {
            // Attribute names belong to the object before the dot
            if stripped[..word.start()].trim_end().ends_with('.') {
                continue;
            }

            let name = word.as_str();
            if RESERVED_WORDS.contains(&name)
                || ENGINE_NAMES.contains(&name)
                || LITERAL_CONSTANTS.contains(&name.to_ascii_lowercase().as_str())
            {
                continue;
            }

            names.push(name.to_string());
        }

        names
    }
}

/// Drop `-`/`+` whitespace-control markers hugging the delimiters
fn strip_whitespace_control(raw: &str) -> &str {
    let raw = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    let raw = raw.strip_suffix(['-', '+']).unwrap_or(raw);
    raw.trim()
}
