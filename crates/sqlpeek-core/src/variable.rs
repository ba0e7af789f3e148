//! Template variable types
//!
//! A template variable is a free name the template reads, along with the
//! semantic type guessed for it and the demo value used to preview the SQL.

use serde::{Deserialize, Serialize};

/// Semantic type inferred for a template variable
///
/// This set is closed. `String` is the fallback when nothing else matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// Whole number (ids, counts, limits)
    Integer,

    /// Flag (is_/has_ prefixes, enabled/active words)
    Boolean,

    /// Date or timestamp
    Date,

    /// Free text
    String,

    /// Collection used in an SQL `IN (...)` list
    List,
}

impl VariableType {
    /// Get the type as a stable lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::String => "string",
            Self::List => "list",
        }
    }

    /// Canonical demo literal for this type
    ///
    /// String and date literals come pre-quoted so they can be dropped
    /// straight into SQL text.
    pub fn demo_value(&self) -> serde_json::Value {
        match self {
            Self::Integer => serde_json::Value::from(42),
            Self::Boolean => serde_json::Value::Bool(true),
            Self::Date => serde_json::Value::from("'2024-01-01'"),
            Self::String | Self::List => serde_json::Value::from("'demo_value'"),
        }
    }
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a variable was first discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableSource {
    /// A `{{ ... }}` expression site
    #[default]
    Expression,

    /// The guard of an `{% if ... %}` tag
    Conditional,
}

impl std::fmt::Display for VariableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expression => write!(f, "expression"),
            Self::Conditional => write!(f, "conditional"),
        }
    }
}

/// A variable discovered in a template
///
/// Only `name`, `type` and `default_value` go on the wire. `source` and
/// `context` are kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Identifier, unique within one analysis
    pub name: String,

    /// Inferred semantic type
    #[serde(rename = "type")]
    pub var_type: VariableType,

    /// Discovery site
    #[serde(skip)]
    pub source: VariableSource,

    /// Snippet of the site the name came from (e.g. `Expression: user.name`)
    #[serde(skip)]
    pub context: String,

    /// Rendering-ready literal
    pub default_value: serde_json::Value,
}

impl VariableInfo {
    /// Create a variable whose default is the canonical demo literal of its type
    pub fn new(
        name: impl Into<String>,
        var_type: VariableType,
        source: VariableSource,
        context: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            var_type,
            source,
            context: context.into(),
            default_value: var_type.demo_value(),
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = value;
        self
    }
}

/// Check whether `name` matches `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_values_quote_text_types_only() {
        assert_eq!(VariableType::Integer.demo_value(), serde_json::json!(42));
        assert_eq!(VariableType::Boolean.demo_value(), serde_json::json!(true));
        assert_eq!(VariableType::Date.demo_value(), serde_json::json!("'2024-01-01'"));
        assert_eq!(VariableType::String.demo_value(), serde_json::json!("'demo_value'"));
        assert_eq!(VariableType::List.demo_value(), serde_json::json!("'demo_value'"));
    }

    #[test]
    fn identifier_grammar() {
        assert!(is_identifier("user_id"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("CamelCase2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("user-id"));
        assert!(!is_identifier("ref('x')"));
    }

    #[test]
    fn variable_serialization_omits_diagnostics() {
        let var = VariableInfo::new(
            "user_id",
            VariableType::Integer,
            VariableSource::Expression,
            "Expression: user_id",
        );

        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "user_id", "type": "integer", "default_value": 42})
        );
    }
}
