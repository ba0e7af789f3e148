//! Analysis and render result records
//!
//! These are the wire formats the CLI prints with `--json`.
//! Field names are part of the public output and must stay stable.

use serde::{Deserialize, Serialize};
use crate::variable::VariableInfo;

/// Outcome of analyzing one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Whether analysis completed
    pub success: bool,

    /// Discovered variables, in first-occurrence order
    pub variables: Vec<VariableInfo>,

    /// Flattened preview SQL (present iff `success`)
    pub demo_sql: Option<String>,

    /// Failure message (present iff not `success`)
    pub error: Option<String>,

    /// Template contains an `if`/`elif` tag
    pub has_conditionals: bool,

    /// Template contains a `for` tag
    pub has_loops: bool,
}

impl AnalysisResult {
    /// Create a successful result
    pub fn success(
        variables: Vec<VariableInfo>,
        demo_sql: impl Into<String>,
        has_conditionals: bool,
        has_loops: bool,
    ) -> Self {
        Self {
            success: true,
            variables,
            demo_sql: Some(demo_sql.into()),
            error: None,
            has_conditionals,
            has_loops,
        }
    }

    /// Create a failed result with no variables
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            variables: Vec::new(),
            demo_sql: None,
            error: Some(error.into()),
            has_conditionals: false,
            has_loops: false,
        }
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Outcome of rendering a template with caller-supplied values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub success: bool,

    /// Rendered SQL, empty on failure
    pub sql: String,

    /// Failure message, empty on success
    pub error: String,
}

impl RenderResult {
    pub fn success(sql: impl Into<String>) -> Self {
        Self {
            success: true,
            sql: sql.into(),
            error: String::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            sql: String::new(),
            error: error.into(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{VariableSource, VariableType};
    use pretty_assertions::assert_eq;

    #[test]
    fn failure_has_no_demo_sql() {
        let result = AnalysisResult::failure("Template syntax error: boom at line 1");
        assert!(!result.success);
        assert!(result.variables.is_empty());
        assert!(result.demo_sql.is_none());
        assert_eq!(result.error.as_deref(), Some("Template syntax error: boom at line 1"));
    }

    #[test]
    fn analysis_result_wire_format() {
        let var = VariableInfo::new("limit", VariableType::Integer, VariableSource::Expression, "");
        let result = AnalysisResult::success(vec![var], "LIMIT 42", false, false);

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "variables": [{"name": "limit", "type": "integer", "default_value": 42}],
                "demo_sql": "LIMIT 42",
                "error": null,
                "has_conditionals": false,
                "has_loops": false
            })
        );
    }

    #[test]
    fn variable_lookup() {
        let var =
            VariableInfo::new("status", VariableType::String, VariableSource::Conditional, "");
        let result = AnalysisResult::success(vec![var], "", true, false);

        assert!(result.variable("status").is_some());
        assert!(result.variable("missing").is_none());
    }

    #[test]
    fn render_result_failure_keeps_sql_empty() {
        let result = RenderResult::failure("Rendering error: nope");
        let json = result.to_json().unwrap();
        assert!(json.contains("\"sql\": \"\""));
        assert!(json.contains("Rendering error: nope"));
    }
}
