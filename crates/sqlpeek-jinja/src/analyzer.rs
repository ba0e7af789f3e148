//! Template analysis
//!
//! Ties extraction, inference, simplification and rendering together into a
//! single [`AnalysisResult`]. `analyze` never fails: every error is folded
//! into an unsuccessful result.

use regex::Regex;
use sqlpeek_core::{AnalysisResult, Config, DemoValues, RenderResult, VariableInfo};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use crate::engine::{EngineError, MiniJinjaEngine, TemplateEngine};
use crate::extractor::VariableExtractor;
use crate::inference::TypeInferencer;
use crate::renderer::DemoRenderer;
use crate::simplifier::ConditionalSimplifier;
use crate::values::DemoContext;

static CONDITIONAL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%[-+]?\s*(?:if|elif)\b").unwrap());

static LOOP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{%[-+]?\s*for\b").unwrap());

/// Error that stops an analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The engine rejected the template at parse time
    #[error(transparent)]
    Syntax(EngineError),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Analyzes Jinja SQL templates and builds demo SQL
pub struct TemplateAnalyzer<E: TemplateEngine = MiniJinjaEngine> {
    engine: E,
    demo_values: DemoValues,
}

impl TemplateAnalyzer<MiniJinjaEngine> {
    /// Create an analyzer backed by MiniJinja with default demo values
    pub fn new() -> Self {
        Self::with_engine(MiniJinjaEngine::new())
    }

    /// Create an analyzer using the demo values from a config
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_demo_values(config.demo_values.clone())
    }
}

impl Default for TemplateAnalyzer<MiniJinjaEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TemplateEngine> TemplateAnalyzer<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            demo_values: DemoValues::default(),
        }
    }

    /// Replace the per-type demo literals
    pub fn with_demo_values(mut self, demo_values: DemoValues) -> Self {
        self.demo_values = demo_values;
        self
    }

    /// Check if the template has an `if`/`elif` tag
    pub fn has_conditionals(template: &str) -> bool {
        CONDITIONAL_TAG.is_match(template)
    }

    /// Check if the template has a `for` tag
    pub fn has_loops(template: &str) -> bool {
        LOOP_TAG.is_match(template)
    }

    /// Analyze a template, optionally overriding variable values by name
    ///
    /// Override values are taken as-is, lists and objects included. Keys
    /// that match no discovered variable are ignored.
    pub fn analyze(
        &self,
        template: &str,
        overrides: Option<&BTreeMap<String, serde_json::Value>>,
    ) -> AnalysisResult {
        match self.try_analyze(template, overrides) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(error = %e, "template analysis failed");
                AnalysisResult::failure(e.to_string())
            }
        }
    }

    /// Analyze a template, returning the error that stopped it
    pub fn try_analyze(
        &self,
        template: &str,
        overrides: Option<&BTreeMap<String, serde_json::Value>>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let has_conditionals = Self::has_conditionals(template);
        let has_loops = Self::has_loops(template);

        let undeclared = self.undeclared_variables(template)?;

        let mut variables = self.infer_variables(template, &undeclared);
        if let Some(overrides) = overrides {
            apply_overrides(&mut variables, overrides);
        }

        let values = DemoContext::from_variables(&variables);

        let simplified: Cow<'_, str> = if has_conditionals {
            Cow::Owned(ConditionalSimplifier::simplify(template))
        } else {
            Cow::Borrowed(template)
        };

        let outcome = DemoRenderer::new(&self.engine).render(&simplified, &values);

        tracing::debug!(
            variables = variables.len(),
            has_conditionals,
            has_loops,
            fallback = outcome.is_fallback(),
            "template analyzed"
        );

        Ok(AnalysisResult::success(
            variables,
            outcome.into_text(),
            has_conditionals,
            has_loops,
        ))
    }

    /// Render a template exactly, with caller-supplied values
    pub fn render(&self, template: &str, values: &DemoContext) -> RenderResult {
        match self.engine.render(template, values) {
            Ok(sql) => RenderResult::success(sql),
            Err(e) => RenderResult::failure(e.to_string()),
        }
    }

    /// Syntax-check the template and collect its undeclared names
    ///
    /// A template that ends inside an unterminated `{{` is let through with
    /// an empty set: the open expression is treated as plain text.
    fn undeclared_variables(&self, template: &str) -> Result<HashSet<String>, AnalysisError> {
        match self.engine.check_syntax(template) {
            Ok(()) => Ok(self.engine.undeclared_variables(template)),
            Err(e) if e.is_syntax() && ends_in_open_expression(template) => {
                tracing::warn!(error = %e, "unterminated expression, analyzing as text");
                Ok(HashSet::new())
            }
            Err(e) if e.is_syntax() => Err(AnalysisError::Syntax(e)),
            Err(e) => Err(AnalysisError::Processing(e.to_string())),
        }
    }

    fn infer_variables(&self, template: &str, undeclared: &HashSet<String>) -> Vec<VariableInfo> {
        let in_list = TypeInferencer::in_list_names(template);

        VariableExtractor::extract(template, undeclared)
            .into_iter()
            .map(|var| {
                let var_type = TypeInferencer::infer_with(&var.name, &in_list);
                VariableInfo::new(var.name, var_type, var.source, var.context)
                    .with_default(self.demo_values.for_type(var_type))
            })
            .collect()
    }
}

/// Replace default values by name
fn apply_overrides(
    variables: &mut [VariableInfo],
    overrides: &BTreeMap<String, serde_json::Value>,
) {
    for var in variables.iter_mut() {
        if let Some(value) = overrides.get(&var.name) {
            var.default_value = value.clone();
        }
    }
}

/// Check if the text ends inside a `{{` that is never closed
fn ends_in_open_expression(text: &str) -> bool {
    text.rfind("{{").is_some_and(|pos| !text[pos..].contains("}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sqlpeek_core::{VariableSource, VariableType};

    fn overrides(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn tag_detection() {
        type A = TemplateAnalyzer;
        assert!(A::has_conditionals("{% if a %}x{% endif %}"));
        assert!(A::has_conditionals("{%- elif b %}"));
        assert!(!A::has_conditionals("{% for x in y %}{% endfor %}"));
        assert!(A::has_loops("{% for x in y %}{% endfor %}"));
        assert!(!A::has_loops("{{ format }}"));
    }

    #[test]
    fn open_expression_detection() {
        assert!(ends_in_open_expression("SELECT {{ x"));
        assert!(ends_in_open_expression("{{ a }} {{ b"));
        assert!(!ends_in_open_expression("{{ a }}"));
        assert!(!ends_in_open_expression("{% if a %}"));
    }

    #[test]
    fn variables_carry_source_and_context() {
        let analyzer = TemplateAnalyzer::new();
        let template = "select * from t where id = {{ user_id }}\
                        {% if region %} and r = {{ region }}{% endif %}\
                        {% if is_active %}{% endif %}";
        let result = analyzer.analyze(template, None);

        assert!(result.success);
        let names: Vec<_> = result.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["user_id", "region", "is_active"]);

        let region = result.variable("region").unwrap();
        assert_eq!(region.source, VariableSource::Expression);
        assert_eq!(region.context, "Expression: region");

        let flag = result.variable("is_active").unwrap();
        assert_eq!(flag.source, VariableSource::Conditional);
        assert_eq!(flag.var_type, VariableType::Boolean);
        assert_eq!(flag.default_value, json!(true));
    }

    #[test]
    fn overrides_replace_defaults_before_rendering() {
        let analyzer = TemplateAnalyzer::new();
        let values = overrides(&[("user_id", json!(7)), ("unknown", json!("ignored"))]);
        let result = analyzer.analyze("WHERE id = {{ user_id }}", Some(&values));

        assert!(result.success);
        assert_eq!(result.variables.len(), 1);
        assert_eq!(result.variables[0].default_value, json!(7));
        assert_eq!(result.demo_sql.as_deref(), Some("WHERE id = 7"));
    }

    #[test]
    fn list_override_reaches_the_engine() {
        let analyzer = TemplateAnalyzer::new();
        let values = overrides(&[("ids", json!([1, 2]))]);
        let result = analyzer.analyze(
            "SELECT * FROM t WHERE id IN ({{ ids | join(',') }})",
            Some(&values),
        );

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.variables.len(), 1);
        assert_eq!(result.variables[0].var_type, VariableType::List);
        assert_eq!(result.variables[0].default_value, json!([1, 2]));
        assert_eq!(result.demo_sql.as_deref(), Some("SELECT * FROM t WHERE id IN (1,2)"));
    }

    #[test]
    fn syntax_error_short_circuits() {
        let analyzer = TemplateAnalyzer::new();
        let result = analyzer.analyze("SELECT 1\n{% if flag %}\nAND x = {{ x }}", None);

        assert!(!result.success);
        assert!(result.variables.is_empty());
        assert!(result.demo_sql.is_none());
        assert!(!result.has_conditionals);

        let error = result.error.unwrap();
        assert!(error.starts_with("Template syntax error: "), "{}", error);
        assert!(error.contains(" at line "), "{}", error);
    }

    #[test]
    fn demo_values_come_from_config() {
        let config = Config::from_toml("[demo_values]\nstring = \"'acme'\"").unwrap();
        let analyzer = TemplateAnalyzer::from_config(&config);
        let result = analyzer.analyze("WHERE tenant = {{ tenant }}", None);

        assert_eq!(result.variables[0].default_value, json!("'acme'"));
        assert_eq!(result.demo_sql.as_deref(), Some("WHERE tenant = 'acme'"));
    }

    #[test]
    fn direct_render() {
        let analyzer = TemplateAnalyzer::new();
        let values = DemoContext::from_json(&json!({"is_admin": false, "name": "bob"}));

        let result = analyzer.render(
            "SELECT 1{% if is_admin %}, secret{% endif %} -- {{ name }}",
            &values,
        );
        assert!(result.success);
        assert_eq!(result.sql, "SELECT 1 -- bob");

        let result = analyzer.render("{% if %}", &values);
        assert!(!result.success);
        assert!(result.error.starts_with("Template syntax error: "));
    }
}
