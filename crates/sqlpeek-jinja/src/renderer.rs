//! Demo rendering
//!
//! Substitutes demo values through the template engine and tidies the
//! output. A failed render never fails the analysis: the caller gets the
//! unrendered text back instead.

use regex::Regex;
use std::sync::LazyLock;
use crate::engine::TemplateEngine;
use crate::values::DemoContext;

static STRAY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%.*?%\}|\{%|%\}").unwrap());

/// Result of a demo render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The engine rendered the text
    Rendered(String),

    /// The engine failed; `text` is the input with only stray tags removed
    Fallback { text: String, reason: String },
}

impl RenderOutcome {
    pub fn text(&self) -> &str {
        match self {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RenderOutcome::Fallback { .. })
    }
}

/// Renders simplified templates with demo values
pub struct DemoRenderer<'e, E: TemplateEngine> {
    engine: &'e E,
}

impl<'e, E: TemplateEngine> DemoRenderer<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Render `text` with `values`
    pub fn render(&self, text: &str, values: &DemoContext) -> RenderOutcome {
        match self.engine.render(text, values) {
            Ok(rendered) => RenderOutcome::Rendered(Self::clean(&rendered)),
            Err(e) => {
                tracing::warn!(error = %e, "demo render failed, showing template as-is");
                RenderOutcome::Fallback {
                    text: Self::strip_stray_tags(text),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Drop stray tags, blank lines and comment-only lines
    fn clean(rendered: &str) -> String {
        Self::strip_stray_tags(rendered)
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with("{#")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Removing a fragment can join its neighbours into a new one, so
    /// strip until nothing matches
    fn strip_stray_tags(text: &str) -> String {
        let mut text = text.to_string();
        while STRAY_TAG.is_match(&text) {
            text = STRAY_TAG.replace_all(&text, "").into_owned();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, MiniJinjaEngine};
    use crate::values::DemoContextBuilder;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet;

    struct BrokenEngine;

    impl TemplateEngine for BrokenEngine {
        fn check_syntax(&self, _source: &str) -> Result<(), EngineError> {
            Ok(())
        }

        fn undeclared_variables(&self, _source: &str) -> HashSet<String> {
            HashSet::new()
        }

        fn render(&self, _source: &str, _values: &DemoContext) -> Result<String, EngineError> {
            Err(EngineError::Render("unknown filter".to_string()))
        }
    }

    #[test]
    fn renders_and_drops_blank_lines() {
        let engine = MiniJinjaEngine::new();
        let values = DemoContextBuilder::new().value("limit", json!(42)).build();
        let text = "SELECT *\n\n   \nFROM t\n{# note #}\nLIMIT {{ limit }}";

        let outcome = DemoRenderer::new(&engine).render(text, &values);
        assert_eq!(outcome, RenderOutcome::Rendered("SELECT *\nFROM t\nLIMIT 42".to_string()));
    }

    #[test]
    fn loops_and_filters_are_delegated() {
        let engine = MiniJinjaEngine::new();
        let values = DemoContextBuilder::new()
            .value("cols", json!(["id", "name"]))
            .value("table", json!("users"))
            .build();
        let text = "SELECT {% for c in cols %}{{ c }}\
                    {% if not loop.last %}, {% endif %}{% endfor %} \
                    FROM {{ table | upper }}";

        let outcome = DemoRenderer::new(&engine).render(text, &values);
        assert_eq!(outcome.text(), "SELECT id, name FROM USERS");
    }

    #[test]
    fn engine_failure_falls_back_to_input() {
        let text = "SELECT {{ x | nope }}";
        let outcome = DemoRenderer::new(&BrokenEngine).render(text, &DemoContext::new());

        assert!(outcome.is_fallback());
        assert_eq!(outcome.text(), text);
        match outcome {
            RenderOutcome::Fallback { reason, .. } => {
                assert_eq!(reason, "Rendering error: unknown filter")
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn fallback_removes_stray_block_tags_only() {
        let text = "SELECT {{ a }} {% set x = 1 %}FROM t %}";
        let outcome = DemoRenderer::new(&BrokenEngine).render(text, &DemoContext::new());

        assert_eq!(outcome.into_text(), "SELECT {{ a }} FROM t ");
    }

    #[test]
    fn rendered_output_has_no_stray_tag_fragments() {
        let engine = MiniJinjaEngine::new();
        let outcome = DemoRenderer::new(&engine).render("SELECT '%}' AS odd", &DemoContext::new());

        assert_eq!(outcome.text(), "SELECT '' AS odd");
    }

    #[test]
    fn fragments_joined_by_stripping_are_stripped_too() {
        let engine = MiniJinjaEngine::new();
        let values = DemoContextBuilder::new().value("name", json!("{{%%")).build();
        let outcome = DemoRenderer::new(&engine).render("SELECT {{ name }}", &values);

        assert_eq!(outcome.text(), "SELECT ");

        let outcome = DemoRenderer::new(&BrokenEngine).render("a {%{%%}%} b", &DemoContext::new());
        assert!(!outcome.text().contains("{%") && !outcome.text().contains("%}"));
    }
}
