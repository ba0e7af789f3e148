//! Template engine boundary
//!
//! The heuristic analysis never evaluates templates itself. Parsing and
//! rendering go through [`TemplateEngine`], implemented for production by
//! [`MiniJinjaEngine`].

use minijinja::{Environment, Error as JinjaError, ErrorKind};
use std::collections::HashSet;
use crate::values::DemoContext;

/// Error reported by a template engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Template syntax error: {message}{}", at_line(.line))]
    Syntax {
        message: String,
        /// 1-based line number, when the engine reports one
        line: Option<usize>,
    },

    #[error("Rendering error: {0}")]
    Render(String),
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {}", line),
        None => String::new(),
    }
}

impl EngineError {
    /// Check if this is a parse-time syntax error
    pub fn is_syntax(&self) -> bool {
        matches!(self, EngineError::Syntax { .. })
    }
}

/// A real templating engine the analysis delegates to
pub trait TemplateEngine {
    /// Parse the template, reporting the first syntax error
    fn check_syntax(&self, source: &str) -> Result<(), EngineError>;

    /// Names the template reads without defining them
    ///
    /// Returns an empty set when the template cannot be parsed.
    fn undeclared_variables(&self, source: &str) -> HashSet<String>;

    /// Render the template with the given values
    fn render(&self, source: &str, values: &DemoContext) -> Result<String, EngineError>;
}

/// MiniJinja-backed template engine
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Scratch environment for parsing borrowed sources
    ///
    /// Compiled templates borrow their source for the environment's
    /// lifetime, so the long-lived render environment cannot parse them.
    fn parse_env<'source>() -> Environment<'source> {
        Environment::new()
    }

    /// Convert a MiniJinja error to an EngineError
    fn convert_error(error: JinjaError) -> EngineError {
        match error.kind() {
            ErrorKind::SyntaxError => EngineError::Syntax {
                message: error
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.kind().to_string()),
                line: error.line(),
            },
            _ => EngineError::Render(error.to_string()),
        }
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn check_syntax(&self, source: &str) -> Result<(), EngineError> {
        let env = Self::parse_env();
        env.template_from_str(source)
            .map(|_| ())
            .map_err(Self::convert_error)
    }

    fn undeclared_variables(&self, source: &str) -> HashSet<String> {
        let env = Self::parse_env();
        let names = match env.template_from_str(source) {
            Ok(template) => template.undeclared_variables(false),
            Err(_) => HashSet::new(),
        };
        names
    }

    fn render(&self, source: &str, values: &DemoContext) -> Result<String, EngineError> {
        self.env
            .render_str(source, values.to_minijinja_value())
            .map_err(Self::convert_error)
    }
}
