//! Jinja SQL template analysis
//!
//! This crate handles:
//! - Discovering the free variables of a template and guessing their types
//! - Resolving `{% if %}` blocks heuristically, without real input values
//! - Rendering a demo SQL preview through MiniJinja
//! - Folding syntax and processing errors into a result record

pub mod analyzer;
pub mod engine;
pub mod extractor;
pub mod inference;
pub mod renderer;
pub mod simplifier;
pub mod values;

pub use analyzer::{TemplateAnalyzer, AnalysisError};
pub use engine::{TemplateEngine, MiniJinjaEngine, EngineError};
pub use extractor::{VariableExtractor, ExtractedVariable};
pub use inference::TypeInferencer;
pub use renderer::{DemoRenderer, RenderOutcome};
pub use simplifier::{ConditionalSimplifier, GuardDecision};
pub use values::{DemoContext, DemoContextBuilder};
