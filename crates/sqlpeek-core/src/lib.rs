//! sqlpeek Core
//!
//! Domain model shared by the analysis engine and the CLI.
//! Result field names are part of the JSON output - do not rename them.

pub mod variable;
pub mod result;
pub mod config;

pub use variable::{VariableInfo, VariableType, VariableSource, is_identifier};
pub use result::{AnalysisResult, RenderResult};
pub use config::{Config, ConfigError, DemoValues};
