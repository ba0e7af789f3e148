//! Configuration schema (sqlpeek.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::variable::VariableType;

/// Demo literal used for each inferred type
///
/// Defaults are the canonical literals from [`VariableType::demo_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoValues {
    pub integer: serde_json::Value,
    pub boolean: serde_json::Value,
    pub date: serde_json::Value,
    pub string: serde_json::Value,
    pub list: serde_json::Value,
}

impl Default for DemoValues {
    fn default() -> Self {
        Self {
            integer: VariableType::Integer.demo_value(),
            boolean: VariableType::Boolean.demo_value(),
            date: VariableType::Date.demo_value(),
            string: VariableType::String.demo_value(),
            list: VariableType::List.demo_value(),
        }
    }
}

impl DemoValues {
    /// Get the demo literal for a type
    pub fn for_type(&self, var_type: VariableType) -> serde_json::Value {
        match var_type {
            VariableType::Integer => self.integer.clone(),
            VariableType::Boolean => self.boolean.clone(),
            VariableType::Date => self.date.clone(),
            VariableType::String => self.string.clone(),
            VariableType::List => self.list.clone(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-type demo literal overrides
    #[serde(default)]
    pub demo_values: DemoValues,

    /// Values pinned by variable name, applied as overrides on every analysis
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.demo_values, DemoValues::default());
        assert!(config.variables.is_empty());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.demo_values.for_type(VariableType::Integer), serde_json::json!(42));
        assert_eq!(
            config.demo_values.for_type(VariableType::Date),
            serde_json::json!("'2024-01-01'")
        );
    }

    #[test]
    fn partial_demo_values_override() {
        let config = Config::from_toml(
            r#"
            [demo_values]
            integer = 7
            string = "'acme'"

            [variables]
            tenant_id = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.demo_values.integer, serde_json::json!(7));
        assert_eq!(config.demo_values.string, serde_json::json!("'acme'"));
        assert_eq!(config.demo_values.boolean, serde_json::json!(true));
        assert_eq!(config.variables.get("tenant_id"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::from_toml("[demo_values").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn saved_config_loads_back() {
        let path = std::env::temp_dir().join(format!("sqlpeek-config-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.variables.insert("region".to_string(), serde_json::json!("'eu'"));

        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.unwrap(), config);
    }

    #[test]
    fn null_value_cannot_be_saved() {
        let path = std::env::temp_dir().join("sqlpeek-never-written.toml");
        let mut config = Config::default();
        config.variables.insert("region".to_string(), serde_json::Value::Null);

        let err = config.save_to_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::SerializeError(_)));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::from_file(std::path::Path::new("/nonexistent/sqlpeek.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
