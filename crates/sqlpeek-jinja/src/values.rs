//! Demo value context for rendering
//!
//! Maps variable names to the literals substituted during demo rendering.

use minijinja::Value as MinijinjaValue;
use serde::{Deserialize, Serialize};
use sqlpeek_core::VariableInfo;
use std::collections::BTreeMap;

/// Name → value map handed to the template engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemoContext {
    values: BTreeMap<String, serde_json::Value>,
}

impl DemoContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from the default values of discovered variables
    pub fn from_variables(variables: &[VariableInfo]) -> Self {
        let values = variables
            .iter()
            .map(|var| (var.name.clone(), var.default_value.clone()))
            .collect();

        Self { values }
    }

    /// Create a context from a JSON object; non-object values give an empty context
    pub fn from_json(value: &serde_json::Value) -> Self {
        let values = value
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Self { values }
    }

    /// Add or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert to MiniJinja value for rendering
    pub fn to_minijinja_value(&self) -> MinijinjaValue {
        MinijinjaValue::from_serialize(&self.values)
    }
}

/// Builder for DemoContext
pub struct DemoContextBuilder {
    context: DemoContext,
}

impl DemoContextBuilder {
    pub fn new() -> Self {
        Self {
            context: DemoContext::new(),
        }
    }

    pub fn value(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key, value);
        self
    }

    pub fn build(self) -> DemoContext {
        self.context
    }
}

impl Default for DemoContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
