//! Strongly typed test-step definitions shared across the engine, configuration, and CLI.
//!
//! The models here mirror what authors write in step documents: binding declarations and
//! `get` collectors. Every string field of a collector may either be a literal or an
//! `(<expression>)` that the engine evaluates against the current binding table.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod resource;

pub use resource::{ObjectType, ResourceDescriptor, ResourceMapping};

/// A declared, not yet resolved binding.
///
/// `name` may itself be an `(<expression>)` producing the final name. `value` is any
/// JSON/YAML value; strings wrapped in parentheses anywhere inside it are expressions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Binding {
    pub name: String,
    #[serde(default)]
    pub value: JsonValue,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Collector requesting `kubectl get` output for resources of a symbolic object type.
///
/// Empty strings mean "unset". `name` and `selector` are mutually exclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Get {
    /// Symbolic object type (`apiVersion` + `kind`), flattened into the collector.
    #[serde(flatten)]
    pub object_type: ObjectType,
    /// Name of a single object to fetch.
    #[serde(default)]
    pub name: String,
    /// Namespace to query; `*` targets all namespaces.
    #[serde(default)]
    pub namespace: String,
    /// Label selector used when no name is given.
    #[serde(default)]
    pub selector: String,
    /// Output format passed through to `-o` (for example `json`, `yaml`, `wide`).
    #[serde(default)]
    pub format: String,
}

/// A step document as consumed by the CLI: ordered binding declarations followed by
/// the `get` collectors to render.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepDocument {
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub get: Vec<Get>,
}
