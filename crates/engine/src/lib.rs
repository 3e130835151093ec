//! # Kstep Engine
//!
//! The Kstep Engine resolves the named values ("bindings") declared by declarative
//! Kubernetes test steps and turns `get` collectors into ready-to-run `kubectl`
//! invocations. It never runs a process and never talks to a cluster itself: expression
//! evaluation and API discovery are injected through the [`Evaluator`] and
//! [`DiscoveryClient`] traits.
//!
//! ## Key Features
//!
//! - **Persistent Binding Table**: every registration yields a new table; older snapshots
//!   stay valid and can be shared across threads without locking
//! - **Indirection**: `(<expression>)` strings are evaluated to obtain the literal value,
//!   which lets a binding's name be computed from another binding
//! - **Command Construction**: `get <resource> [<name> | -l <selector>] [--all-namespaces | -n <namespace>] [-o <format>]`
//!
//! ## Usage
//!
//! ```rust
//! use kstep_engine::{BindingTable, PathEvaluator, StaticDiscovery, get, register_bindings};
//! use kstep_types::{Binding, Get, ObjectType};
//! use serde_json::Value;
//!
//! let evaluator = PathEvaluator;
//! let declarations = vec![Binding::new("app", "web")];
//! let table = register_bindings(&evaluator, &BindingTable::new(), &Value::Null, &declarations)?;
//!
//! let collector = Get {
//!     object_type: ObjectType::new("apps/v1", "Deployment"),
//!     name: "($app)".into(),
//!     ..Get::default()
//! };
//! let discovery = StaticDiscovery::with_builtin_resources();
//! let command = get(&discovery, &evaluator, &table, Some(&collector))?;
//! assert_eq!(command.to_string(), "kubectl get deployments web -n $NAMESPACE");
//! # Ok::<(), kstep_engine::EngineError>(())
//! ```
//!
//! ## Architecture
//!
//! - **`bindings`**: binding table, name validation, indirection and binding resolution
//! - **`expression`**: the evaluator seam, the `(...)` template walker and a built-in evaluator
//! - **`kubectl`**: discovery, resource mapping and `get` command construction
//! - **`error`**: the error taxonomy shared by all of the above

use std::{fs, path::Path};

use anyhow::{Context, Result};

pub mod bindings;
pub mod error;
pub mod expression;
pub mod kubectl;

pub use bindings::{
    BINDING_SIGIL, BindingError, BindingTable, BindingValue, register_binding, register_bindings, resolve_binding,
    resolve_indirection, resolve_string, validate_binding_name,
};
pub use error::EngineError;
pub use expression::{EvalError, Evaluator, PathEvaluator};
pub use kubectl::{
    CachedDiscovery, DiscoveryClient, DiscoveryError, GetFields, KubectlCommand, StaticDiscovery, build_get_command, get,
    map_resource,
};
pub use kstep_types::{Binding, Get, ObjectType, ResourceDescriptor, ResourceMapping, StepDocument};

/// Loads a step document (bindings followed by `get` collectors) from a YAML or JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match the step document shape.
///
/// # Examples
///
/// ```rust
/// use kstep_engine::parse_step_file;
///
/// let temp_dir = tempfile::tempdir()?;
/// let step_path = temp_dir.path().join("step.yaml");
/// std::fs::write(&step_path, r#"
/// bindings:
///   - name: app
///     value: web
/// get:
///   - apiVersion: v1
///     kind: Pod
/// "#)?;
///
/// let document = parse_step_file(&step_path)?;
/// assert_eq!(document.bindings.len(), 1);
/// assert_eq!(document.get.len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_step_file(file_path: impl AsRef<Path>) -> Result<StepDocument> {
    let file_path = file_path.as_ref();
    let file_content = fs::read_to_string(file_path).with_context(|| format!("Failed to read step file: {}", file_path.display()))?;
    if file_content.trim().is_empty() {
        return Ok(StepDocument::default());
    }
    // YAML is a superset of JSON, so a single parser covers both formats.
    serde_yaml::from_str(&file_content).with_context(|| format!("Unsupported step document format: {}", file_path.display()))
}
