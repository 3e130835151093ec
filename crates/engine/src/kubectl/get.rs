//! `get` collector resolution and argument construction.
//!
//! Produced grammar:
//! ```text
//! get <resource> [<name> | -l <selector>] [--all-namespaces | -n <namespace>] [-o <format>]
//! ```

use tracing::debug;

use kstep_types::{Get, ResourceDescriptor};

use super::{DiscoveryClient, KubectlCommand, map_resource};
use crate::{
    bindings::{BindingTable, resolve_string},
    error::EngineError,
    expression::Evaluator,
};

/// Deferred reference emitted when a namespaced resource has no namespace; substituted by
/// a later stage (see [`KubectlCommand::expand_placeholders`]).
pub const NAMESPACE_PLACEHOLDER: &str = "$NAMESPACE";

/// Namespace value selecting every namespace.
pub const ALL_NAMESPACES: &str = "*";

/// Collector fields after expression resolution. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetFields {
    pub name: String,
    pub namespace: String,
    pub selector: String,
    pub format: String,
}

impl GetFields {
    /// Resolves every string field of `collector` through the binding table.
    pub fn resolve(evaluator: &dyn Evaluator, table: &BindingTable, collector: &Get) -> Result<Self, EngineError> {
        Ok(Self {
            name: resolve_string(evaluator, &collector.name, table)?,
            namespace: resolve_string(evaluator, &collector.namespace, table)?,
            selector: resolve_string(evaluator, &collector.selector, table)?,
            format: resolve_string(evaluator, &collector.format, table)?,
        })
    }

    fn check_exclusive(&self) -> Result<(), EngineError> {
        if !self.name.is_empty() && !self.selector.is_empty() {
            return Err(EngineError::Conflict);
        }
        Ok(())
    }
}

/// Assembles the `get` argument vector for already resolved fields.
///
/// Fails with [`EngineError::Conflict`] when both `name` and `selector` are set; no
/// partial command is ever returned.
pub fn build_get_command(fields: &GetFields, resource: &ResourceDescriptor) -> Result<KubectlCommand, EngineError> {
    fields.check_exclusive()?;

    let mut args = vec!["get".to_string(), resource.resource.clone()];
    if !fields.name.is_empty() {
        args.push(fields.name.clone());
    } else if !fields.selector.is_empty() {
        args.extend(["-l".to_string(), fields.selector.clone()]);
    }

    if resource.namespaced {
        if fields.namespace == ALL_NAMESPACES {
            args.push("--all-namespaces".to_string());
        } else {
            let namespace = if fields.namespace.is_empty() {
                NAMESPACE_PLACEHOLDER
            } else {
                fields.namespace.as_str()
            };
            args.extend(["-n".to_string(), namespace.to_string()]);
        }
    }

    if !fields.format.is_empty() {
        args.extend(["-o".to_string(), fields.format.clone()]);
    }

    Ok(KubectlCommand::new(args))
}

/// Turns a `get` collector into a kubectl command.
///
/// Fields are resolved first and checked for conflicts before discovery is consulted, so
/// an invalid collector never costs a discovery round trip.
pub fn get(
    discovery: &dyn DiscoveryClient,
    evaluator: &dyn Evaluator,
    table: &BindingTable,
    collector: Option<&Get>,
) -> Result<KubectlCommand, EngineError> {
    let Some(collector) = collector else {
        return Err(EngineError::NullInput("collector"));
    };
    let fields = GetFields::resolve(evaluator, table, collector)?;
    fields.check_exclusive()?;
    let resource = map_resource(discovery, evaluator, table, &collector.object_type)?;
    let command = build_get_command(&fields, &resource)?;
    debug!(command = %command, "built get command");
    Ok(command)
}
