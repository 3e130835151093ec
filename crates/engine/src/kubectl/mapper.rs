use tracing::debug;

use kstep_types::{ObjectType, ResourceDescriptor};

use super::DiscoveryClient;
use crate::{
    bindings::{BindingTable, resolve_string},
    error::EngineError,
    expression::Evaluator,
};

/// Maps a symbolic object type to its REST resource and scope.
///
/// `apiVersion` and `kind` may be `(<expression>)`s and are resolved first; the lookup
/// itself is delegated to `discovery` and its errors are propagated as-is.
pub fn map_resource(
    discovery: &dyn DiscoveryClient,
    evaluator: &dyn Evaluator,
    table: &BindingTable,
    object_type: &ObjectType,
) -> Result<ResourceDescriptor, EngineError> {
    let resolved = ObjectType {
        api_version: resolve_string(evaluator, &object_type.api_version, table)?,
        kind: resolve_string(evaluator, &object_type.kind, table)?,
    };
    let descriptor = discovery.resolve(&resolved)?;
    debug!(
        object_type = %resolved,
        resource = %descriptor.resource,
        namespaced = descriptor.namespaced,
        "mapped object type"
    );
    Ok(descriptor)
}
