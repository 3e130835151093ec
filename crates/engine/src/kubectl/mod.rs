//! kubectl command construction.
//!
//! Modules:
//! - `discovery`: the [`DiscoveryClient`] seam plus static and caching implementations
//! - `mapper`: symbolic object type to REST resource
//! - `get`: `get` collector resolution and argument vector construction
//! - `command`: the produced [`KubectlCommand`] and the placeholder substitution stage

mod command;
mod discovery;
mod get;
mod mapper;

pub use command::{KUBECTL, KubectlCommand};
pub use discovery::{CachedDiscovery, DiscoveryClient, DiscoveryError, StaticDiscovery};
pub use get::{ALL_NAMESPACES, GetFields, NAMESPACE_PLACEHOLDER, build_get_command, get};
pub use mapper::map_resource;
