use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use kstep_types::{ObjectType, ResourceDescriptor, ResourceMapping};

/// Trait defining the interface for API discovery.
///
/// Implementations translate a symbolic object type into its REST resource name and
/// scope. They may perform network I/O; caching and retries belong to them, not to
/// callers.
pub trait DiscoveryClient: Send + Sync {
    fn resolve(&self, object_type: &ObjectType) -> Result<ResourceDescriptor, DiscoveryError>;
}

/// Errors raised by discovery clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("no matches for kind \"{kind}\" in version \"{api_version}\"")]
    UnknownResource { api_version: String, kind: String },
    #[error("discovery unavailable: {0}")]
    Unavailable(String),
}

impl DiscoveryError {
    pub fn unknown(object_type: &ObjectType) -> Self {
        Self::UnknownResource {
            api_version: object_type.api_version.clone(),
            kind: object_type.kind.clone(),
        }
    }
}

/// (apiVersion, kind, resource, namespaced)
const BUILTIN_RESOURCES: &[(&str, &str, &str, bool)] = &[
    ("v1", "Pod", "pods", true),
    ("v1", "Service", "services", true),
    ("v1", "ConfigMap", "configmaps", true),
    ("v1", "Secret", "secrets", true),
    ("v1", "ServiceAccount", "serviceaccounts", true),
    ("v1", "PersistentVolumeClaim", "persistentvolumeclaims", true),
    ("v1", "Event", "events", true),
    ("v1", "Namespace", "namespaces", false),
    ("v1", "Node", "nodes", false),
    ("v1", "PersistentVolume", "persistentvolumes", false),
    ("apps/v1", "Deployment", "deployments", true),
    ("apps/v1", "StatefulSet", "statefulsets", true),
    ("apps/v1", "DaemonSet", "daemonsets", true),
    ("apps/v1", "ReplicaSet", "replicasets", true),
    ("batch/v1", "Job", "jobs", true),
    ("batch/v1", "CronJob", "cronjobs", true),
    ("networking.k8s.io/v1", "Ingress", "ingresses", true),
    ("rbac.authorization.k8s.io/v1", "Role", "roles", true),
    ("rbac.authorization.k8s.io/v1", "RoleBinding", "rolebindings", true),
    ("rbac.authorization.k8s.io/v1", "ClusterRole", "clusterroles", false),
    ("rbac.authorization.k8s.io/v1", "ClusterRoleBinding", "clusterrolebindings", false),
    ("apiextensions.k8s.io/v1", "CustomResourceDefinition", "customresourcedefinitions", false),
    ("storage.k8s.io/v1", "StorageClass", "storageclasses", false),
];

/// Table-driven discovery, suitable for offline rendering and deterministic tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    mappings: IndexMap<ObjectType, ResourceDescriptor>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloads the common built-in Kubernetes kinds.
    pub fn with_builtin_resources() -> Self {
        let mut discovery = Self::new();
        for (api_version, kind, resource, namespaced) in BUILTIN_RESOURCES {
            discovery.mappings.insert(
                ObjectType::new(*api_version, *kind),
                ResourceDescriptor {
                    resource: (*resource).to_string(),
                    namespaced: *namespaced,
                },
            );
        }
        discovery
    }

    /// Adds or replaces mappings; later rows win.
    pub fn extend<'a>(&mut self, mappings: impl IntoIterator<Item = &'a ResourceMapping>) {
        for mapping in mappings {
            self.mappings.insert(mapping.object_type(), mapping.descriptor());
        }
    }

    pub fn with_mappings<'a>(mut self, mappings: impl IntoIterator<Item = &'a ResourceMapping>) -> Self {
        self.extend(mappings);
        self
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl DiscoveryClient for StaticDiscovery {
    fn resolve(&self, object_type: &ObjectType) -> Result<ResourceDescriptor, DiscoveryError> {
        self.mappings
            .get(object_type)
            .cloned()
            .ok_or_else(|| DiscoveryError::unknown(object_type))
    }
}

/// Decorator memoizing successful lookups of another discovery client.
///
/// Failures are never cached so a transient outage does not stick.
#[derive(Debug)]
pub struct CachedDiscovery<D> {
    inner: D,
    cache: Mutex<HashMap<ObjectType, ResourceDescriptor>>,
}

impl<D: DiscoveryClient> CachedDiscovery<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drops every cached mapping, e.g. after CRDs were installed.
    pub fn invalidate(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: DiscoveryClient> DiscoveryClient for CachedDiscovery<D> {
    fn resolve(&self, object_type: &ObjectType) -> Result<ResourceDescriptor, DiscoveryError> {
        if let Some(descriptor) = self.cache.lock().unwrap_or_else(PoisonError::into_inner).get(object_type) {
            debug!(object_type = %object_type, resource = %descriptor.resource, "discovery cache hit");
            return Ok(descriptor.clone());
        }
        let descriptor = self.inner.resolve(object_type)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(object_type.clone(), descriptor.clone());
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDiscovery {
        calls: AtomicUsize,
        fail: bool,
    }

    impl DiscoveryClient for CountingDiscovery {
        fn resolve(&self, object_type: &ObjectType) -> Result<ResourceDescriptor, DiscoveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DiscoveryError::Unavailable("connection refused".into()));
            }
            Ok(ResourceDescriptor::namespaced(format!("{}s", object_type.kind.to_lowercase())))
        }
    }

    #[test]
    fn builtin_resources_cover_namespaced_and_cluster_scoped_kinds() {
        let discovery = StaticDiscovery::with_builtin_resources();

        assert_eq!(
            discovery.resolve(&ObjectType::new("v1", "Pod")).unwrap(),
            ResourceDescriptor::namespaced("pods")
        );
        assert_eq!(
            discovery.resolve(&ObjectType::new("v1", "Namespace")).unwrap(),
            ResourceDescriptor::cluster_scoped("namespaces")
        );
        assert_eq!(
            discovery.resolve(&ObjectType::new("apps/v1", "Deployment")).unwrap(),
            ResourceDescriptor::namespaced("deployments")
        );
    }

    #[test]
    fn unknown_types_are_reported() {
        let discovery = StaticDiscovery::with_builtin_resources();
        let error = discovery.resolve(&ObjectType::new("example.com/v1", "Widget")).unwrap_err();

        assert_eq!(
            error,
            DiscoveryError::UnknownResource {
                api_version: "example.com/v1".into(),
                kind: "Widget".into()
            }
        );
        assert_eq!(error.to_string(), "no matches for kind \"Widget\" in version \"example.com/v1\"");
    }

    #[test]
    fn configured_mappings_extend_and_override_builtins() {
        let mappings = vec![
            ResourceMapping {
                api_version: "example.com/v1".into(),
                kind: "Widget".into(),
                resource: "widgets".into(),
                namespaced: true,
            },
            ResourceMapping {
                api_version: "v1".into(),
                kind: "Node".into(),
                resource: "nodes".into(),
                namespaced: true,
            },
        ];
        let builtin_count = StaticDiscovery::with_builtin_resources().len();
        let discovery = StaticDiscovery::with_builtin_resources().with_mappings(&mappings);

        assert_eq!(discovery.len(), builtin_count + 1);
        assert_eq!(
            discovery.resolve(&ObjectType::new("example.com/v1", "Widget")).unwrap(),
            ResourceDescriptor::namespaced("widgets")
        );
        assert!(discovery.resolve(&ObjectType::new("v1", "Node")).unwrap().namespaced);
    }

    #[test]
    fn cached_discovery_consults_inner_client_once() {
        let cached = CachedDiscovery::new(CountingDiscovery {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let widget = ObjectType::new("example.com/v1", "Widget");

        assert_eq!(cached.resolve(&widget).unwrap(), ResourceDescriptor::namespaced("widgets"));
        assert_eq!(cached.resolve(&widget).unwrap(), ResourceDescriptor::namespaced("widgets"));
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);

        cached.invalidate();
        cached.resolve(&widget).unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cached_discovery_does_not_cache_failures() {
        let cached = CachedDiscovery::new(CountingDiscovery {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let pod = ObjectType::new("v1", "Pod");

        assert!(matches!(cached.resolve(&pod), Err(DiscoveryError::Unavailable(_))));
        assert!(matches!(cached.resolve(&pod), Err(DiscoveryError::Unavailable(_))));
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }
}
