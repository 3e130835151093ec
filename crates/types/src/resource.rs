//! Symbolic object types and the REST resources they map to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbolic Kubernetes object type, e.g. `apps/v1` + `Deployment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ObjectType {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

impl ObjectType {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// Splits `apiVersion` into `(group, version)`. The core group is the empty string.
    ///
    /// ```rust
    /// use kstep_types::ObjectType;
    ///
    /// assert_eq!(ObjectType::new("apps/v1", "Deployment").group_version(), ("apps", "v1"));
    /// assert_eq!(ObjectType::new("v1", "Pod").group_version(), ("", "v1"));
    /// ```
    pub fn group_version(&self) -> (&str, &str) {
        match self.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", self.api_version.as_str()),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.api_version, self.kind)
    }
}

/// REST resource name and scope obtained from discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Plural REST resource name (for example `deployments`).
    pub resource: String,
    /// `false` for cluster-scoped resources.
    pub namespaced: bool,
}

impl ResourceDescriptor {
    pub fn namespaced(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            namespaced: true,
        }
    }

    pub fn cluster_scoped(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            namespaced: false,
        }
    }
}

/// One row of a static discovery table, as written in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMapping {
    pub api_version: String,
    pub kind: String,
    pub resource: String,
    #[serde(default = "default_namespaced")]
    pub namespaced: bool,
}

fn default_namespaced() -> bool {
    true
}

impl ResourceMapping {
    pub fn object_type(&self) -> ObjectType {
        ObjectType::new(self.api_version.clone(), self.kind.clone())
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            resource: self.resource.clone(),
            namespaced: self.namespaced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_version_handles_dotted_groups() {
        let object_type = ObjectType::new("apiextensions.k8s.io/v1", "CustomResourceDefinition");
        assert_eq!(object_type.group_version(), ("apiextensions.k8s.io", "v1"));
    }

    #[test]
    fn resource_mapping_defaults_to_namespaced() {
        let yaml = "apiVersion: example.com/v1alpha1\nkind: Widget\nresource: widgets\n";
        let mapping: ResourceMapping = serde_yaml::from_str(yaml).expect("mapping parses");
        assert_eq!(mapping.descriptor(), ResourceDescriptor::namespaced("widgets"));
        assert_eq!(mapping.object_type().to_string(), "example.com/v1alpha1/Widget");
    }
}
