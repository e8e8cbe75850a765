//! Pod identity shared by the host and remote clusters.
//!
//! A pod keeps the same namespace and name on both sides, so a single
//! [`PodRef`] addresses the host pod and its remote counterpart.

use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Namespace used when a pod object carries none.
pub const DEFAULT_NAMESPACE: &str = "default";

/// The `namespace/name` identity of a pod.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PodRef {
    namespace: String,
    name: String,
}

impl PodRef {
    /// Create a new `PodRef`.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Extract the identity of a pod object.
    ///
    /// A missing namespace falls back to [`DEFAULT_NAMESPACE`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingMetadata`] if the pod has no name.
    pub fn from_pod(pod: &Pod) -> Result<Self, CoreError> {
        let name = pod
            .metadata
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or(CoreError::MissingMetadata("name"))?;
        let namespace = pod
            .metadata
            .namespace
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE);

        Ok(Self::new(namespace, name))
    }

    /// The pod namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The pod name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PodRef({}/{})", self.namespace, self.name)
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for PodRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(namespace, name))
            }
            _ => Err(CoreError::InvalidPodRef(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn parse_and_display() {
        let pod_ref: PodRef = "kube-system/coredns".parse().unwrap();
        assert_eq!(pod_ref.namespace(), "kube-system");
        assert_eq!(pod_ref.name(), "coredns");
        assert_eq!(pod_ref.to_string(), "kube-system/coredns");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("no-slash".parse::<PodRef>().is_err());
        assert!("/name".parse::<PodRef>().is_err());
        assert!("ns/".parse::<PodRef>().is_err());
        assert!("a/b/c".parse::<PodRef>().is_err());
    }

    #[test]
    fn from_pod_defaults_namespace() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let pod_ref = PodRef::from_pod(&pod).unwrap();
        assert_eq!(pod_ref, PodRef::new("default", "web"));
    }

    #[test]
    fn from_pod_requires_name() {
        let pod = Pod::default();
        assert_eq!(
            PodRef::from_pod(&pod),
            Err(CoreError::MissingMetadata("name"))
        );
    }

    #[test]
    fn serde_roundtrip() {
        let pod_ref = PodRef::new("default", "web");
        let json = serde_json::to_string(&pod_ref).unwrap();
        assert_eq!(json, r#"{"namespace":"default","name":"web"}"#);
    }
}
