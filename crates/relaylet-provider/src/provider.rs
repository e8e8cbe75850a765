//! The virtual node provider.
//!
//! This module provides the [`Provider`] trait, the contract the host side of
//! a virtual node calls into, and [`RemoteProvider`], which relays every pod
//! call to a remote cluster.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::core::v1::{
    NodeAddress, NodeCondition, NodeDaemonEndpoints, Pod, PodStatus,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{DeleteParams, ListParams};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relaylet_core::{ownership, PodRef};

use crate::cancel::until_cancelled;
use crate::error::is_api_status;
use crate::node;
use crate::remote::{KubePodApi, PodApi};
use crate::translate::to_remote;
use crate::types::{ContainerLogOptions, ContainerLogs, NodeInfo};
use crate::{ProviderError, Result};

/// Placeholder returned for container log requests.
pub const LOGS_PLACEHOLDER: &str = "container logs are not supported by the relaylet provider\n";

/// The `Provider` trait defines the contract a virtual node calls into.
///
/// Pod operations take a cancellation token; cancelling it aborts the
/// in-flight remote call with [`ProviderError::Cancelled`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Create a pod in the backing cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if translation or creation fails.
    async fn create_pod(&self, cancel: &CancellationToken, pod: &Pod) -> Result<()>;

    /// Update a pod in the backing cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if translation or the update fails.
    async fn update_pod(&self, cancel: &CancellationToken, pod: &Pod) -> Result<()>;

    /// Delete a pod from the backing cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the pod does not exist.
    async fn delete_pod(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<()>;

    /// Get a pod from the backing cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the pod does not exist.
    async fn get_pod(&self, cancel: &CancellationToken, namespace: &str, name: &str)
        -> Result<Pod>;

    /// Get the status of a pod.
    ///
    /// A pod that does not exist reports phase `Unknown` instead of failing.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote lookup fails.
    async fn get_pod_status(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        name: &str,
    ) -> Result<PodStatus>;

    /// List every pod this provider manages.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    async fn get_pods(&self, cancel: &CancellationToken) -> Result<Vec<Pod>>;

    /// Get the logs of a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the logs cannot be retrieved.
    async fn get_container_logs(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        opts: &ContainerLogOptions,
    ) -> Result<ContainerLogs>;

    /// Run a command in a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be run.
    async fn run_in_container(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        cmd: &[String],
    ) -> Result<()>;

    /// Resource capacity of the node.
    fn capacity(&self) -> BTreeMap<String, Quantity>;

    /// Current node conditions.
    fn node_conditions(&self) -> Vec<NodeCondition>;

    /// Addresses of the node.
    fn node_addresses(&self) -> Vec<NodeAddress>;

    /// Daemon endpoints of the node.
    fn node_daemon_endpoints(&self) -> NodeDaemonEndpoints;

    /// Operating system of the node.
    fn operating_system(&self) -> &str;
}

/// Provider that runs pods in a remote cluster.
///
/// Holds no mutable state: every call is an independent request against the
/// remote cluster, keyed by the pod's namespace and name.
pub struct RemoteProvider<A> {
    api: A,
    node: NodeInfo,
}

impl<A: PodApi> RemoteProvider<A> {
    /// Create a provider over a remote pod API.
    #[must_use]
    pub fn new(api: A, node: NodeInfo) -> Self {
        Self { api, node }
    }

    /// Get the node facts this provider reports.
    #[must_use]
    pub fn node_info(&self) -> &NodeInfo {
        &self.node
    }

    /// Get the remote pod API.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }
}

impl RemoteProvider<KubePodApi> {
    /// Create a provider over a client for the remote cluster.
    #[must_use]
    pub fn from_client(remote: Client, node: NodeInfo) -> Self {
        Self::new(KubePodApi::new(remote), node)
    }
}

#[async_trait]
impl<A: PodApi> Provider for RemoteProvider<A> {
    async fn create_pod(&self, cancel: &CancellationToken, pod: &Pod) -> Result<()> {
        let pod_ref = PodRef::from_pod(pod)?;
        debug!(pod = %pod_ref, "Received CreatePod request");

        let remote = to_remote(&self.api, cancel, pod).await?;

        // Pods built by the translator never carry a resourceVersion.
        if remote.metadata.resource_version.is_some() {
            warn!(pod = %pod_ref, "Remote pod already exists, skipping creation");
            return Ok(());
        }

        match until_cancelled(cancel, self.api.create(&pod_ref, &remote)).await {
            Ok(_) => {
                info!(pod = %pod_ref, "Created remote pod");
                Ok(())
            }
            Err(ProviderError::Remote(e)) if is_api_status(&e, 409) => {
                warn!(pod = %pod_ref, "Remote pod created concurrently, skipping creation");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn update_pod(&self, cancel: &CancellationToken, pod: &Pod) -> Result<()> {
        let pod_ref = PodRef::from_pod(pod)?;
        debug!(pod = %pod_ref, "Received UpdatePod request");

        let remote = to_remote(&self.api, cancel, pod).await?;
        until_cancelled(cancel, self.api.replace(&pod_ref, &remote)).await?;

        info!(pod = %pod_ref, "Updated remote pod");
        Ok(())
    }

    async fn delete_pod(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        name: &str,
        params: &DeleteParams,
    ) -> Result<()> {
        let pod_ref = PodRef::new(namespace, name);
        debug!(pod = %pod_ref, grace_period = ?params.grace_period_seconds, "Received DeletePod request");

        match until_cancelled(cancel, self.api.delete(&pod_ref, params)).await {
            Ok(()) => {
                info!(pod = %pod_ref, "Deleted remote pod");
                Ok(())
            }
            Err(ProviderError::Remote(e)) if is_api_status(&e, 404) => {
                Err(ProviderError::NotFound(pod_ref))
            }
            Err(e) => Err(e),
        }
    }

    async fn get_pod(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        name: &str,
    ) -> Result<Pod> {
        let pod_ref = PodRef::new(namespace, name);
        debug!(pod = %pod_ref, "Received GetPod request");

        until_cancelled(cancel, self.api.get(&pod_ref))
            .await?
            .ok_or(ProviderError::NotFound(pod_ref))
    }

    async fn get_pod_status(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        name: &str,
    ) -> Result<PodStatus> {
        let pod_ref = PodRef::new(namespace, name);
        debug!(pod = %pod_ref, "Received GetPodStatus request");

        match until_cancelled(cancel, self.api.get(&pod_ref)).await? {
            Some(pod) => Ok(pod.status.unwrap_or_default()),
            None => {
                debug!(pod = %pod_ref, "Remote pod absent, reporting Unknown");
                Ok(PodStatus {
                    phase: Some("Unknown".to_string()),
                    ..Default::default()
                })
            }
        }
    }

    async fn get_pods(&self, cancel: &CancellationToken) -> Result<Vec<Pod>> {
        debug!("Received GetPods request");

        let params = ListParams::default().labels(&ownership::owner_selector());
        let mut pods = until_cancelled(cancel, self.api.list(&params)).await?;
        pods.retain(ownership::is_owned);

        debug!(count = pods.len(), "Responding to GetPods");
        Ok(pods)
    }

    async fn get_container_logs(
        &self,
        _cancel: &CancellationToken,
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        opts: &ContainerLogOptions,
    ) -> Result<ContainerLogs> {
        debug!(
            namespace,
            pod = pod_name,
            container = container_name,
            ?opts,
            "Received GetContainerLogs request"
        );
        Ok(Box::new(futures::io::Cursor::new(LOGS_PLACEHOLDER.as_bytes())))
    }

    async fn run_in_container(
        &self,
        _cancel: &CancellationToken,
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        cmd: &[String],
    ) -> Result<()> {
        debug!(
            namespace,
            pod = pod_name,
            container = container_name,
            ?cmd,
            "Received RunInContainer request"
        );
        Err(ProviderError::NotImplemented("exec"))
    }

    fn capacity(&self) -> BTreeMap<String, Quantity> {
        node::capacity()
    }

    fn node_conditions(&self) -> Vec<NodeCondition> {
        node::conditions(Utc::now())
    }

    fn node_addresses(&self) -> Vec<NodeAddress> {
        node::addresses(&self.node)
    }

    fn node_daemon_endpoints(&self) -> NodeDaemonEndpoints {
        node::daemon_endpoints(&self.node)
    }

    fn operating_system(&self) -> &str {
        &self.node.operating_system
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MockPodApi;
    use crate::translate::build_remote_pod;
    use futures::AsyncReadExt;
    use k8s_openapi::api::core::v1::{Container, PodSpec};
    use kube::api::ObjectMeta;

    fn test_provider() -> RemoteProvider<MockPodApi> {
        RemoteProvider::new(MockPodApi::new(), NodeInfo::default())
    }

    fn host_pod(namespace: &str, name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "c".to_string(),
                    image: Some("nginx".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn foreign_pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_pod_submits_translated_pod() {
        let provider = test_provider();
        let cancel = CancellationToken::new();

        provider
            .create_pod(&cancel, &host_pod("default", "web"))
            .await
            .unwrap();

        let stored = provider.api().pod(&PodRef::new("default", "web")).unwrap();
        assert!(ownership::is_owned(&stored));
        assert_eq!(stored.spec.unwrap().volumes, Some(Vec::new()));
    }

    #[tokio::test]
    async fn create_pod_twice_yields_one_remote_pod() {
        let provider = test_provider();
        let cancel = CancellationToken::new();
        let pod = host_pod("default", "web");

        provider.create_pod(&cancel, &pod).await.unwrap();
        provider.create_pod(&cancel, &pod).await.unwrap();

        assert_eq!(provider.api().pod_count(), 1);
        assert_eq!(provider.api().create_calls(), 1);
    }

    #[tokio::test]
    async fn create_pod_passes_remote_errors_through() {
        let provider = test_provider();
        provider.api().set_unavailable(true);

        let err = provider
            .create_pod(&CancellationToken::new(), &host_pod("default", "web"))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 503);
        assert!(matches!(err, ProviderError::Remote(_)));
    }

    #[tokio::test]
    async fn update_pod_replaces_existing_pod() {
        let provider = test_provider();
        let cancel = CancellationToken::new();
        let pod = host_pod("default", "web");

        provider.create_pod(&cancel, &pod).await.unwrap();
        let before = provider.api().pod(&PodRef::new("default", "web")).unwrap();

        provider.update_pod(&cancel, &pod).await.unwrap();
        let after = provider.api().pod(&PodRef::new("default", "web")).unwrap();

        assert_ne!(
            before.metadata.resource_version,
            after.metadata.resource_version
        );
        assert_eq!(before.spec, after.spec);
    }

    #[tokio::test]
    async fn update_pod_propagates_remote_error() {
        let provider = test_provider();

        let err = provider
            .update_pod(&CancellationToken::new(), &host_pod("default", "ghost"))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 404);
        assert!(matches!(err, ProviderError::Remote(_)));
    }

    #[tokio::test]
    async fn delete_pod_removes_remote_pod() {
        let provider = test_provider();
        let cancel = CancellationToken::new();

        provider
            .create_pod(&cancel, &host_pod("default", "web"))
            .await
            .unwrap();
        provider
            .delete_pod(&cancel, "default", "web", &DeleteParams::default().grace_period(0))
            .await
            .unwrap();

        assert_eq!(provider.api().pod_count(), 0);
    }

    #[tokio::test]
    async fn delete_missing_pod_is_not_found() {
        let provider = test_provider();

        let err = provider
            .delete_pod(
                &CancellationToken::new(),
                "default",
                "missing",
                &DeleteParams::default(),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn get_pod_returns_remote_pod() {
        let provider = test_provider();
        let cancel = CancellationToken::new();
        provider
            .create_pod(&cancel, &host_pod("default", "web"))
            .await
            .unwrap();

        let pod = provider.get_pod(&cancel, "default", "web").await.unwrap();
        assert_eq!(pod.metadata.name.as_deref(), Some("web"));
    }

    #[tokio::test]
    async fn get_missing_pod_is_not_found() {
        let provider = test_provider();

        let err = provider
            .get_pod(&CancellationToken::new(), "default", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(ref r) if r.name() == "missing"));
    }

    #[tokio::test]
    async fn get_pod_status_of_missing_pod_is_unknown() {
        let provider = test_provider();

        let status = provider
            .get_pod_status(&CancellationToken::new(), "default", "missing")
            .await
            .unwrap();
        assert_eq!(status.phase.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn get_pod_status_returns_remote_status() {
        let provider = test_provider();
        let mut remote = build_remote_pod(&host_pod("default", "web")).unwrap();
        remote.status = Some(PodStatus {
            phase: Some("Running".to_string()),
            ..Default::default()
        });
        provider.api().insert(remote);

        let status = provider
            .get_pod_status(&CancellationToken::new(), "default", "web")
            .await
            .unwrap();
        assert_eq!(status.phase.as_deref(), Some("Running"));
    }

    #[tokio::test]
    async fn get_pod_status_propagates_other_errors() {
        let provider = test_provider();
        provider.api().set_unavailable(true);

        let err = provider
            .get_pod_status(&CancellationToken::new(), "default", "web")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Remote(_)));
    }

    #[tokio::test]
    async fn get_pods_returns_only_owned_pods() {
        let provider = test_provider();
        let cancel = CancellationToken::new();

        provider
            .create_pod(&cancel, &host_pod("default", "a"))
            .await
            .unwrap();
        provider
            .create_pod(&cancel, &host_pod("team", "b"))
            .await
            .unwrap();
        provider.api().insert(foreign_pod("unmanaged"));

        // Label without the annotation does not count as ownership.
        let mut label_only = foreign_pod("label-only");
        label_only.metadata.labels = Some(ownership::owner_marker());
        provider.api().insert(label_only);

        let pods = provider.get_pods(&cancel).await.unwrap();
        let names: Vec<_> = pods
            .iter()
            .filter_map(|p| p.metadata.name.as_deref())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn get_pods_returns_independent_values() {
        let provider = test_provider();
        let cancel = CancellationToken::new();
        provider
            .create_pod(&cancel, &host_pod("default", "a"))
            .await
            .unwrap();
        provider
            .create_pod(&cancel, &host_pod("default", "b"))
            .await
            .unwrap();

        let mut pods = provider.get_pods(&cancel).await.unwrap();
        pods[0].metadata.name = Some("renamed".to_string());

        assert_eq!(pods[1].metadata.name.as_deref(), Some("b"));
        assert!(provider
            .api()
            .pod(&PodRef::new("default", "a"))
            .is_some());
    }

    #[tokio::test]
    async fn run_in_container_is_not_implemented() {
        let provider = test_provider();

        let err = provider
            .run_in_container(
                &CancellationToken::new(),
                "default",
                "web",
                "c",
                &["sh".to_string()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn container_logs_return_placeholder() {
        let provider = test_provider();

        let mut logs = provider
            .get_container_logs(
                &CancellationToken::new(),
                "default",
                "web",
                "c",
                &ContainerLogOptions::default(),
            )
            .await
            .unwrap();

        let mut text = String::new();
        logs.read_to_string(&mut text).await.unwrap();
        assert!(!text.is_empty());
        assert_eq!(text, LOGS_PLACEHOLDER);
    }

    #[tokio::test]
    async fn cancelled_token_aborts_remote_call() {
        let provider = test_provider();
        provider.api().set_stalled(true);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        let err = provider
            .get_pod(&cancel, "default", "web")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }

    #[tokio::test]
    async fn node_status_is_static() {
        let provider = test_provider();

        assert_eq!(provider.capacity(), node::capacity());
        assert_eq!(provider.operating_system(), "Linux");
        assert_eq!(provider.node_addresses()[0].address, "127.0.0.1");
        assert_eq!(
            provider
                .node_daemon_endpoints()
                .kubelet_endpoint
                .unwrap()
                .port,
            10250
        );
    }

    #[test]
    fn node_condition_timestamps_do_not_go_backwards() {
        let provider = test_provider();

        let first = provider.node_conditions();
        let second = provider.node_conditions();

        let stamp = |c: &NodeCondition| c.last_heartbeat_time.clone().unwrap().0;
        assert!(stamp(&second[0]) >= stamp(&first[0]));
        assert!(second
            .iter()
            .any(|c| c.type_ == "Ready" && c.status == "True"));
    }
}
