//! Virtual node registration and status heartbeat.

use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ObjectMeta, Patch, PatchParams};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relaylet_provider::node::{build_node, build_node_status};
use relaylet_provider::Provider;

/// Field manager used for server-side apply.
pub const FIELD_MANAGER: &str = "relaylet";

/// A status-only `Node` for applying to the status subresource.
#[must_use]
pub fn status_patch<P>(provider: &P, node_name: &str) -> Node
where
    P: Provider + ?Sized,
{
    Node {
        metadata: ObjectMeta {
            name: Some(node_name.to_string()),
            ..Default::default()
        },
        spec: None,
        status: Some(build_node_status(provider)),
    }
}

/// Keeps the virtual node registered and its conditions fresh.
pub struct NodeHeartbeat<P> {
    provider: Arc<P>,
    host: Client,
    node_name: String,
    interval: Duration,
}

impl<P> NodeHeartbeat<P>
where
    P: Provider + 'static,
{
    /// Create a heartbeat for `node_name` against the host cluster.
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        host: Client,
        node_name: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            host,
            node_name: node_name.into(),
            interval,
        }
    }

    fn nodes(&self) -> Api<Node> {
        Api::all(self.host.clone())
    }

    fn patch_params() -> PatchParams {
        PatchParams::apply(FIELD_MANAGER).force()
    }

    /// Register the virtual node in the host cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the host API server rejects the node.
    pub async fn register(&self) -> Result<(), kube::Error> {
        let node = build_node(self.provider.as_ref(), &self.node_name);
        self.nodes()
            .patch(&self.node_name, &Self::patch_params(), &Patch::Apply(&node))
            .await?;

        info!(node = %self.node_name, "Registered virtual node");
        Ok(())
    }

    /// Refresh the node status once.
    ///
    /// # Errors
    ///
    /// Returns an error if the status update is rejected.
    pub async fn refresh(&self) -> Result<(), kube::Error> {
        let patch = status_patch(self.provider.as_ref(), &self.node_name);
        self.nodes()
            .patch_status(&self.node_name, &Self::patch_params(), &Patch::Apply(&patch))
            .await?;

        debug!(node = %self.node_name, "Refreshed node status");
        Ok(())
    }

    /// Refresh the node status every interval until `cancel` fires.
    ///
    /// A failed refresh is logged and retried on the next tick, re-registering
    /// the node in case it was removed.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately; registration covers it.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.refresh().await {
                warn!(node = %self.node_name, error = %e, "Node status refresh failed");
                if let Err(e) = self.register().await {
                    warn!(node = %self.node_name, error = %e, "Node re-registration failed");
                }
            }
        }

        info!(node = %self.node_name, "Node heartbeat stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaylet_provider::node::PROVIDER_TAINT_KEY;
    use relaylet_provider::{MockPodApi, NodeInfo, RemoteProvider};
    use serde_json::Value;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    type TestProvider = RemoteProvider<MockPodApi>;

    fn heartbeat(server: &MockServer) -> NodeHeartbeat<TestProvider> {
        let host = Client::try_from(kube::Config::new(server.uri().parse().unwrap())).unwrap();
        NodeHeartbeat::new(
            Arc::new(RemoteProvider::new(MockPodApi::new(), NodeInfo::default())),
            host,
            "relaylet",
            Duration::from_secs(10),
        )
    }

    async fn mount_apply(server: &MockServer, url_path: &str) {
        let provider = RemoteProvider::new(MockPodApi::new(), NodeInfo::default());
        Mock::given(method("PATCH"))
            .and(path(url_path))
            .and(query_param("fieldManager", FIELD_MANAGER))
            .and(query_param("force", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(build_node(&provider, "relaylet")),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    fn only_request(requests: &[Request]) -> (&str, Value) {
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        let content_type = request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        (content_type, request.body_json().unwrap())
    }

    #[tokio::test]
    async fn register_applies_full_node() {
        let server = MockServer::start().await;
        mount_apply(&server, "/api/v1/nodes/relaylet").await;

        heartbeat(&server).register().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let (content_type, body) = only_request(&requests);
        assert_eq!(content_type, "application/apply-patch+yaml");
        assert_eq!(body["kind"], "Node");
        assert_eq!(body["metadata"]["labels"]["type"], "virtual-kubelet");
        assert_eq!(body["spec"]["taints"][0]["key"], PROVIDER_TAINT_KEY);
        assert_eq!(body["spec"]["taints"][0]["effect"], "NoSchedule");
    }

    #[tokio::test]
    async fn refresh_applies_status_subresource() {
        let server = MockServer::start().await;
        mount_apply(&server, "/api/v1/nodes/relaylet/status").await;

        heartbeat(&server).refresh().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let (content_type, body) = only_request(&requests);
        assert_eq!(content_type, "application/apply-patch+yaml");
        assert!(body.get("spec").is_none());
        assert_eq!(body["status"]["conditions"].as_array().unwrap().len(), 6);
        assert_eq!(body["status"]["capacity"]["memory"], "50Gi");
    }

    #[tokio::test]
    async fn refresh_surfaces_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": "invalid node",
                "reason": "Invalid",
                "code": 422
            })))
            .mount(&server)
            .await;

        let err = heartbeat(&server).refresh().await.unwrap_err();
        assert!(matches!(err, kube::Error::Api(e) if e.code == 422));
    }

    #[test]
    fn status_patch_carries_only_status() {
        let provider = RemoteProvider::new(MockPodApi::new(), NodeInfo::default());
        let node = status_patch(&provider, "relaylet");

        assert_eq!(node.metadata.name.as_deref(), Some("relaylet"));
        assert!(node.spec.is_none());
        assert!(node.metadata.labels.is_none());

        let status = node.status.unwrap();
        assert_eq!(status.conditions.unwrap().len(), 6);
        assert_eq!(status.capacity, Some(provider.capacity()));
    }

    #[test]
    fn status_patch_serializes_as_node() {
        let provider = RemoteProvider::new(MockPodApi::new(), NodeInfo::default());
        let value = serde_json::to_value(status_patch(&provider, "edge")).unwrap();

        assert_eq!(value["apiVersion"], "v1");
        assert_eq!(value["kind"], "Node");
        assert_eq!(value["metadata"]["name"], "edge");
        assert!(value.get("spec").is_none());
        assert_eq!(
            value["status"]["daemonEndpoints"]["kubeletEndpoint"]["Port"],
            10250
        );
    }
}
