//! Access to pods in the remote cluster.
//!
//! [`PodApi`] is the seam between the provider and the remote API server.
//! [`KubePodApi`] implements it over a `kube::Client`; the in-memory
//! [`mock::MockPodApi`] implements it for tests.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;

use relaylet_core::PodRef;

/// Pod operations against the remote cluster.
///
/// Errors are raw `kube::Error`s; interpreting them is the provider's job.
#[async_trait]
pub trait PodApi: Send + Sync {
    /// Fetch a pod, returning `None` if it does not exist.
    async fn get(&self, pod_ref: &PodRef) -> kube::Result<Option<Pod>>;

    /// Create a pod.
    async fn create(&self, pod_ref: &PodRef, pod: &Pod) -> kube::Result<Pod>;

    /// Replace an existing pod.
    async fn replace(&self, pod_ref: &PodRef, pod: &Pod) -> kube::Result<Pod>;

    /// Delete a pod.
    async fn delete(&self, pod_ref: &PodRef, params: &DeleteParams) -> kube::Result<()>;

    /// List pods across all namespaces.
    async fn list(&self, params: &ListParams) -> kube::Result<Vec<Pod>>;
}

/// [`PodApi`] backed by a Kubernetes client.
#[derive(Clone)]
pub struct KubePodApi {
    client: Client,
}

impl KubePodApi {
    /// Wrap a client for the remote cluster.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl PodApi for KubePodApi {
    async fn get(&self, pod_ref: &PodRef) -> kube::Result<Option<Pod>> {
        self.namespaced(pod_ref.namespace())
            .get_opt(pod_ref.name())
            .await
    }

    async fn create(&self, pod_ref: &PodRef, pod: &Pod) -> kube::Result<Pod> {
        self.namespaced(pod_ref.namespace())
            .create(&PostParams::default(), pod)
            .await
    }

    async fn replace(&self, pod_ref: &PodRef, pod: &Pod) -> kube::Result<Pod> {
        self.namespaced(pod_ref.namespace())
            .replace(pod_ref.name(), &PostParams::default(), pod)
            .await
    }

    async fn delete(&self, pod_ref: &PodRef, params: &DeleteParams) -> kube::Result<()> {
        self.namespaced(pod_ref.namespace())
            .delete(pod_ref.name(), params)
            .await
            .map(|_| ())
    }

    async fn list(&self, params: &ListParams) -> kube::Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        Ok(pods.list(params).await?.items)
    }
}

/// An in-memory remote cluster for testing without a real API server.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use kube::error::ErrorResponse;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    /// A mock pod API that stores pods in memory.
    ///
    /// Mirrors the API server's answers that matter to the provider: 404 for
    /// absent pods, 409 on create of an existing pod and on stale
    /// `resourceVersion`s, label selector filtering on list.
    #[derive(Default)]
    pub struct MockPodApi {
        pods: Mutex<BTreeMap<PodRef, Pod>>,
        resource_version: AtomicU64,
        create_calls: AtomicU64,
        unavailable: AtomicBool,
        stalled: AtomicBool,
    }

    impl MockPodApi {
        /// Create an empty mock cluster.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Store a pod directly, bypassing the create path.
        ///
        /// # Panics
        ///
        /// Panics if the pod has no name.
        pub fn insert(&self, pod: Pod) {
            let pod_ref = PodRef::from_pod(&pod).expect("mock pods must be named");
            let pod = self.stamp(pod);
            self.pods.lock().insert(pod_ref, pod);
        }

        /// Get a stored pod.
        #[must_use]
        pub fn pod(&self, pod_ref: &PodRef) -> Option<Pod> {
            self.pods.lock().get(pod_ref).cloned()
        }

        /// Get the number of stored pods.
        #[must_use]
        pub fn pod_count(&self) -> usize {
            self.pods.lock().len()
        }

        /// Get the number of create calls received, successful or not.
        #[must_use]
        pub fn create_calls(&self) -> u64 {
            self.create_calls.load(Ordering::SeqCst)
        }

        /// Make every call fail with 503 Service Unavailable.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Make every call hang until it is dropped.
        pub fn set_stalled(&self, stalled: bool) {
            self.stalled.store(stalled, Ordering::SeqCst);
        }

        fn stamp(&self, mut pod: Pod) -> Pod {
            let version = self.resource_version.fetch_add(1, Ordering::SeqCst) + 1;
            pod.metadata.resource_version = Some(version.to_string());
            pod
        }

        async fn gate(&self) -> kube::Result<()> {
            if self.stalled.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(api_error(503, "ServiceUnavailable", "remote cluster unavailable"));
            }
            Ok(())
        }
    }

    fn api_error(code: u16, reason: &str, message: impl Into<String>) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: message.into(),
            reason: reason.to_string(),
            code,
        })
    }

    fn not_found(pod_ref: &PodRef) -> kube::Error {
        api_error(404, "NotFound", format!("pods \"{}\" not found", pod_ref.name()))
    }

    fn matches_selector(pod: &Pod, selector: Option<&str>) -> bool {
        let Some(selector) = selector else {
            return true;
        };
        let labels = pod.metadata.labels.as_ref();

        selector
            .split(',')
            .filter(|term| !term.is_empty())
            .all(|term| match term.split_once('=') {
                Some((key, value)) => labels
                    .and_then(|l| l.get(key.trim()))
                    .is_some_and(|v| v == value.trim()),
                None => labels.is_some_and(|l| l.contains_key(term.trim())),
            })
    }

    #[async_trait]
    impl PodApi for MockPodApi {
        async fn get(&self, pod_ref: &PodRef) -> kube::Result<Option<Pod>> {
            self.gate().await?;
            Ok(self.pods.lock().get(pod_ref).cloned())
        }

        async fn create(&self, pod_ref: &PodRef, pod: &Pod) -> kube::Result<Pod> {
            self.gate().await?;
            self.create_calls.fetch_add(1, Ordering::SeqCst);

            let mut pods = self.pods.lock();
            if pods.contains_key(pod_ref) {
                return Err(api_error(
                    409,
                    "AlreadyExists",
                    format!("pods \"{}\" already exists", pod_ref.name()),
                ));
            }

            let created = self.stamp(pod.clone());
            pods.insert(pod_ref.clone(), created.clone());
            Ok(created)
        }

        async fn replace(&self, pod_ref: &PodRef, pod: &Pod) -> kube::Result<Pod> {
            self.gate().await?;

            let mut pods = self.pods.lock();
            let Some(current) = pods.get(pod_ref) else {
                return Err(not_found(pod_ref));
            };

            if let Some(version) = &pod.metadata.resource_version {
                if current.metadata.resource_version.as_ref() != Some(version) {
                    return Err(api_error(
                        409,
                        "Conflict",
                        "the object has been modified; please apply your changes to the latest version",
                    ));
                }
            }

            let replaced = self.stamp(pod.clone());
            pods.insert(pod_ref.clone(), replaced.clone());
            Ok(replaced)
        }

        async fn delete(&self, pod_ref: &PodRef, _params: &DeleteParams) -> kube::Result<()> {
            self.gate().await?;
            self.pods
                .lock()
                .remove(pod_ref)
                .map(|_| ())
                .ok_or_else(|| not_found(pod_ref))
        }

        async fn list(&self, params: &ListParams) -> kube::Result<Vec<Pod>> {
            self.gate().await?;
            Ok(self
                .pods
                .lock()
                .values()
                .filter(|pod| matches_selector(pod, params.label_selector.as_deref()))
                .cloned()
                .collect())
        }
    }
}
