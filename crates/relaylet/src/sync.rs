//! Host pod sync.
//!
//! Watches host pods bound to the virtual node and relays their lifecycle to
//! the provider, then writes the provider's view of each pod back onto the
//! host pod's status.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::runtime::watcher::{self, watcher, Config as WatcherConfig};
use kube::{Client, ResourceExt};
use parking_lot::Mutex;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use relaylet_core::PodRef;
use relaylet_provider::{Provider, ProviderError};

/// What the sync loop does with a host pod it observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Create the pod in the provider.
    Create,
    /// Hand a changed pod spec to the provider.
    Update,
    /// Delete the pod from the provider, then release the host pod.
    Delete {
        /// Grace period requested on the host pod.
        grace_period_seconds: Option<u32>,
    },
    /// Nothing to do.
    Ignore,
}

/// Decide what to do with an observed host pod.
///
/// `last_generation` is the generation last relayed for this pod, if any.
/// A higher generation means the spec changed and plans an update; anything
/// else re-asserts creation, which the provider treats as a no-op for pods it
/// already runs.
#[must_use]
pub fn plan(pod: &Pod, last_generation: Option<i64>) -> SyncAction {
    if pod.metadata.deletion_timestamp.is_some() {
        return SyncAction::Delete {
            grace_period_seconds: pod
                .metadata
                .deletion_grace_period_seconds
                .and_then(|g| u32::try_from(g).ok()),
        };
    }

    let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
    if matches!(phase, Some("Succeeded" | "Failed")) {
        return SyncAction::Ignore;
    }

    match (last_generation, pod.metadata.generation) {
        (Some(last), Some(current)) if current > last => SyncAction::Update,
        _ => SyncAction::Create,
    }
}

/// Field selector matching pods bound to `node_name`.
#[must_use]
pub fn node_field_selector(node_name: &str) -> String {
    format!("spec.nodeName={node_name}")
}

/// Merge patch writing `status` onto a host pod.
#[must_use]
pub fn status_merge_patch(status: &PodStatus) -> serde_json::Value {
    json!({ "status": status })
}

/// Apply a planned action to the provider.
///
/// A delete of a pod the provider does not know is not an error.
///
/// # Errors
///
/// Returns the provider's error for any other failure.
pub async fn relay<P>(
    provider: &P,
    cancel: &CancellationToken,
    pod: &Pod,
    action: SyncAction,
) -> Result<(), ProviderError>
where
    P: Provider + ?Sized,
{
    match action {
        SyncAction::Create => provider.create_pod(cancel, pod).await,
        SyncAction::Update => provider.update_pod(cancel, pod).await,
        SyncAction::Delete {
            grace_period_seconds,
        } => {
            let pod_ref = PodRef::from_pod(pod)?;
            let params = DeleteParams {
                grace_period_seconds,
                ..Default::default()
            };
            match provider
                .delete_pod(cancel, pod_ref.namespace(), pod_ref.name(), &params)
                .await
            {
                Err(e) if e.is_not_found() => {
                    debug!(pod = %pod_ref, "Pod already gone from provider");
                    Ok(())
                }
                other => other,
            }
        }
        SyncAction::Ignore => Ok(()),
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == 404)
}

/// Relays host pods on the virtual node to a provider.
///
/// Remembers the last relayed generation of each pod so spec changes reach
/// [`Provider::update_pod`]; every other event re-asserts creation.
pub struct PodSync<P> {
    provider: Arc<P>,
    host: Client,
    node_name: String,
    status_interval: Duration,
    generations: Mutex<HashMap<PodRef, i64>>,
}

impl<P> PodSync<P>
where
    P: Provider + 'static,
{
    /// Create a pod sync for `node_name` against the host cluster.
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        host: Client,
        node_name: impl Into<String>,
        status_interval: Duration,
    ) -> Self {
        Self {
            provider,
            host,
            node_name: node_name.into(),
            status_interval,
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Run the pod watcher and the status sync until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tokio::join!(
            self.run_pod_watcher(&cancel),
            self.run_status_sync(&cancel)
        );
        info!(node = %self.node_name, "Pod sync stopped");
    }

    async fn run_pod_watcher(&self, cancel: &CancellationToken) {
        let pods: Api<Pod> = Api::all(self.host.clone());
        let config = WatcherConfig::default().fields(&node_field_selector(&self.node_name));

        let watch = watcher(pods, config);
        futures::pin_mut!(watch);

        info!(node = %self.node_name, "Starting host pod watcher");

        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                event = watch.next() => event,
            };

            match event {
                Some(Ok(watcher::Event::Apply(pod) | watcher::Event::InitApply(pod))) => {
                    self.handle_pod_update(cancel, &pod).await;
                }
                Some(Ok(watcher::Event::Delete(pod))) => {
                    self.handle_pod_deleted(cancel, &pod).await;
                }
                Some(Ok(watcher::Event::Init)) => {
                    debug!("Host pod watcher initialized");
                }
                Some(Ok(watcher::Event::InitDone)) => {
                    info!("Initial host pod sync complete");
                }
                Some(Err(e)) => {
                    error!(error = %e, "Host pod watcher error, will retry");
                }
                None => {
                    warn!("Host pod watcher exited unexpectedly");
                    break;
                }
            }
        }
    }

    async fn handle_pod_update(&self, cancel: &CancellationToken, pod: &Pod) {
        let pod_ref = match PodRef::from_pod(pod) {
            Ok(pod_ref) => pod_ref,
            Err(e) => {
                warn!(error = %e, "Skipping unidentifiable host pod");
                return;
            }
        };

        let last_generation = self.generations.lock().get(&pod_ref).copied();
        let action = plan(pod, last_generation);

        if let Err(e) = relay(self.provider.as_ref(), cancel, pod, action).await {
            error!(pod = %pod_ref, ?action, error = %e, "Failed to relay host pod");
            return;
        }

        match action {
            SyncAction::Create | SyncAction::Update => {
                if let Some(generation) = pod.metadata.generation {
                    self.generations.lock().insert(pod_ref, generation);
                }
            }
            SyncAction::Delete { .. } => {
                self.generations.lock().remove(&pod_ref);
                if let Err(e) = self
                    .release_host_pod(pod_ref.namespace(), pod_ref.name())
                    .await
                {
                    error!(pod = %pod_ref, error = %e, "Failed to release host pod");
                }
            }
            SyncAction::Ignore => {}
        }
    }

    async fn handle_pod_deleted(&self, cancel: &CancellationToken, pod: &Pod) {
        if let Ok(pod_ref) = PodRef::from_pod(pod) {
            self.generations.lock().remove(&pod_ref);
        }

        let action = SyncAction::Delete {
            grace_period_seconds: None,
        };
        if let Err(e) = relay(self.provider.as_ref(), cancel, pod, action).await {
            error!(pod = %pod.name_any(), error = %e, "Failed to delete pod from provider");
        }
    }

    /// Finish deletion of a host pod the provider has released.
    ///
    /// A host pod that is already gone counts as released.
    async fn release_host_pod(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        let pods: Api<Pod> = Api::namespaced(self.host.clone(), namespace);
        let params = DeleteParams {
            grace_period_seconds: Some(0),
            ..Default::default()
        };

        match pods.delete(name, &params).await {
            Ok(_) => {
                info!(namespace, pod = name, "Released host pod");
                Ok(())
            }
            Err(e) if is_not_found(&e) => {
                debug!(namespace, pod = name, "Host pod already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn run_status_sync(&self, cancel: &CancellationToken) {
        let mut ticker = tokio::time::interval(self.status_interval);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.sync_statuses(cancel).await {
                error!(error = %e, "Pod status sync failed");
            }
        }
    }

    async fn sync_statuses(&self, cancel: &CancellationToken) -> Result<(), kube::Error> {
        let pods: Api<Pod> = Api::all(self.host.clone());
        let params = ListParams::default().fields(&node_field_selector(&self.node_name));
        let host_pods = pods.list(&params).await?;

        for pod in host_pods.items {
            if pod.metadata.deletion_timestamp.is_some() {
                continue;
            }
            let namespace = pod.namespace().unwrap_or_default();
            let name = pod.name_any();

            let status = match self.provider.get_pod_status(cancel, &namespace, &name).await {
                Ok(status) => status,
                Err(ProviderError::Cancelled) => return Ok(()),
                Err(e) => {
                    warn!(%namespace, pod = %name, error = %e, "Failed to get pod status");
                    continue;
                }
            };

            let patch = Patch::Merge(status_merge_patch(&status));
            let namespaced: Api<Pod> = Api::namespaced(self.host.clone(), &namespace);
            match namespaced
                .patch_status(&name, &PatchParams::default(), &patch)
                .await
            {
                Ok(_) => debug!(%namespace, pod = %name, "Updated host pod status"),
                Err(e) if is_not_found(&e) => {}
                Err(e) => warn!(%namespace, pod = %name, error = %e, "Failed to update host pod status"),
            }
        }

        Ok(())
    }
}
