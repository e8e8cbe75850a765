//! Translation between host pods and remote pods.
//!
//! A remote pod is built from the host pod by whitelisting: each container
//! keeps only its name, image, command, args, resources, ports, env and
//! working directory. Everything else, including fields Kubernetes adds in
//! the future, is dropped. Volumes are always emptied and the ownership
//! marker is attached.

use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use kube::api::ObjectMeta;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use relaylet_core::{ownership, PodRef};

use crate::cancel::until_cancelled;
use crate::remote::PodApi;
use crate::{ProviderError, Result};

/// Build a fresh remote pod from a host pod.
///
/// The result keeps the host namespace and name, so both pods share one
/// [`PodRef`].
///
/// # Errors
///
/// Returns [`ProviderError::InvalidPod`] if the host pod has no name.
pub fn build_remote_pod(host: &Pod) -> Result<Pod> {
    let pod_ref = PodRef::from_pod(host)?;
    let spec = host.spec.as_ref();

    Ok(Pod {
        metadata: ObjectMeta {
            name: Some(pod_ref.name().to_string()),
            namespace: Some(pod_ref.namespace().to_string()),
            annotations: Some(ownership::owner_marker()),
            labels: Some(ownership::owner_marker()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            volumes: Some(Vec::new()),
            containers: spec
                .map(|s| s.containers.iter().map(whitelist_container).collect())
                .unwrap_or_default(),
            restart_policy: spec.and_then(|s| s.restart_policy.clone()),
            ..Default::default()
        }),
        status: None,
    })
}

fn whitelist_container(container: &Container) -> Container {
    Container {
        name: container.name.clone(),
        image: container.image.clone(),
        command: container.command.clone(),
        args: container.args.clone(),
        resources: container.resources.clone(),
        ports: container.ports.clone(),
        env: container.env.clone(),
        working_dir: container.working_dir.clone(),
        ..Default::default()
    }
}

/// Translate a host pod into the pod to submit to the remote cluster.
///
/// If a remote pod with the same identity already exists it is returned
/// unchanged; no field-level reconciliation happens.
///
/// # Errors
///
/// Returns the error of the existence lookup, or [`ProviderError::InvalidPod`]
/// if the host pod has no name.
pub async fn to_remote<A>(api: &A, cancel: &CancellationToken, host: &Pod) -> Result<Pod>
where
    A: PodApi + ?Sized,
{
    let pod_ref = PodRef::from_pod(host)?;

    if let Some(existing) = until_cancelled(cancel, api.get(&pod_ref)).await? {
        debug!(pod = %pod_ref, "Remote pod exists, reusing it");
        return Ok(existing);
    }

    build_remote_pod(host)
}

/// Overwrite a host pod's spec and status with its remote counterpart's.
///
/// # Errors
///
/// Returns [`ProviderError::NotFound`] if the remote pod does not exist.
pub async fn merge_remote<A>(api: &A, cancel: &CancellationToken, mut host: Pod) -> Result<Pod>
where
    A: PodApi + ?Sized,
{
    let pod_ref = PodRef::from_pod(&host)?;
    let remote = until_cancelled(cancel, api.get(&pod_ref))
        .await?
        .ok_or(ProviderError::NotFound(pod_ref))?;

    host.spec = remote.spec;
    host.status = remote.status;
    Ok(host)
}
