//! Pod listing endpoints.

use axum::extract::{Path, State};
use axum::Json;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use k8s_openapi::List;

use relaylet_provider::Provider;

use crate::error::ApiResult;
use crate::state::DaemonState;

/// List the pods this provider manages.
///
/// ```text
/// GET /pods
///
/// Response: 200 OK
/// { "apiVersion": "v1", "kind": "PodList", "items": [...] }
/// ```
///
/// # Errors
///
/// Returns an error if the remote cluster cannot be listed.
pub async fn list_pods<P>(State(state): State<DaemonState<P>>) -> ApiResult<Json<List<Pod>>>
where
    P: Provider + 'static,
{
    let pods = state.provider.get_pods(&state.request_token()).await?;
    tracing::debug!(count = pods.len(), "Serving pod list");

    Ok(Json(List {
        items: pods,
        metadata: ListMeta::default(),
    }))
}

/// Get a single remote pod.
///
/// # Errors
///
/// Returns a 404 if the pod does not exist in the remote cluster.
pub async fn get_pod<P>(
    State(state): State<DaemonState<P>>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<Pod>>
where
    P: Provider + 'static,
{
    let pod = state
        .provider
        .get_pod(&state.request_token(), &namespace, &name)
        .await?;
    Ok(Json(pod))
}
