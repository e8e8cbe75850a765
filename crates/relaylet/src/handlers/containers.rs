//! Container log and exec endpoints.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use futures::AsyncReadExt;
use serde::Deserialize;

use relaylet_provider::{ContainerLogOptions, Provider};

use crate::error::{ApiError, ApiResult};
use crate::state::DaemonState;

/// Path of a container: namespace, pod and container name.
type ContainerPath = (String, String, String);

/// Query of an exec request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunQuery {
    /// Command line, split on whitespace.
    pub cmd: String,
}

/// Get the logs of a container.
///
/// ```text
/// GET /containerLogs/:namespace/:pod/:container?tailLines=10
///
/// Response: 200 OK (text/plain)
/// ```
///
/// # Errors
///
/// Returns an error if the provider cannot produce the log stream.
pub async fn container_logs<P>(
    State(state): State<DaemonState<P>>,
    Path((namespace, pod, container)): Path<ContainerPath>,
    Query(opts): Query<ContainerLogOptions>,
) -> ApiResult<impl IntoResponse>
where
    P: Provider + 'static,
{
    let mut logs = state
        .provider
        .get_container_logs(&state.request_token(), &namespace, &pod, &container, &opts)
        .await?;

    let mut body = Vec::new();
    logs.read_to_end(&mut body)
        .await
        .map_err(|e| ApiError::Internal(format!("reading container logs: {e}")))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    ))
}

/// Run a command in a container.
///
/// # Errors
///
/// Returns an error if the provider cannot run the command.
pub async fn run_in_container<P>(
    State(state): State<DaemonState<P>>,
    Path((namespace, pod, container)): Path<ContainerPath>,
    Query(query): Query<RunQuery>,
) -> ApiResult<StatusCode>
where
    P: Provider + 'static,
{
    let cmd: Vec<String> = query.cmd.split_whitespace().map(str::to_string).collect();
    if cmd.is_empty() {
        return Err(ApiError::BadRequest("cmd is required".to_string()));
    }

    state
        .provider
        .run_in_container(&state.request_token(), &namespace, &pod, &container, &cmd)
        .await?;
    Ok(StatusCode::OK)
}
