//! Router configuration.
//!
//! This module sets up the Axum router for the kubelet daemon endpoint.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use relaylet_provider::Provider;

use crate::handlers::{containers, health, pods};
use crate::state::DaemonState;

/// Create the daemon endpoint router.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET /pods` - List managed pods
/// - `GET /pods/:namespace/:name` - Get a managed pod
/// - `GET /containerLogs/:namespace/:pod/:container` - Container logs
/// - `POST /run/:namespace/:pod/:container` - Run a command in a container
pub fn create_router<P>(state: DaemonState<P>) -> Router
where
    P: Provider + 'static,
{
    Router::new()
        .route("/health", get(health::health))
        .route("/pods", get(pods::list_pods::<P>))
        .route("/pods/:namespace/:name", get(pods::get_pod::<P>))
        .route(
            "/containerLogs/:namespace/:pod/:container",
            get(containers::container_logs::<P>),
        )
        .route(
            "/run/:namespace/:pod/:container",
            post(containers::run_in_container::<P>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
