//! Liveness endpoint.

use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the daemon serves requests.
    pub status: &'static str,
    /// Daemon version.
    pub version: &'static str,
}

/// Report that the daemon endpoint is up.
///
/// Does not touch either cluster, so it stays green while the remote API
/// server is unreachable.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_is_ok_without_clusters() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
