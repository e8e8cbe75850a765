//! Daemon endpoint error types and responses.
//!
//! Every failed request answers with the same JSON body:
//! `{"error": {"code": "...", "message": "..."}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use relaylet_provider::ProviderError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested pod was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The capability is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The remote cluster rejected or failed the call.
    #[error("upstream error: {message}")]
    Upstream {
        /// Status to answer with.
        status: StatusCode,
        /// Upstream message.
        message: String,
    },

    /// The daemon is shutting down.
    #[error("service unavailable")]
    Unavailable,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Upstream { status, .. } => *status,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::NotImplemented(_) => "not_implemented",
            Self::Upstream { .. } => "upstream_error",
            Self::Unavailable => "unavailable",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(pod) => Self::NotFound(format!("pod {pod}")),
            ProviderError::InvalidPod(e) => Self::BadRequest(e.to_string()),
            ProviderError::NotImplemented(what) => Self::NotImplemented(what.to_string()),
            ProviderError::Cancelled => Self::Unavailable,
            ProviderError::Remote(kube::Error::Api(resp)) => Self::Upstream {
                status: StatusCode::from_u16(resp.code).unwrap_or(StatusCode::BAD_GATEWAY),
                message: resp.message,
            },
            ProviderError::Remote(e) => {
                tracing::error!(error = %e, "Remote cluster call failed");
                Self::Upstream {
                    status: StatusCode::BAD_GATEWAY,
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Result type for daemon endpoint handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse as KubeErrorResponse;
    use relaylet_core::PodRef;

    #[test]
    fn provider_errors_map_to_statuses() {
        let cases = [
            (
                ProviderError::NotFound(PodRef::new("default", "web")),
                StatusCode::NOT_FOUND,
            ),
            (
                ProviderError::NotImplemented("exec"),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (ProviderError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn remote_api_status_is_passed_through() {
        let err = ProviderError::Remote(kube::Error::Api(KubeErrorResponse {
            status: "Failure".to_string(),
            message: "forbidden by policy".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        }));

        let api = ApiError::from(err);
        assert_eq!(api.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(api.code(), "upstream_error");
        assert!(api.to_string().contains("forbidden by policy"));
    }

    #[test]
    fn not_found_message_names_pod() {
        let api = ApiError::from(ProviderError::NotFound(PodRef::new("team", "web")));
        assert_eq!(api.to_string(), "not found: pod team/web");
    }
}
