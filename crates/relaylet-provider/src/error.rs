//! Error types for the provider crate.

use relaylet_core::{CoreError, PodRef};
use thiserror::Error;

/// Errors returned by provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error returned by the remote cluster API, passed through unchanged.
    #[error("remote cluster API error: {0}")]
    Remote(#[from] kube::Error),

    /// The pod does not exist in the remote cluster.
    #[error("pod {0} is not found")]
    NotFound(PodRef),

    /// The capability is not supported by this provider.
    #[error("{0} is not implemented by the relaylet provider")]
    NotImplemented(&'static str),

    /// The host pod cannot be identified.
    #[error("invalid pod: {0}")]
    InvalidPod(#[from] CoreError),

    /// The caller cancelled the operation before the remote call finished.
    #[error("operation cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Check if this error means the pod does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidPod(_) => 400,
            Self::NotImplemented(_) => 501,
            Self::Cancelled => 503,
            Self::Remote(kube::Error::Api(e)) => e.code,
            Self::Remote(_) => 502,
        }
    }
}

/// Check whether a kube error is an API response with the given status code.
pub(crate) fn is_api_status(err: &kube::Error, code: u16) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == code)
}

/// A specialized Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Test".to_string(),
            code,
        })
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ProviderError::NotFound(PodRef::new("default", "web")).http_status_code(),
            404
        );
        assert_eq!(ProviderError::NotImplemented("exec").http_status_code(), 501);
        assert_eq!(ProviderError::Cancelled.http_status_code(), 503);
        assert_eq!(ProviderError::Remote(api_error(409)).http_status_code(), 409);
        assert_eq!(
            ProviderError::InvalidPod(CoreError::MissingMetadata("name")).http_status_code(),
            400
        );
    }

    #[test]
    fn not_found_is_distinguishable() {
        assert!(ProviderError::NotFound(PodRef::new("default", "web")).is_not_found());
        assert!(!ProviderError::Remote(api_error(404)).is_not_found());
    }

    #[test]
    fn api_status_matching() {
        assert!(is_api_status(&api_error(404), 404));
        assert!(!is_api_status(&api_error(500), 404));
    }
}
