//! Common error types for relaylet.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout relaylet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A pod object is missing a metadata field required to identify it.
    #[error("pod is missing metadata.{0}")]
    MissingMetadata(&'static str),

    /// A `namespace/name` string could not be parsed.
    #[error("invalid pod reference: {0}")]
    InvalidPodRef(String),
}
