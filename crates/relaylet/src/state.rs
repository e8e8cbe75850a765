//! Daemon endpoint state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use relaylet_provider::Provider;

/// Shared state for the daemon endpoint handlers.
pub struct DaemonState<P>
where
    P: Provider,
{
    /// The provider serving pod requests.
    pub provider: Arc<P>,
    /// Cancelled when the daemon shuts down; each request gets a child token.
    pub cancel: CancellationToken,
}

impl<P> DaemonState<P>
where
    P: Provider,
{
    /// Create a new daemon state.
    #[must_use]
    pub fn new(provider: Arc<P>, cancel: CancellationToken) -> Self {
        Self { provider, cancel }
    }

    /// Token for a single request.
    #[must_use]
    pub fn request_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}

impl<P> Clone for DaemonState<P>
where
    P: Provider,
{
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            cancel: self.cancel.clone(),
        }
    }
}
