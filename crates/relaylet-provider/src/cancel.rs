use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{ProviderError, Result};

/// Drive a remote call unless the caller cancels first.
///
/// The call future is dropped on cancellation, which aborts the request.
pub(crate) async fn until_cancelled<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = kube::Result<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = call => Ok(result?),
    }
}
