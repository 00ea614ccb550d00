//! Client-enforced deadline for remote calls

use std::future::Future;
use std::time::Duration;

use crate::errors::LauncherError;

/// Run `operation`, turning expiry of `limit` into a transport error
pub async fn with_timeout<T>(
    limit: Duration,
    operation: impl Future<Output = Result<T, LauncherError>>,
) -> Result<T, LauncherError> {
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(LauncherError::TransportError(format!(
            "no response within {:?}",
            limit
        ))),
    }
}
