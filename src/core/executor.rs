//! The sync capability the scheduler calls into.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SyncError, SyncOutcome};

/// Performs one synchronization of a batch of external entities.
///
/// The scheduler is agnostic to what this does; it only races it against the
/// per-attempt timeout and classifies the result. Implementations are shared
/// across concurrent attempts, so they must be `Send + Sync`.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use sync_scheduler::core::{SyncError, SyncExecutor, SyncOutcome};
///
/// struct StatusPusher {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl SyncExecutor for StatusPusher {
///     async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
///         let resp = self.client.post("https://platform/status").json(target_ids).send().await
///             .map_err(|e| SyncError::remote(e.to_string()))?;
///         resp.json().await.map_err(|e| SyncError::remote(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait SyncExecutor: Send + Sync + 'static {
    /// Synchronize `target_ids` and report per-target counts.
    async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError>;
}

#[async_trait]
impl<E: SyncExecutor + ?Sized> SyncExecutor for Arc<E> {
    async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        (**self).perform_sync(target_ids).await
    }
}

#[async_trait]
impl<E: SyncExecutor + ?Sized> SyncExecutor for Box<E> {
    async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        (**self).perform_sync(target_ids).await
    }
}
