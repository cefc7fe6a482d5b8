use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::{EntityType, SyncAction, SyncPayload};

/// Failure of a single remote call. The message is stored on the queue entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RemoteError(pub String);

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The remote side of sync: apply one queued mutation.
///
/// Implementations return `Err` to mark that single entry as failed; the drain
/// carries on with the next one. Futures are not required to be `Send`, since
/// draining runs on the same thread as the store.
#[async_trait(?Send)]
pub trait RemoteEffect {
    async fn apply(
        &self,
        action: SyncAction,
        entity_type: EntityType,
        entity_id: &str,
        data: Option<&SyncPayload>,
    ) -> Result<(), RemoteError>;
}

/// Stand-in remote that accepts everything after an optional delay.
#[derive(Debug, Clone, Default)]
pub struct StubRemote {
    latency: Duration,
}

impl StubRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait(?Send)]
impl RemoteEffect for StubRemote {
    async fn apply(
        &self,
        action: SyncAction,
        entity_type: EntityType,
        entity_id: &str,
        data: Option<&SyncPayload>,
    ) -> Result<(), RemoteError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        tracing::info!(
            %action,
            entity = %entity_type,
            entity_id,
            has_data = data.is_some(),
            "stub remote accepted mutation"
        );
        Ok(())
    }
}
