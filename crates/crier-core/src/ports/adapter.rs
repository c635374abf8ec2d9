//! PlatformAdapter port: the capability every publish target implements.

use async_trait::async_trait;

use crate::domain::{AdapterError, Platform, PlatformResult, PublishRequest};

/// Publishes content to one or more platforms.
///
/// Expected failures (rejected content, expired login, bridge says no) are
/// returned as `Ok` with a `failed` result. `Err` is reserved for faults the
/// caller could not anticipate; the engine converts those into the same
/// failed result.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    async fn publish(
        &self,
        request: &PublishRequest,
        platform: Platform,
    ) -> Result<PlatformResult, AdapterError>;

    /// Whether the account for `platform` is currently logged in.
    async fn check_auth(&self, platform: Platform) -> Result<bool, AdapterError>;

    /// Platforms this adapter serves.
    fn supported_targets(&self) -> Vec<Platform>;
}
