//! Remote coordinator interface
//!
//! The transport that carries heartbeats to the consumer-group coordinator
//! is owned by the caller; the heartbeat loop only sees this trait.

use async_trait::async_trait;

use super::shard_set::ShardSet;
use crate::error::Result;

/// Coordinator-side authority for shard ownership
#[async_trait]
pub trait RemoteCoordinator: Send + Sync {
    /// Announce the shards this consumer wants to own.
    ///
    /// Returns the set the coordinator currently grants to this consumer.
    /// A deleted consumer group must be reported as
    /// [`ShardbeatError::GroupNotExist`](crate::error::ShardbeatError::GroupNotExist)
    /// or as an error whose message carries the
    /// [`GROUP_NOT_EXIST_MARKER`](crate::error::GROUP_NOT_EXIST_MARKER).
    async fn heartbeat(&self, shards: &ShardSet) -> Result<ShardSet>;
}
