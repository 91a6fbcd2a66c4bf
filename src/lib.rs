//! Shardbeat Core - client-side shard leases for stream consumer groups
//!
//! This crate keeps a consumer's shard ownership alive:
//! - Periodic heartbeats announcing the shards it wants
//! - Reconciliation against the coordinator's grant
//! - Local self-demotion when the lease can no longer be renewed

pub mod consumer;
pub mod error;
pub mod metrics;
pub mod runtime;

pub use consumer::{
    HeartbeatConfig, HeartbeatCoordinator, RemoteCoordinator, ShardDiff, ShardId, ShardSet,
    TerminalSignal, TickOutcome,
};
pub use error::{Result, ShardbeatError};

/// Default heartbeat interval in seconds
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// Default consumer group timeout in seconds
pub const DEFAULT_GROUP_TIMEOUT_SECS: u64 = 15;
