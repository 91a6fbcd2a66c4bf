//! Consumer-side shard lease maintenance
//!
//! Heartbeat loop, its configuration, the coordinator interface and the
//! shard set algebra it reconciles with.

pub mod config;
pub mod heartbeat;
pub mod remote;
pub mod shard_set;

pub use config::HeartbeatConfig;
pub use heartbeat::{HeartbeatCoordinator, TerminalSignal, TickOutcome};
pub use remote::RemoteCoordinator;
pub use shard_set::{ShardDiff, ShardId, ShardSet};
