//! Heartbeat configuration
//!
//! Loaded from defaults, environment variables or JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardbeatError};
use crate::{DEFAULT_GROUP_TIMEOUT_SECS, DEFAULT_HEARTBEAT_INTERVAL_SECS};

/// Environment variable overriding the heartbeat interval
pub const ENV_HEARTBEAT_INTERVAL_SECS: &str = "SHARDBEAT_HEARTBEAT_INTERVAL_SECS";

/// Environment variable overriding the group timeout
pub const ENV_GROUP_TIMEOUT_SECS: &str = "SHARDBEAT_GROUP_TIMEOUT_SECS";

/// Configuration for the heartbeat loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Seconds between heartbeat ticks
    pub heartbeat_interval_secs: u64,
    /// Lease duration granted by the consumer group
    pub group_timeout_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            group_timeout_secs: DEFAULT_GROUP_TIMEOUT_SECS,
        }
    }
}

impl HeartbeatConfig {
    /// Create a configuration from explicit values
    pub fn new(heartbeat_interval_secs: u64, group_timeout_secs: u64) -> Self {
        Self {
            heartbeat_interval_secs,
            group_timeout_secs,
        }
    }

    /// Set the heartbeat interval
    pub fn with_heartbeat_interval_secs(mut self, secs: u64) -> Self {
        self.heartbeat_interval_secs = secs;
        self
    }

    /// Set the group timeout
    pub fn with_group_timeout_secs(mut self, secs: u64) -> Self {
        self.group_timeout_secs = secs;
        self
    }

    /// Tick period
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Lease duration
    pub fn group_timeout(&self) -> Duration {
        Duration::from_secs(self.group_timeout_secs)
    }

    /// Time without a successful heartbeat after which held shards are dropped
    ///
    /// Saturates, so an effectively unbounded timeout never expires.
    pub fn lease_expiry(&self) -> Duration {
        self.group_timeout().saturating_add(self.heartbeat_interval())
    }

    /// Check that the values can drive a heartbeat loop
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ShardbeatError::InvalidConfig {
                reason: "heartbeat_interval_secs must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Defaults overridden by `SHARDBEAT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(secs) = env_secs(ENV_HEARTBEAT_INTERVAL_SECS)? {
            config.heartbeat_interval_secs = secs;
        }
        if let Some(secs) = env_secs(ENV_GROUP_TIMEOUT_SECS)? {
            config.group_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn env_secs(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ShardbeatError::InvalidConfig {
                reason: format!("{}={:?}: {}", name, raw, e),
            }),
        Err(_) => Ok(None),
    }
}
