//! Error types for shardbeat
//!
//! Errors returned by the remote coordinator and by local configuration
//! and runtime checks.

use thiserror::Error;

/// Marker the coordinator puts in error messages when the consumer group
/// has been deleted.
pub const GROUP_NOT_EXIST_MARKER: &str = "ConsumerGroupNotExist";

/// Primary error type for all shardbeat operations
///
/// The coordination variants are the vocabulary for
/// [`RemoteCoordinator`](crate::consumer::RemoteCoordinator) implementations:
/// the heartbeat loop never builds them itself, it only classifies them.
#[derive(Debug, Error)]
pub enum ShardbeatError {
    // ========== Coordination Errors ==========

    /// Consumer group no longer exists on the coordinator
    #[error("ConsumerGroupNotExist: consumer group {group} does not exist")]
    GroupNotExist { group: String },

    /// Coordinator rejected the heartbeat
    #[error("Coordinator error {code}: {message}")]
    Coordinator { code: String, message: String },

    /// Connection failed
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Heartbeat RPC timed out inside the transport (RPC deadlines are the
    /// transport's job, not the heartbeat loop's)
    #[error("Heartbeat request timed out after {elapsed_ms}ms")]
    RequestTimeout { elapsed_ms: u64 },

    // ========== Configuration Errors ==========

    /// Configuration value out of range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Configuration could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    // ========== Runtime Errors ==========

    /// The heartbeat loop is already running on this instance
    #[error("Heartbeat loop already running")]
    AlreadyRunning,

    /// Transport failure that fits no other variant
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ShardbeatError {
    /// Returns true if the consumer group is gone.
    ///
    /// Transports that cannot map the coordinator's error code to
    /// [`ShardbeatError::GroupNotExist`] are still recognised by the marker
    /// in their message.
    pub fn is_group_not_exist(&self) -> bool {
        match self {
            ShardbeatError::GroupNotExist { .. } => true,
            other => other.to_string().contains(GROUP_NOT_EXIST_MARKER),
        }
    }

    /// Returns true if the heartbeat loop should keep retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ShardbeatError::Coordinator { .. }
            | ShardbeatError::ConnectionFailed { .. }
            | ShardbeatError::RequestTimeout { .. }
            | ShardbeatError::Internal { .. } => !self.is_group_not_exist(),
            _ => false,
        }
    }
}

/// Result type alias for shardbeat operations
pub type Result<T> = std::result::Result<T, ShardbeatError>;
