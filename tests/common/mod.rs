//! Shared test doubles for the heartbeat tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shardbeat_core::{RemoteCoordinator, Result, ShardId, ShardSet, ShardbeatError};
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

/// Canned reply from the scripted coordinator
#[derive(Debug, Clone)]
pub enum Reply {
    /// Grant exactly these shards
    Grant(ShardSet),
    /// Grant whatever was requested
    Echo,
    /// Transient failure
    Fail(String),
    /// Error carrying the group-not-exist marker in its message
    GroupMissing,
}

impl Reply {
    pub fn grant(ids: &[ShardId]) -> Self {
        Reply::Grant(set(ids))
    }

    fn into_result(self, request: &ShardSet) -> Result<ShardSet> {
        match self {
            Reply::Grant(granted) => Ok(granted),
            Reply::Echo => Ok(request.clone()),
            Reply::Fail(reason) => Err(ShardbeatError::ConnectionFailed {
                endpoint: "coordinator.test:443".into(),
                reason,
            }),
            Reply::GroupMissing => Err(ShardbeatError::Coordinator {
                code: "ConsumerGroupNotExist".into(),
                message: "ConsumerGroupNotExist: consumer group test-group does not exist".into(),
            }),
        }
    }
}

/// Coordinator that plays a script, then repeats a fallback reply
pub struct ScriptedCoordinator {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    latency: Duration,
    requests: Mutex<Vec<(Instant, ShardSet)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedCoordinator {
    pub fn new(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Simulated round-trip time for every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ShardSet> {
        self.requests.lock().iter().map(|(_, r)| r.clone()).collect()
    }

    /// Highest number of overlapping heartbeat calls seen
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn request_times(&self) -> Vec<Instant> {
        self.requests.lock().iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl RemoteCoordinator for ScriptedCoordinator {
    async fn heartbeat(&self, shards: &ShardSet) -> Result<ShardSet> {
        self.requests.lock().push((Instant::now(), shards.clone()));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let reply = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        reply.into_result(shards)
    }
}

pub fn set(ids: &[ShardId]) -> ShardSet {
    ids.iter().copied().collect()
}

/// Install a test-friendly subscriber once; RUST_LOG controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
