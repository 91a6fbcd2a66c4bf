//! Shard lease heartbeat
//!
//! Background loop that announces the shards this consumer wants to own,
//! adopts whatever the coordinator grants, and drops held shards locally
//! once the lease can no longer have been renewed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::config::HeartbeatConfig;
use super::remote::RemoteCoordinator;
use super::shard_set::{self, ShardDiff, ShardId, ShardSet};
use crate::error::{Result, ShardbeatError};
use crate::metrics::HeartbeatMetrics;
use crate::runtime::{Clock, ShutdownSignal, SystemClock};

/// Fatal condition reported to the owning process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalSignal {
    /// No fatal condition observed
    Healthy,
    /// The consumer group was deleted on the coordinator
    GroupNotExist,
}

/// Result of one heartbeat cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Coordinator answered; held shards now equal the grant
    Granted {
        held: Arc<ShardSet>,
        diff: ShardDiff,
    },
    /// Heartbeat failed; `lease_reset` is set when held shards were dropped
    Failed { lease_reset: bool },
    /// Consumer group is gone and the loop is stopping
    GroupNotExist,
}

/// Published shard sets, replaced wholesale on every write
struct ShardState {
    proposed: Arc<ShardSet>,
    held: Arc<ShardSet>,
}

/// Clears the running flag when the loop exits or its task is dropped
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client side of the consumer-group shard lease
///
/// `run` (or `spawn`) drives the heartbeat; worker-management code reads
/// the shard sets from any thread.
pub struct HeartbeatCoordinator {
    remote: Arc<dyn RemoteCoordinator>,
    config: HeartbeatConfig,
    clock: Arc<dyn Clock>,
    shards: RwLock<ShardState>,
    last_success: Mutex<Instant>,
    group_missing: AtomicBool,
    shutdown: ShutdownSignal,
    running: AtomicBool,
    /// Held for a whole cycle so only one heartbeat is ever in flight
    cycle: AsyncMutex<()>,
    metrics: HeartbeatMetrics,
}

impl HeartbeatCoordinator {
    /// Create a heartbeat coordinator using the tokio clock
    pub fn new(remote: Arc<dyn RemoteCoordinator>, config: HeartbeatConfig) -> Result<Self> {
        Self::with_clock(remote, config, Arc::new(SystemClock))
    }

    /// Create a heartbeat coordinator with an explicit time source
    pub fn with_clock(
        remote: Arc<dyn RemoteCoordinator>,
        config: HeartbeatConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let now = clock.now();

        Ok(Self {
            remote,
            config,
            clock,
            shards: RwLock::new(ShardState {
                proposed: Arc::new(ShardSet::new()),
                held: Arc::new(ShardSet::new()),
            }),
            last_success: Mutex::new(now),
            group_missing: AtomicBool::new(false),
            shutdown: ShutdownSignal::new(),
            running: AtomicBool::new(false),
            cycle: AsyncMutex::new(()),
            metrics: HeartbeatMetrics::new(),
        })
    }

    /// Shards the coordinator last granted to this consumer
    pub fn held_shards(&self) -> Arc<ShardSet> {
        self.shards.read().held.clone()
    }

    /// Shards requested on the next heartbeat
    pub fn proposed_shards(&self) -> Arc<ShardSet> {
        self.shards.read().proposed.clone()
    }

    /// Stop requesting a shard that this consumer is releasing.
    ///
    /// Returns whether the shard was in the request set. Held shards are
    /// left alone; they fall away when the coordinator stops granting them.
    pub fn remove_heart_shard(&self, shard_id: ShardId) -> bool {
        let mut shards = self.shards.write();
        if !shards.proposed.contains(&shard_id) {
            return false;
        }
        Arc::make_mut(&mut shards.proposed).remove(&shard_id);
        debug!("Removed shard {} from heartbeat request", shard_id);
        true
    }

    /// Ask the loop to stop after the current cycle
    pub fn request_shutdown(&self) {
        if self.shutdown.trigger() {
            info!("Try to stop heartbeat");
        }
    }

    /// Whether shutdown has been requested, by the owner or by a fatal error
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Handle on the shutdown flag, for owners that want to await it
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Fatal state, to be polled by the owning process
    pub fn terminal_signal(&self) -> TerminalSignal {
        if self.group_missing.load(Ordering::Acquire) {
            TerminalSignal::GroupNotExist
        } else {
            TerminalSignal::Healthy
        }
    }

    /// True once a fatal condition was observed
    pub fn is_fatal(&self) -> bool {
        self.terminal_signal() != TerminalSignal::Healthy
    }

    /// Time since the last successful heartbeat (or since construction)
    pub fn last_success_elapsed(&self) -> Duration {
        self.clock.now().duration_since(*self.last_success.lock())
    }

    /// Configuration in use
    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    /// Heartbeat metrics
    pub fn metrics(&self) -> &HeartbeatMetrics {
        &self.metrics
    }

    /// Run the heartbeat loop on a new tokio task
    pub fn spawn(self: Arc<Self>) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run the heartbeat loop until shutdown is requested.
    ///
    /// Only one loop may run per instance so that at most one heartbeat is
    /// in flight.
    pub async fn run(&self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ShardbeatError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        let interval = self.config.heartbeat_interval();
        info!(
            "Heartbeat started (interval={}s, group timeout={}s)",
            self.config.heartbeat_interval_secs, self.config.group_timeout_secs
        );

        while !self.shutdown.is_triggered() {
            let tick_start = self.clock.now();
            self.tick().await;

            if self.shutdown.is_triggered() {
                break;
            }

            // Long RPCs eat into the sleep; an overrun ticks again at once
            let elapsed = self.clock.now().duration_since(tick_start);
            let remaining = interval.saturating_sub(elapsed);
            if !remaining.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(remaining) => {}
                    _ = self.shutdown.wait() => {}
                }
            }
        }

        info!("Heartbeat exited");
        Ok(())
    }

    /// Run one heartbeat cycle without sleeping.
    ///
    /// Folds held shards into the request, sends it, and applies the
    /// response. Errors never escape; they are reflected in the outcome,
    /// the held set and the terminal signal. A call made while another
    /// cycle is in flight (including the background loop's) waits for it
    /// to finish first.
    pub async fn tick(&self) -> TickOutcome {
        let _cycle = self.cycle.lock().await;

        let request = {
            let mut shards = self.shards.write();
            let folded = shard_set::union(&shards.proposed, &shards.held);
            // The union is a superset, so equal length means unchanged
            if folded.len() != shards.proposed.len() {
                shards.proposed = Arc::new(folded);
            }
            shards.proposed.clone()
        };

        self.metrics.proposed_shards.set(request.len() as i64);
        self.metrics.heartbeats_sent.inc();

        let started = self.clock.now();
        let response = self.remote.heartbeat(&request).await;
        self.metrics
            .heartbeat_duration
            .observe_duration(self.clock.now().duration_since(started));

        match response {
            Ok(granted) => self.apply_grant(granted),
            Err(e) => self.handle_failure(e),
        }
    }

    fn apply_grant(&self, granted: ShardSet) -> TickOutcome {
        *self.last_success.lock() = self.clock.now();

        let granted = Arc::new(granted);
        let proposed = {
            let mut shards = self.shards.write();
            shards.held = granted.clone();
            shards.proposed.clone()
        };
        self.metrics.held_shards.set(granted.len() as i64);

        debug!(proposed = ?proposed, granted = ?granted, "Heartbeat result");

        let diff = ShardDiff::between(&proposed, &granted);
        if !shard_set::same_members(proposed.iter(), granted.iter()) {
            info!(added = ?diff.added, removed = ?diff.removed, "Shard reorganize");
        }

        TickOutcome::Granted {
            held: granted,
            diff,
        }
    }

    fn handle_failure(&self, err: ShardbeatError) -> TickOutcome {
        self.metrics.heartbeat_failures.inc();
        warn!(error = %err, "Send heartbeat error");

        if err.is_group_not_exist() {
            error!(error = %err, "Consumer group does not exist, stopping heartbeat");
            self.group_missing.store(true, Ordering::Release);
            self.shutdown.trigger();
            return TickOutcome::GroupNotExist;
        }

        let since_success = self.last_success_elapsed();
        if since_success <= self.config.lease_expiry() {
            return TickOutcome::Failed { lease_reset: false };
        }

        let dropped = {
            let mut shards = self.shards.write();
            std::mem::replace(&mut shards.held, Arc::new(ShardSet::new()))
        };
        self.metrics.held_shards.set(0);
        if !dropped.is_empty() {
            self.metrics.lease_resets.inc();
        }
        error!(
            dropped = ?dropped,
            "Heartbeat timeout after {}s, automatic reset of held shards",
            since_success.as_secs()
        );

        TickOutcome::Failed { lease_reset: true }
    }
}
