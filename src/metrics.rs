//! Prometheus metrics for the heartbeat loop
//!
//! Per-instance counters, gauges and a latency histogram, exported in the
//! Prometheus text format.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Name and help text shared by every series
struct Series {
    name: String,
    help: String,
}

impl Series {
    fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
        }
    }

    fn header(&self, kind: &str) -> String {
        format!(
            "# HELP {name} {help}\n# TYPE {name} {kind}\n",
            name = self.name,
            help = self.help,
            kind = kind
        )
    }

    fn sample(&self, kind: &str, value: impl std::fmt::Display) -> String {
        format!("{}{} {}\n", self.header(kind), self.name, value)
    }
}

/// Count of events since construction, e.g. heartbeats sent
pub struct Counter {
    series: Series,
    value: AtomicU64,
}

impl Counter {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            series: Series::new(name, help),
            value: AtomicU64::new(0),
        }
    }

    /// Record one event
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn to_prometheus(&self) -> String {
        self.series.sample("counter", self.get())
    }
}

/// Point-in-time level, e.g. number of held shards
pub struct Gauge {
    series: Series,
    value: AtomicI64,
}

impl Gauge {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            series: Series::new(name, help),
            value: AtomicI64::new(0),
        }
    }

    /// Overwrite the level
    pub fn set(&self, val: i64) {
        self.value.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn to_prometheus(&self) -> String {
        self.series.sample("gauge", self.get())
    }
}

/// Histogram for latency measurements
pub struct Histogram {
    series: Series,
    buckets: Vec<(f64, AtomicU64)>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Create with default buckets, tuned for RPC round-trips
    pub fn new(name: &str, help: &str) -> Self {
        Self::with_buckets(
            name,
            help,
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
        )
    }

    /// Create with custom buckets
    pub fn with_buckets(name: &str, help: &str, bounds: Vec<f64>) -> Self {
        let buckets = bounds
            .into_iter()
            .map(|b| (b, AtomicU64::new(0)))
            .collect();

        Self {
            series: Series::new(name, help),
            buckets,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Observe a value in seconds
    pub fn observe(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);

        // Sum kept as u64 micros
        let micros = (value * 1_000_000.0) as u64;
        self.sum.fetch_add(micros, Ordering::Relaxed);

        for (bound, count) in &self.buckets {
            if value <= *bound {
                count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Observe an elapsed duration
    pub fn observe_duration(&self, elapsed: Duration) {
        self.observe(elapsed.as_secs_f64());
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Format as Prometheus metric, buckets cumulative
    pub fn to_prometheus(&self) -> String {
        let name = &self.series.name;
        let mut output = self.series.header("histogram");

        let bounds = self
            .buckets
            .iter()
            .map(|(bound, count)| (bound.to_string(), count.load(Ordering::Relaxed)))
            .chain(std::iter::once(("+Inf".to_string(), self.count())));
        for (le, count) in bounds {
            output.push_str(&format!("{}_bucket{{le=\"{}\"}} {}\n", name, le, count));
        }

        let sum_secs = self.sum.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        output.push_str(&format!("{}_sum {}\n", name, sum_secs));
        output.push_str(&format!("{}_count {}\n", name, self.count()));

        output
    }
}

/// Metrics owned by one heartbeat coordinator
pub struct HeartbeatMetrics {
    /// Heartbeat RPCs issued
    pub heartbeats_sent: Counter,
    /// Heartbeat RPCs that returned an error
    pub heartbeat_failures: Counter,
    /// Held shards dropped after the lease expired
    pub lease_resets: Counter,
    /// Shards currently granted
    pub held_shards: Gauge,
    /// Shards in the last request
    pub proposed_shards: Gauge,
    /// Heartbeat RPC latency
    pub heartbeat_duration: Histogram,
}

impl HeartbeatMetrics {
    /// Create a zeroed metric set
    pub fn new() -> Self {
        Self {
            heartbeats_sent: Counter::new(
                "shardbeat_heartbeats_sent_total",
                "Total heartbeat requests sent",
            ),
            heartbeat_failures: Counter::new(
                "shardbeat_heartbeat_failures_total",
                "Total heartbeat requests that failed",
            ),
            lease_resets: Counter::new(
                "shardbeat_lease_resets_total",
                "Times held shards were dropped after heartbeat timeout",
            ),
            held_shards: Gauge::new("shardbeat_held_shards", "Shards granted to this consumer"),
            proposed_shards: Gauge::new(
                "shardbeat_proposed_shards",
                "Shards requested in the last heartbeat",
            ),
            heartbeat_duration: Histogram::new(
                "shardbeat_heartbeat_duration_seconds",
                "Heartbeat round-trip latency",
            ),
        }
    }

    /// Export all metrics in Prometheus format
    pub fn export(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.heartbeats_sent.to_prometheus());
        output.push_str(&self.heartbeat_failures.to_prometheus());
        output.push_str(&self.lease_resets.to_prometheus());

        output.push_str(&self.held_shards.to_prometheus());
        output.push_str(&self.proposed_shards.to_prometheus());

        output.push_str(&self.heartbeat_duration.to_prometheus());

        output
    }
}

impl Default for HeartbeatMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new("test_counter", "Test counter");
        assert_eq!(counter.get(), 0);

        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_gauge() {
        let gauge = Gauge::new("test_gauge", "Test gauge");
        gauge.set(10);
        assert_eq!(gauge.get(), 10);
        gauge.set(3);
        assert_eq!(gauge.get(), 3);
    }

    #[test]
    fn test_histogram() {
        let histogram = Histogram::new("test_histogram", "Test histogram");

        histogram.observe(0.001);
        histogram.observe_duration(Duration::from_millis(20));
        histogram.observe(60.0);

        let prometheus = histogram.to_prometheus();
        assert!(prometheus.contains("test_histogram_count 3"));
        assert!(prometheus.contains("test_histogram_bucket{le=\"0.005\"} 1"));
        assert!(prometheus.contains("test_histogram_bucket{le=\"+Inf\"} 3"));
    }

    #[test]
    fn test_export_contains_all_series() {
        let metrics = HeartbeatMetrics::new();
        metrics.heartbeats_sent.inc();
        metrics.held_shards.set(4);

        let text = metrics.export();
        assert!(text.contains("shardbeat_heartbeats_sent_total 1"));
        assert!(text.contains("shardbeat_held_shards 4"));
        assert!(text.contains("shardbeat_heartbeat_duration_seconds_count 0"));
    }
}
