// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-client operation metrics.
//!
//! Counts lifecycle events and keeps per-operation-name duration stats with a
//! fixed-bucket latency histogram. Each [`crate::TelemetryClient`] owns one
//! [`ClientMetrics`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Operation name used for items that were started without one.
pub const UNNAMED_OPERATION: &str = "<unnamed>";

/// Bucket for names seen after the per-name limit was reached.
pub const OTHER_OPERATIONS: &str = "<other>";

/// Default number of distinct operation names tracked per client.
pub const DEFAULT_OPERATION_LIMIT: usize = 256;

/// Lifecycle counters and duration stats for one client.
#[derive(Debug)]
pub struct ClientMetrics {
    started: AtomicU64,
    completed: AtomicU64,
    submitted: AtomicU64,
    null_stops: AtomicU64,
    unwound_skips: AtomicU64,
    unscoped_starts: AtomicU64,
    operations: RwLock<BTreeMap<String, OperationStats>>,
    operation_limit: usize,
    start_time: Instant,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::with_operation_limit(DEFAULT_OPERATION_LIMIT)
    }

    /// Track at most `limit` distinct operation names; later names are
    /// folded into [`OTHER_OPERATIONS`].
    pub fn with_operation_limit(limit: usize) -> Self {
        Self {
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            submitted: AtomicU64::new(0),
            null_stops: AtomicU64::new(0),
            unwound_skips: AtomicU64::new(0),
            unscoped_starts: AtomicU64::new(0),
            operations: RwLock::new(BTreeMap::new()),
            operation_limit: limit,
            start_time: Instant::now(),
        }
    }

    pub fn record_start(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed operation and its duration.
    pub fn record_completion(&self, name: Option<&str>, duration: Duration) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        let mut operations = self
            .operations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let name = name.unwrap_or(UNNAMED_OPERATION);
        let key = if operations.contains_key(name) || operations.len() < self.operation_limit {
            name
        } else {
            OTHER_OPERATIONS
        };
        operations.entry(key.to_string()).or_default().record(duration);
    }

    pub fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_null_stop(&self) {
        self.null_stops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stop that left the store alone because the chain had already
    /// been unwound past the stopping operation.
    pub fn record_unwound_skip(&self) {
        self.unwound_skips.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a start that could not publish its snapshot because the
    /// caller had no context scope.
    pub fn record_unscoped_start(&self) {
        self.unscoped_starts.fetch_add(1, Ordering::Relaxed);
    }

    /// Operations started but not yet completed.
    pub fn active(&self) -> u64 {
        self.started
            .load(Ordering::Relaxed)
            .saturating_sub(self.completed.load(Ordering::Relaxed))
    }

    /// Stats for a single operation name.
    pub fn operation_stats(&self, name: &str) -> Option<OperationStats> {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let operations = self
            .operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        MetricsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            null_stops: self.null_stops.load(Ordering::Relaxed),
            unwound_skips: self.unwound_skips.load(Ordering::Relaxed),
            unscoped_starts: self.unscoped_starts.load(Ordering::Relaxed),
            operations,
            uptime: self.start_time.elapsed(),
        }
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Duration stats for one operation name.
#[derive(Debug, Clone, Serialize)]
pub struct OperationStats {
    pub count: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub histogram: Histogram,
}

impl OperationStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }
}

impl Default for OperationStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple histogram with fixed buckets for latency tracking.
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    /// Bucket upper bounds in microseconds.
    buckets: Vec<u64>,

    /// Count per bucket, plus one overflow bucket.
    counts: Vec<u64>,
}

impl Histogram {
    /// Create a histogram with custom bucket boundaries (in microseconds).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    pub fn record(&mut self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        let bucket_idx = self
            .buckets
            .iter()
            .position(|&b| micros <= b)
            .unwrap_or(self.buckets.len());
        self.counts[bucket_idx] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Approximate percentile as the upper bound of the bucket it falls in.
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0u64;

        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let micros = if i < self.buckets.len() {
                    self.buckets[i]
                } else {
                    self.buckets.last().copied().unwrap_or(0) * 10
                };
                return Duration::from_micros(micros);
            }
        }

        Duration::ZERO
    }

    pub fn p50(&self) -> Duration {
        self.percentile(50.0)
    }

    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        // 100us, 1ms, 10ms, 100ms, 1s, 10s
        Self::with_buckets(vec![100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000])
    }
}

/// Point-in-time copy of a client's metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub started: u64,
    pub completed: u64,
    pub submitted: u64,
    pub null_stops: u64,
    pub unwound_skips: u64,
    pub unscoped_starts: u64,
    pub operations: BTreeMap<String, OperationStats>,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Operation Metrics ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));
        report.push_str(&format!(
            "Operations: {} started, {} completed, {} submitted\n",
            self.started, self.completed, self.submitted
        ));
        report.push_str(&format!(
            "Irregular stops: {} without operation, {} after unwind\n",
            self.null_stops, self.unwound_skips
        ));
        if self.unscoped_starts > 0 {
            report.push_str(&format!(
                "Unpublished starts (no context scope): {}\n",
                self.unscoped_starts
            ));
        }

        if !self.operations.is_empty() {
            report.push('\n');
            for (name, stats) in &self.operations {
                report.push_str(&format!(
                    "  {}: {} ops, avg {:.2?}, p99 {:.2?}\n",
                    name,
                    stats.count,
                    stats.avg_duration(),
                    stats.histogram.p99()
                ));
            }
        }

        report
    }
}
