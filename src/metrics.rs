//! Prediction cycle statistics.

use crate::types::report::PredictionStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile estimates
const LATENCY_WINDOW: usize = 10_000;

/// Counters and latency samples for prediction cycles
pub struct PredictionMetrics {
    /// Cycles run, whatever the outcome
    pub cycles: AtomicU64,
    pub successes: AtomicU64,
    pub unrealistic: AtomicU64,
    pub prediction_failures: AtomicU64,
    pub load_failures: AtomicU64,
    pub invalid_inputs: AtomicU64,
    /// Cycle durations (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Cycles per project name
    by_project: RwLock<BTreeMap<String, u64>>,
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            unrealistic: AtomicU64::new(0),
            prediction_failures: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            invalid_inputs: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            by_project: RwLock::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one finished prediction cycle
    pub fn record_cycle(&self, project: &str, status: PredictionStatus, elapsed: Duration) {
        self.cycles.fetch_add(1, Ordering::Relaxed);

        let counter = match status {
            PredictionStatus::Success => &self.successes,
            PredictionStatus::Unrealistic => &self.unrealistic,
            PredictionStatus::PredictionFailed => &self.prediction_failures,
            PredictionStatus::LoadFailed => &self.load_failures,
            PredictionStatus::InvalidInput => &self.invalid_inputs,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.latencies.write() {
            times.push(elapsed.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }

        if let Ok(mut by_project) = self.by_project.write() {
            *by_project.entry(project.to_string()).or_insert(0) += 1;
        }
    }

    /// Latency percentiles over the retained window
    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            cycles: self.cycles.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            unrealistic: self.unrealistic.load(Ordering::Relaxed),
            prediction_failures: self.prediction_failures.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            invalid_inputs: self.invalid_inputs.load(Ordering::Relaxed),
            by_project: self
                .by_project
                .read()
                .map(|m| m.clone())
                .unwrap_or_default(),
            latency: self.latency_stats(),
        }
    }

    /// Log a summary of everything recorded so far
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let warn_rate = if snapshot.cycles > 0 {
            (snapshot.unrealistic as f64 / snapshot.cycles as f64) * 100.0
        } else {
            0.0
        };

        info!(
            cycles = snapshot.cycles,
            successes = snapshot.successes,
            unrealistic = snapshot.unrealistic,
            warn_rate = format!("{:.1}%", warn_rate),
            prediction_failures = snapshot.prediction_failures,
            load_failures = snapshot.load_failures,
            invalid_inputs = snapshot.invalid_inputs,
            "Prediction summary"
        );
        info!(
            mean_us = snapshot.latency.mean_us,
            p50_us = snapshot.latency.p50_us,
            p95_us = snapshot.latency.p95_us,
            p99_us = snapshot.latency.p99_us,
            "Cycle latency"
        );
        for (project, count) in &snapshot.by_project {
            info!(project = %project, cycles = count, "Project usage");
        }
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Cycle latency statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub cycles: u64,
    pub successes: u64,
    pub unrealistic: u64,
    pub prediction_failures: u64,
    pub load_failures: u64,
    pub invalid_inputs: u64,
    pub by_project: BTreeMap<String, u64>,
    pub latency: LatencyStats,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately; nothing to report yet
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
