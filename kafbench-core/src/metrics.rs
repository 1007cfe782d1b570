//! Run metrics: shared counters, latency samples, and percentile math.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// P50/P95/P99 latency triple in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// Median latency
    pub p50: f64,
    /// 95th percentile latency
    pub p95: f64,
    /// 99th percentile latency
    pub p99: f64,
}

/// Point-in-time view of a [`Summary`], taken after all workload tasks have
/// joined.
#[derive(Debug, Clone, Default)]
pub struct SummarySnapshot {
    /// Messages acknowledged by the broker
    pub produced: u64,
    /// Records received
    pub consumed: u64,
    /// Failures recorded across all phases
    pub errors: u64,
    /// Send acknowledgement latency
    pub produce: Percentiles,
    /// End-to-end record latency
    pub consume: Percentiles,
    /// Poll round-trip latency
    pub consume_poll: Percentiles,
}

/// Shared aggregation state for one scenario run.
///
/// Mutated by every producer worker and the consumer task under a single
/// mutex; read for percentiles only once the run has finished. A summary
/// belongs to exactly one run and is never reused.
#[derive(Debug, Default)]
pub struct Summary {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    produced: u64,
    consumed: u64,
    errors: u64,
    produce_latencies: Vec<Duration>,
    consume_latencies: Vec<Duration>,
    consume_poll_latencies: Vec<Duration>,
}

impl Summary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one acknowledged send. Zero latencies contribute no sample.
    pub fn add_produce(&self, latency: Duration) {
        let mut inner = self.inner.lock();
        inner.produced += 1;
        if latency > Duration::ZERO {
            inner.produce_latencies.push(latency);
        }
    }

    /// Counts one received record with its end-to-end latency.
    pub fn add_consume(&self, latency: Duration) {
        let mut inner = self.inner.lock();
        inner.consumed += 1;
        if latency > Duration::ZERO {
            inner.consume_latencies.push(latency);
        }
    }

    /// Records the poll round-trip that delivered a record.
    pub fn add_consume_poll(&self, latency: Duration) {
        if latency > Duration::ZERO {
            self.inner.lock().consume_poll_latencies.push(latency);
        }
    }

    /// Counts one failure from any phase.
    pub fn add_error(&self) {
        self.inner.lock().errors += 1;
    }

    /// Messages produced so far.
    pub fn produced(&self) -> u64 {
        self.inner.lock().produced
    }

    /// Records consumed so far.
    pub fn consumed(&self) -> u64 {
        self.inner.lock().consumed
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> u64 {
        self.inner.lock().errors
    }

    /// Takes one locked snapshot with all three percentile triples computed.
    pub fn snapshot(&self) -> SummarySnapshot {
        let inner = self.inner.lock();
        SummarySnapshot {
            produced: inner.produced,
            consumed: inner.consumed,
            errors: inner.errors,
            produce: latency_percentiles(&inner.produce_latencies),
            consume: latency_percentiles(&inner.consume_latencies),
            consume_poll: latency_percentiles(&inner.consume_poll_latencies),
        }
    }
}

/// Computes the P50/P95/P99 triple over an unordered set of latency samples.
///
/// Samples are reduced to whole milliseconds and sorted; percentiles
/// interpolate linearly between order statistics. An empty set yields all
/// zeros, never an error.
pub fn latency_percentiles(samples: &[Duration]) -> Percentiles {
    if samples.is_empty() {
        return Percentiles::default();
    }
    let mut values: Vec<f64> = samples.iter().map(|d| d.as_millis() as f64).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    Percentiles {
        p50: percentile(&values, 0.50),
        p95: percentile(&values, 0.95),
        p99: percentile(&values, 0.99),
    }
}

fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    if p <= 0.0 {
        return values[0];
    }
    if p >= 1.0 {
        return values[values.len() - 1];
    }
    let pos = p * (values.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let frac = pos - lower as f64;
    values[lower] + (values[upper] - values[lower]) * frac
}
