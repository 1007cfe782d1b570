//! Finalized run results and the overall status fold.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checks::CheckOutcome;
use crate::metrics::Percentiles;

/// Outcome of the pre-run broker reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityStatus {
    /// At least one broker accepted a TCP connection
    Ok,
    /// No broker was reachable
    Fail,
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityStatus::Ok => write!(f, "ok"),
            ConnectivityStatus::Fail => write!(f, "fail"),
        }
    }
}

/// Overall verdict of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every phase completed and every check passed
    Pass,
    /// A phase failed, a check missed, or errors were recorded
    Fail,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pass => write!(f, "pass"),
            RunStatus::Fail => write!(f, "fail"),
        }
    }
}

/// Immutable snapshot of one engine run, serialized as `summary.json` and
/// embedded in suite output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Scenario display name
    pub name: String,
    /// Scenario description
    pub description: String,
    /// Identifier minted at run start
    pub run_id: String,
    /// Profile id the run executed under, if any
    pub profile: String,
    /// Resolved profile display name
    pub profile_name: String,
    /// Resolved profile description
    pub profile_description: String,
    /// Path of the profile file used
    pub profile_source: String,
    /// Metrics URL carried by the profile
    pub profile_metrics_url: String,
    /// Brokers the run targeted
    pub brokers: Vec<String>,
    /// Wall-clock run start
    pub started_at: DateTime<Utc>,
    /// Total run duration
    pub duration_ms: u64,
    /// Broker reachability verdict
    pub connectivity_status: ConnectivityStatus,
    /// Dial failure detail when connectivity failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity_error: Option<String>,
    /// Fatal phase error, if one stopped the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_error: Option<String>,
    /// Messages acknowledged by the broker
    pub produced: u64,
    /// Records received
    pub consumed: u64,
    /// Failures recorded across all phases
    pub errors: u64,
    /// Send acknowledgement latency
    pub produce_latency_ms: Percentiles,
    /// End-to-end record latency
    pub consume_latency_ms: Percentiles,
    /// Poll round-trip latency
    pub consume_poll_latency_ms: Percentiles,
    /// Outcome per declared check
    pub checks: BTreeMap<String, CheckOutcome>,
    /// Overall verdict
    pub status: RunStatus,
}

/// Folds the run's observations into a single verdict, checked in order:
/// fatal phase error, any non-passing check, a non-zero error counter, then
/// connectivity.
pub fn overall_status(
    run_error: Option<&str>,
    checks: &BTreeMap<String, CheckOutcome>,
    errors: u64,
    connectivity: ConnectivityStatus,
) -> RunStatus {
    if run_error.is_some() {
        return RunStatus::Fail;
    }
    if checks.values().any(|outcome| *outcome != CheckOutcome::Pass) {
        return RunStatus::Fail;
    }
    if errors > 0 {
        return RunStatus::Fail;
    }
    if connectivity != ConnectivityStatus::Ok {
        return RunStatus::Fail;
    }
    RunStatus::Pass
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks(outcomes: &[(&str, CheckOutcome)]) -> BTreeMap<String, CheckOutcome> {
        outcomes
            .iter()
            .map(|(name, outcome)| (name.to_string(), *outcome))
            .collect()
    }

    #[test]
    fn clean_run_passes() {
        let status = overall_status(
            None,
            &checks(&[("all", CheckOutcome::Pass)]),
            0,
            ConnectivityStatus::Ok,
        );
        assert_eq!(status, RunStatus::Pass);
    }

    #[test]
    fn fatal_error_dominates() {
        let status = overall_status(
            Some("consume timeout: got 0 of 5"),
            &checks(&[("all", CheckOutcome::Pass)]),
            0,
            ConnectivityStatus::Ok,
        );
        assert_eq!(status, RunStatus::Fail);
    }

    #[test]
    fn any_non_passing_check_fails() {
        for outcome in [CheckOutcome::Fail, CheckOutcome::Skip] {
            let status = overall_status(
                None,
                &checks(&[("good", CheckOutcome::Pass), ("other", outcome)]),
                0,
                ConnectivityStatus::Ok,
            );
            assert_eq!(status, RunStatus::Fail);
        }
    }

    #[test]
    fn nonzero_error_counter_fails() {
        let status = overall_status(None, &BTreeMap::new(), 1, ConnectivityStatus::Ok);
        assert_eq!(status, RunStatus::Fail);
    }

    #[test]
    fn failed_connectivity_fails() {
        let status = overall_status(None, &BTreeMap::new(), 0, ConnectivityStatus::Fail);
        assert_eq!(status, RunStatus::Fail);
    }

    #[test]
    fn absent_errors_are_omitted_from_json() {
        let result = RunResult {
            name: "smoke".to_string(),
            description: String::new(),
            run_id: "20260825-120000".to_string(),
            profile: String::new(),
            profile_name: String::new(),
            profile_description: String::new(),
            profile_source: String::new(),
            profile_metrics_url: String::new(),
            brokers: vec!["127.0.0.1:9092".to_string()],
            started_at: Utc::now(),
            duration_ms: 42,
            connectivity_status: ConnectivityStatus::Ok,
            connectivity_error: None,
            run_error: None,
            produced: 10,
            consumed: 10,
            errors: 0,
            produce_latency_ms: Percentiles::default(),
            consume_latency_ms: Percentiles::default(),
            consume_poll_latency_ms: Percentiles::default(),
            checks: BTreeMap::new(),
            status: RunStatus::Pass,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("run_error"));
        assert!(!json.contains("connectivity_error"));
        assert!(json.contains(r#""connectivity_status":"ok""#));
        assert!(json.contains(r#""status":"pass""#));
    }
}
