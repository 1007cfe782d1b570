//! # Kafbench Core
//!
//! Scenario model, metrics aggregation, and reporting primitives for the
//! kafbench workload harness.
//!
//! This crate is deliberately free of networking: it defines what a scenario
//! *is* (topics, workloads, checks, profiles), how latency observations fold
//! into percentile summaries, and how finished runs aggregate into reports.
//! The `kafbench-harness` crate drives brokers with these types.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use kafbench_core::{evaluate_checks, CheckKind, CheckMetric, CheckOutcome, CheckSpec, Summary};
//!
//! let summary = Summary::new();
//! summary.add_produce(Duration::from_millis(3));
//! summary.add_consume(Duration::from_millis(7));
//!
//! let checks = [CheckSpec {
//!     name: "all_consumed".to_string(),
//!     kind: CheckKind::CountEquals,
//!     metric: CheckMetric::Consumed,
//!     expected: 1,
//! }];
//! let outcomes = evaluate_checks(&checks, summary.produced(), summary.consumed());
//! assert_eq!(outcomes["all_consumed"], CheckOutcome::Pass);
//! ```
//!
//! ## Architecture
//!
//! - [`scenario`]: scenario files, workloads, and profile resolution
//! - [`profile`]: named broker environments shared across scenarios
//! - [`metrics`]: concurrent run summary and percentile math
//! - [`checks`]: declarative post-run assertions
//! - [`result`]: the finalized per-run snapshot
//! - [`report`]: profile-grouped report assembly
//! - [`error`]: error types and result handling

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checks;
pub mod error;
pub mod metrics;
pub mod profile;
pub mod report;
pub mod result;
pub mod scenario;

pub use crate::{
    checks::{evaluate_checks, CheckKind, CheckMetric, CheckOutcome, CheckSpec},
    error::{Error, Result},
    metrics::{latency_percentiles, Percentiles, Summary, SummarySnapshot},
    report::{build_report_data, ProfileSection, ReportConnectivity, ReportData, ReportStatus},
    result::{overall_status, ConnectivityStatus, RunResult, RunStatus},
    scenario::{ScenarioCollection, ScenarioSpec, TopicSpec},
};
