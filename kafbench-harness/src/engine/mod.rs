//! The per-scenario workload engine.
//!
//! One [`Engine`] run executes a loaded scenario end to end: connectivity
//! probe, topic provisioning, producer workers, polling consumer, and the
//! metrics probe, in that order. Failures are folded into the returned
//! [`RunResult`] rather than raised, so a caller always gets a finalized
//! result with counters, percentiles, and check outcomes.

mod connectivity;
mod consumer;
mod payload;
mod probe;
mod producer;
mod topics;

pub use connectivity::CONNECT_TIMEOUT;
pub use consumer::{CLOSE_GRACE, IDLE_TIMEOUT, POLL_INTERVAL};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kafbench_core::checks::evaluate_checks;
use kafbench_core::error::Error;
use kafbench_core::metrics::Summary;
use kafbench_core::result::{overall_status, ConnectivityStatus, RunResult};
use kafbench_core::scenario::ScenarioSpec;
use tokio::time::Instant;
use tracing::{error, info};

/// Hard ceiling on one scenario run.
pub const RUN_DEADLINE: Duration = Duration::from_secs(120);
/// Pause after provisioning and before consuming, letting cluster state
/// settle.
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(2);

/// Per-run toggles threaded into every phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Emit periodic progress from workers.
    pub verbose: bool,
    /// Raise the broker client's internal log level.
    pub debug: bool,
}

/// Executes one loaded scenario.
pub struct Engine {
    spec: ScenarioSpec,
    options: RunOptions,
}

impl Engine {
    /// Pairs a loaded scenario with its run options.
    pub fn new(spec: ScenarioSpec, options: RunOptions) -> Self {
        Self { spec, options }
    }

    /// Runs the scenario to completion and finalizes a [`RunResult`].
    ///
    /// The run id is minted from the start instant; `{{run_id}}` tokens and
    /// the generated consumer group resolve against it, so concurrent or
    /// repeated runs never share topics or groups.
    ///
    /// A connectivity failure short-circuits every phase. A producer or
    /// provisioning failure skips the consumer and metrics phases; a
    /// consumer failure skips the metrics phase. Each phase failure bumps
    /// the error counter once and lands in `run_error`.
    pub async fn run(&self) -> RunResult {
        let started_at = Utc::now();
        let run_id = started_at.format(crate::RUN_ID_FORMAT).to_string();
        let started = Instant::now();
        let deadline = started + RUN_DEADLINE;
        let summary = Arc::new(Summary::new());
        let mut connectivity = ConnectivityStatus::Ok;
        let mut connectivity_error = None;
        let mut run_error: Option<String> = None;

        info!(
            scenario = %self.spec.name,
            %run_id,
            brokers = ?self.spec.brokers,
            "starting run"
        );

        match connectivity::probe_brokers(&self.spec.brokers).await {
            Ok(()) => {
                if let Some(workload) = &self.spec.scenarios.producer {
                    let provisioned = topics::ensure_topics(&self.spec, &run_id, deadline).await;
                    let phase = match provisioned {
                        Ok(()) => {
                            producer::run_producer(
                                &self.spec,
                                workload,
                                &summary,
                                &run_id,
                                deadline,
                                self.options,
                            )
                            .await
                        }
                        Err(err) => Err(err),
                    };
                    if let Err(err) = phase {
                        summary.add_error();
                        run_error = Some(err.to_string());
                        error!(error = %err, "producer phase failed");
                    }
                }
                if run_error.is_none() {
                    if let Some(workload) = &self.spec.scenarios.consumer {
                        if let Err(err) = consumer::run_consumer(
                            &self.spec,
                            workload,
                            &summary,
                            &run_id,
                            deadline,
                            self.options,
                        )
                        .await
                        {
                            summary.add_error();
                            run_error = Some(err.to_string());
                            error!(error = %err, "consumer phase failed");
                        }
                    }
                }
                if run_error.is_none() {
                    if let Some(workload) = &self.spec.scenarios.metrics {
                        if let Err(err) = probe::run_metrics_probe(&workload.url, deadline).await {
                            summary.add_error();
                            run_error = Some(err.to_string());
                            error!(error = %err, "metrics probe failed");
                        }
                    }
                }
            }
            Err(err) => {
                summary.add_error();
                connectivity = ConnectivityStatus::Fail;
                connectivity_error = Some(match &err {
                    Error::Connectivity { message } => message.clone(),
                    other => other.to_string(),
                });
                run_error = Some(err.to_string());
                error!(error = %err, "connectivity probe failed");
            }
        }

        let checks = evaluate_checks(&self.spec.checks, summary.produced(), summary.consumed());
        let snapshot = summary.snapshot();
        let status = overall_status(run_error.as_deref(), &checks, snapshot.errors, connectivity);
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            scenario = %self.spec.name,
            status = %status,
            produced = snapshot.produced,
            consumed = snapshot.consumed,
            errors = snapshot.errors,
            duration_ms,
            "run finished"
        );

        RunResult {
            name: self.spec.name.clone(),
            description: self.spec.description.clone(),
            run_id,
            profile: self.spec.profile.clone(),
            profile_name: self.spec.profile_name.clone(),
            profile_description: self.spec.profile_description.clone(),
            profile_source: self.spec.profile_source.clone(),
            profile_metrics_url: self.spec.profile_metrics_url.clone(),
            brokers: self.spec.brokers.clone(),
            started_at,
            duration_ms,
            connectivity_status: connectivity,
            connectivity_error,
            run_error,
            produced: snapshot.produced,
            consumed: snapshot.consumed,
            errors: snapshot.errors,
            produce_latency_ms: snapshot.produce,
            consume_latency_ms: snapshot.consume,
            consume_poll_latency_ms: snapshot.consume_poll,
            checks,
            status,
        }
    }
}
