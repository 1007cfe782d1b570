//! # Kafbench Harness
//!
//! Broker-facing half of kafbench: the engine that executes one scenario
//! against a Kafka-compatible cluster, the suite orchestrator that sweeps a
//! directory of scenarios across connection profiles, and the artifact
//! writer that lands JSON summaries and reports on disk.
//!
//! ## Architecture
//!
//! - [`engine`]: connectivity probe, topic provisioning, producer workers,
//!   polling consumer, and metrics probe for one run
//! - [`suite`]: validate/verify/execute over a suite directory, with the
//!   integrity ledger
//! - [`report`]: `summary.json` / `suite.json` / `report.json` artifacts

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod report;
pub mod suite;

pub use engine::{Engine, RunOptions};
pub use suite::{SuiteOutcome, SuiteRunner};

/// Timestamp layout of run identifiers.
pub const RUN_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Mints the identifier naming a suite invocation's artifacts. Individual
/// runs do not use this: each [`Engine`](engine::Engine) run derives its own
/// id from its own start instant, and that per-run id is what `{{run_id}}`
/// tokens in a scenario resolve to.
pub fn generate_run_id() -> String {
    chrono::Utc::now().format(RUN_ID_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_sortable_timestamps() {
        let run_id = generate_run_id();
        assert_eq!(run_id.len(), 15);
        let (date, time) = run_id.split_at(8);
        assert!(date.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(&time[..1], "-");
        assert!(time[1..].chars().all(|c| c.is_ascii_digit()));
    }
}
