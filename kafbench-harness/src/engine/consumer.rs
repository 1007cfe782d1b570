//! Polling consumer workload with deadline and idle discipline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kafbench_core::error::{Error, Result};
use kafbench_core::metrics::Summary;
use kafbench_core::scenario::{self, ConsumerWorkload, ScenarioSpec};
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::BorrowedMessage;
use rdkafka::Message;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{RunOptions, SETTLE_INTERVAL};

/// Rolling deadline reset on every received record.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(15);
/// Upper bound on a single poll.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Bound on the blocking client teardown.
pub const CLOSE_GRACE: Duration = Duration::from_secs(3);

/// Poll loop states. The loop re-enters `Polling` until one of the terminal
/// states is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Polling,
    Draining,
    TimedOut,
    Idle,
    Failed,
}

/// Terminal-state evaluation, in priority order: a reached limit beats an
/// expired overall deadline, which beats an expired idle deadline.
fn next_state(consumed: u64, limit: u64, now: Instant, overall: Instant, idle: Instant) -> PollState {
    if consumed >= limit {
        return PollState::Draining;
    }
    if now >= overall {
        return PollState::TimedOut;
    }
    if now >= idle {
        return PollState::Idle;
    }
    PollState::Polling
}

/// Age of a record relative to its broker timestamp. Records without a
/// timestamp, or timestamped in the future, age zero.
fn record_age(message: &BorrowedMessage<'_>) -> Duration {
    let Some(broker_ms) = message.timestamp().to_millis() else {
        return Duration::ZERO;
    };
    let age_ms = Utc::now().timestamp_millis() - broker_ms;
    if age_ms > 0 {
        Duration::from_millis(age_ms as u64)
    } else {
        Duration::ZERO
    }
}

/// Drives a single polling consumer until it drains the configured limit,
/// times out, goes idle, or hits a fetch error.
pub async fn run_consumer(
    spec: &ScenarioSpec,
    workload: &ConsumerWorkload,
    summary: &Arc<Summary>,
    run_id: &str,
    deadline: Instant,
    options: RunOptions,
) -> Result<()> {
    tokio::time::sleep(SETTLE_INTERVAL).await;

    let topic = scenario::resolve_topic(&workload.topic, &spec.topics, run_id);
    if topic.is_empty() {
        return Err(Error::Config {
            message: "consumer topic is required".to_string(),
        });
    }
    let group = scenario::resolved_group_id(&workload.group.id, run_id);
    let limit = workload.message_limit();
    if workload.client_count() > 1 {
        debug!(
            clients = workload.client_count(),
            "consumer runs a single polling task"
        );
    }

    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", spec.brokers.join(","))
        .set("group.id", &group)
        .set("enable.auto.commit", "true");
    if workload.starts_earliest() {
        config.set("auto.offset.reset", "earliest");
    }
    if options.debug {
        config.set_log_level(RDKafkaLogLevel::Debug);
    }
    let consumer: StreamConsumer = config.create().map_err(|err| Error::Config {
        message: format!("create consumer: {err}"),
    })?;
    consumer.subscribe(&[&topic]).map_err(|err| Error::Fetch {
        message: format!("subscribe {topic}: {err}"),
    })?;

    let timeout_cfg = workload.timeout_or_default();
    info!(topic = %topic, group = %group, limit, timeout = ?timeout_cfg, "starting consumer workload");

    let overall = Instant::now()
        .checked_add(timeout_cfg)
        .map(|at| at.min(deadline))
        .unwrap_or(deadline);
    let mut idle_deadline = Instant::now() + IDLE_TIMEOUT;
    let mut consumed: u64 = 0;
    let mut fetch_error: Option<Error> = None;

    let ending = loop {
        match next_state(consumed, limit, Instant::now(), overall, idle_deadline) {
            PollState::Polling => {}
            state => break state,
        }
        let poll_started = Instant::now();
        let poll_deadline = (poll_started + POLL_INTERVAL).min(overall);
        match tokio::time::timeout_at(poll_deadline, consumer.recv()).await {
            Ok(Ok(message)) => {
                consumed += 1;
                summary.add_consume_poll(poll_started.elapsed());
                summary.add_consume(record_age(&message));
                idle_deadline = Instant::now() + IDLE_TIMEOUT;
                if options.verbose && consumed % 10 == 0 {
                    info!(consumed, limit, "consumer progress");
                }
            }
            Ok(Err(err)) => {
                summary.add_error();
                fetch_error = Some(Error::Fetch {
                    message: err.to_string(),
                });
                break PollState::Failed;
            }
            Err(_) => {
                debug!(consumed, "poll window closed without a record");
            }
        }
    };

    let close_started = Instant::now();
    let close = tokio::task::spawn_blocking(move || drop(consumer));
    match tokio::time::timeout(CLOSE_GRACE, close).await {
        Ok(Ok(())) => debug!(elapsed = ?close_started.elapsed(), "consumer closed"),
        Ok(Err(err)) => warn!(error = %err, "consumer close task failed"),
        Err(_) => warn!(grace = ?CLOSE_GRACE, "consumer close exceeded its grace period"),
    }

    match ending {
        PollState::Draining => {
            info!(consumed, "consumer drained its limit");
            Ok(())
        }
        PollState::TimedOut => {
            warn!(consumed, limit, "consumer hit its overall deadline");
            Err(Error::ConsumeTimeout { consumed, limit })
        }
        PollState::Idle => {
            warn!(consumed, limit, idle = ?IDLE_TIMEOUT, "consumer idle with no traffic");
            Err(Error::ConsumeTimeout { consumed, limit })
        }
        PollState::Failed => Err(fetch_error.unwrap_or_else(|| Error::Fetch {
            message: "fetch failed".to_string(),
        })),
        // The loop only breaks on a terminal state.
        PollState::Polling => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn terminal_states_follow_priority_order() {
        let now = Instant::now();
        let later = now + Duration::from_secs(60);
        // A reached limit wins even when the overall deadline has expired.
        assert_eq!(next_state(5, 5, now, now, later), PollState::Draining);
        // An expired overall deadline beats an expired idle deadline.
        assert_eq!(next_state(0, 5, now, now, now), PollState::TimedOut);
        // Idle fires only once the idle deadline alone has passed.
        assert_eq!(next_state(0, 5, now, later, now), PollState::Idle);
        assert_eq!(next_state(0, 5, now, later, later), PollState::Polling);
    }

    #[tokio::test]
    async fn over_consumption_still_drains() {
        let now = Instant::now();
        let later = now + Duration::from_secs(60);
        assert_eq!(next_state(7, 5, now, later, later), PollState::Draining);
    }
}
