//! Concurrent producer workload.

use std::sync::Arc;
use std::time::Instant;

use kafbench_core::error::{Error, Result};
use kafbench_core::metrics::Summary;
use kafbench_core::scenario::{self, ProducerWorkload, ScenarioSpec};
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{error, info};

use super::{payload, RunOptions};

/// Spawns the configured number of producer workers over one shared client
/// and joins them all. Per-message failures bump the error counter and the
/// worker keeps going; only the run deadline stops a worker early.
pub async fn run_producer(
    spec: &ScenarioSpec,
    workload: &ProducerWorkload,
    summary: &Arc<Summary>,
    run_id: &str,
    deadline: tokio::time::Instant,
    options: RunOptions,
) -> Result<()> {
    let topic = scenario::resolve_topic(&workload.topic, &spec.topics, run_id);
    if topic.is_empty() {
        return Err(Error::Config {
            message: "producer topic is required".to_string(),
        });
    }
    let clients = workload.client_count();
    let per_client = (workload.message_count() / clients).max(1);

    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", spec.brokers.join(","));
    if options.debug {
        config.set_log_level(RDKafkaLogLevel::Debug);
    }
    let producer: FutureProducer = config.create().map_err(|err| Error::Config {
        message: format!("create producer: {err}"),
    })?;

    info!(topic = %topic, clients, per_client, "starting producer workload");

    let mut handles = Vec::with_capacity(clients as usize);
    for worker in 0..clients {
        let producer = producer.clone();
        let topic = topic.clone();
        let template = workload.value.json.clone();
        let summary = Arc::clone(summary);
        let verbose = options.verbose;
        handles.push(tokio::spawn(async move {
            for sequence in 0..per_client {
                if tokio::time::Instant::now() >= deadline {
                    summary.add_error();
                    error!(worker, "run deadline passed before send");
                    return;
                }
                let body = match payload::render(&template) {
                    Ok(body) => body,
                    Err(err) => {
                        summary.add_error();
                        error!(worker, error = %err, "payload render failed");
                        continue;
                    }
                };
                let send_started = Instant::now();
                let record = FutureRecord::<(), _>::to(&topic).payload(&body);
                match tokio::time::timeout_at(deadline, producer.send(record, Timeout::Never)).await
                {
                    Ok(Ok(_delivery)) => {
                        summary.add_produce(send_started.elapsed());
                        if verbose && (sequence + 1) % 10 == 0 {
                            info!(worker, sent = sequence + 1, per_client, "producer progress");
                        }
                    }
                    Ok(Err((err, _message))) => {
                        summary.add_error();
                        error!(worker, error = %err, "send failed");
                    }
                    Err(_) => {
                        summary.add_error();
                        error!(worker, "run deadline passed during send");
                        return;
                    }
                }
            }
        }));
    }
    for handle in handles {
        if let Err(err) = handle.await {
            summary.add_error();
            error!(error = %err, "producer worker panicked");
        }
    }

    info!(
        produced = summary.produced(),
        errors = summary.errors(),
        "producer workload complete"
    );
    Ok(())
}
