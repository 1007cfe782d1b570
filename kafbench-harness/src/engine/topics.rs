//! Topic provisioning ahead of the producer phase.

use kafbench_core::error::{Error, Result};
use kafbench_core::scenario::{self, ScenarioSpec};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::types::RDKafkaErrorCode;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::SETTLE_INTERVAL;

/// Ensures every declared topic exists before producing.
///
/// Topics flagged `recreate` are deleted first; the delete outcome is
/// ignored. A topic that already exists is tolerated, any other creation
/// failure aborts the run.
pub async fn ensure_topics(spec: &ScenarioSpec, run_id: &str, deadline: Instant) -> Result<()> {
    if spec.topics.is_empty() {
        return Ok(());
    }
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", spec.brokers.join(","))
        .create()
        .map_err(|err| Error::Provision {
            message: format!("create admin client: {err}"),
        })?;
    let options = AdminOptions::new();

    for topic in &spec.topics {
        let name = scenario::replace_run_id(&topic.name, run_id);
        if name.is_empty() {
            continue;
        }
        if topic.recreate {
            match tokio::time::timeout_at(deadline, admin.delete_topics(&[name.as_str()], &options))
                .await
            {
                Ok(Ok(results)) => {
                    for result in results {
                        if let Err((deleted, code)) = result {
                            debug!(topic = %deleted, code = %code, "delete before recreate skipped");
                        }
                    }
                }
                Ok(Err(err)) => warn!(topic = %name, error = %err, "delete before recreate failed"),
                Err(_) => warn!(topic = %name, "delete before recreate hit the run deadline"),
            }
        }
        let partitions = topic.partitions.max(1);
        let new_topic = NewTopic::new(&name, partitions, TopicReplication::Fixed(1));
        let results =
            match tokio::time::timeout_at(deadline, admin.create_topics(&[new_topic], &options))
                .await
            {
                Ok(outcome) => outcome.map_err(|err| Error::Provision {
                    message: format!("create topic {name}: {err}"),
                })?,
                Err(_) => {
                    return Err(Error::Provision {
                        message: format!("create topic {name}: run deadline exceeded"),
                    });
                }
            };
        for result in results {
            match result {
                Ok(created) => info!(topic = %created, partitions, "topic ready"),
                Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    debug!(topic = %name, "topic already exists");
                }
                Err((failed, code)) => {
                    return Err(Error::Provision {
                        message: format!("create topic {failed}: {code}"),
                    });
                }
            }
        }
    }

    debug!(settle = ?SETTLE_INTERVAL, "waiting for topic metadata to settle");
    tokio::time::sleep(SETTLE_INTERVAL).await;
    Ok(())
}
