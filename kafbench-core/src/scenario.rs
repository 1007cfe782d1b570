//! Scenario definitions: the declarative JSON surface the engine executes.
//!
//! A scenario file names its brokers (directly or through a profile), the
//! topics to provision, up to three workload kinds, and the checks scored
//! after the run. Loading resolves the profile first, then enforces the two
//! structural invariants: a non-empty broker list and at least one workload.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checks::CheckSpec;
use crate::error::{Error, Result};
use crate::profile;

/// Consumer timeout applied when the scenario leaves it unset or unparsable.
pub const DEFAULT_CONSUME_TIMEOUT: Duration = Duration::from_secs(30);

/// Token substituted with the generated run id at run start.
pub const RUN_ID_TOKEN: &str = "{{run_id}}";

/// One declarative workload definition, loaded from a scenario file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSpec {
    /// Scenario display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Declared profile id; resolved against the profile file at load time.
    pub profile: String,
    /// Bootstrap broker addresses; filled from the profile when empty
    pub brokers: Vec<String>,
    /// Topics ensured before the producer phase
    pub topics: Vec<TopicSpec>,
    /// Declared workloads
    pub scenarios: ScenarioCollection,
    /// Post-run assertions
    pub checks: Vec<CheckSpec>,

    /// Resolved profile display name; never read from scenario JSON.
    #[serde(skip)]
    pub profile_name: String,
    /// Resolved profile description
    #[serde(skip)]
    pub profile_description: String,
    /// Path of the profile file that supplied the metadata
    #[serde(skip)]
    pub profile_source: String,
    /// Metrics URL carried by the resolved profile
    #[serde(skip)]
    pub profile_metrics_url: String,
}

/// A topic to ensure before producing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicSpec {
    /// May contain [`RUN_ID_TOKEN`], resolved at run start.
    pub name: String,
    /// Values ≤ 0 provision a single partition.
    pub partitions: i32,
    /// Delete-then-create instead of create-if-missing.
    pub recreate: bool,
}

/// The up-to-three workload kinds a scenario may declare.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioCollection {
    /// Concurrent message production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<ProducerWorkload>,
    /// Bounded polling consumption
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<ConsumerWorkload>,
    /// Metrics endpoint probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsProbeWorkload>,
}

impl ScenarioCollection {
    /// True when no workload kind is declared.
    pub fn is_empty(&self) -> bool {
        self.producer.is_none() && self.consumer.is_none() && self.metrics.is_none()
    }
}

/// Concurrent message production against one topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerWorkload {
    /// Worker count; ≤ 0 runs one worker.
    pub clients: i64,
    /// Total message budget split evenly across workers; ≤ 0 sends one.
    pub messages: i64,
    /// Target topic; empty falls back to the first declared topic.
    pub topic: String,
    /// Message body template
    pub value: PayloadSpec,
}

impl ProducerWorkload {
    /// Worker count with the floor applied.
    pub fn client_count(&self) -> u64 {
        if self.clients <= 0 {
            1
        } else {
            self.clients as u64
        }
    }

    /// Message budget with the floor applied.
    pub fn message_count(&self) -> u64 {
        if self.messages <= 0 {
            1
        } else {
            self.messages as u64
        }
    }
}

/// Message body template. Values `{{uuid}}` and `{{now}}` are expanded per
/// message; everything else is copied literally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadSpec {
    /// Key/value pairs rendered into one JSON object per message
    pub json: BTreeMap<String, String>,
}

/// A polling consumer bounded by a message limit and two deadlines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerWorkload {
    /// Accepted for symmetry with the producer; a single consuming task is
    /// driven regardless.
    pub clients: i64,
    /// Target topic; empty falls back to the first declared topic.
    pub topic: String,
    /// Consumer-group membership
    pub group: GroupSpec,
    /// `earliest` (or empty) starts from the beginning; anything else keeps
    /// the client default.
    pub offset: String,
    /// Record count to wait for; ≤ 0 waits for one.
    pub limit: i64,
    /// Overall phase timeout as a duration string, e.g. `"45s"`.
    pub timeout: String,
}

impl ConsumerWorkload {
    /// Declared client count with the floor applied.
    pub fn client_count(&self) -> u64 {
        if self.clients <= 0 {
            1
        } else {
            self.clients as u64
        }
    }

    /// Record limit with the floor applied.
    pub fn message_limit(&self) -> u64 {
        if self.limit <= 0 {
            1
        } else {
            self.limit as u64
        }
    }

    /// Lenient timeout parse: empty or invalid input falls back to
    /// [`DEFAULT_CONSUME_TIMEOUT`].
    pub fn timeout_or_default(&self) -> Duration {
        if self.timeout.is_empty() {
            return DEFAULT_CONSUME_TIMEOUT;
        }
        humantime::parse_duration(&self.timeout).unwrap_or(DEFAULT_CONSUME_TIMEOUT)
    }

    /// True when the configured start offset selects the earliest reset.
    pub fn starts_earliest(&self) -> bool {
        self.offset.is_empty() || self.offset == "earliest"
    }
}

/// Consumer-group membership. An empty or `{{run_id}}` id generates a
/// per-run group name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    /// Group id; may contain [`RUN_ID_TOKEN`]
    pub id: String,
}

/// A single GET expecting a 2xx response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsProbeWorkload {
    /// Endpoint to GET; filled from the profile when empty
    pub url: String,
}

/// Loads a scenario file, resolves its profile, and enforces the load-time
/// invariants.
pub fn load(path: impl AsRef<Path>) -> Result<ScenarioSpec> {
    let path = path.as_ref();
    let raw = std::fs::read(path)?;
    let mut spec: ScenarioSpec = serde_json::from_slice(&raw)?;
    apply_profile(path, &mut spec)?;
    if spec.brokers.is_empty() {
        return Err(Error::Config {
            message: "brokers are required".to_string(),
        });
    }
    if spec.scenarios.is_empty() {
        return Err(Error::Config {
            message: "at least one scenario is required".to_string(),
        });
    }
    Ok(spec)
}

/// Resolves the profile referenced by a scenario.
///
/// A profile file is searched next to the scenario, then under
/// `./config/`. Its absence is only an error when the scenario actually
/// needs one: it declares a profile id, has no brokers of its own, or
/// declares a metrics probe without a URL. When a file is found, the
/// declared (or default) profile fills whatever the scenario left empty;
/// declared brokers and URLs always win.
fn apply_profile(path: &Path, spec: &mut ScenarioSpec) -> Result<()> {
    let needs_profile = !spec.profile.is_empty()
        || spec.brokers.is_empty()
        || spec
            .scenarios
            .metrics
            .as_ref()
            .map(|m| m.url.is_empty())
            .unwrap_or(false);
    let scenario_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let primary = scenario_dir.join(profile::PROFILE_FILE_NAME);
    let fallback = std::env::current_dir()?
        .join("config")
        .join(profile::PROFILE_FILE_NAME);
    let (file, source) = match profile::load_with_fallback(&primary, Some(&fallback)) {
        Ok(loaded) => loaded,
        Err(err) => {
            if needs_profile {
                return Err(err);
            }
            return Ok(());
        }
    };
    let profile_id = if spec.profile.is_empty() {
        file.default_profile.clone()
    } else {
        spec.profile.clone()
    };
    let resolved = profile::resolve(&file, &profile_id)?;
    spec.profile = profile_id;
    spec.profile_name = resolved.name;
    spec.profile_description = resolved.description;
    spec.profile_source = source.display().to_string();
    spec.profile_metrics_url = resolved.metrics_url.clone();
    if spec.brokers.is_empty() {
        spec.brokers = resolved.brokers;
    }
    if let Some(metrics) = spec.scenarios.metrics.as_mut() {
        if metrics.url.is_empty() {
            metrics.url = resolved.metrics_url;
        }
    }
    Ok(())
}

/// Substitutes the run-id token wherever it appears.
pub fn replace_run_id(input: &str, run_id: &str) -> String {
    input.replace(RUN_ID_TOKEN, run_id)
}

/// Resolves a workload's target topic, falling back to the first declared
/// topic when the workload names none.
pub fn resolve_topic(input: &str, topics: &[TopicSpec], run_id: &str) -> String {
    let name = if input.is_empty() {
        topics.first().map(|t| t.name.as_str()).unwrap_or_default()
    } else {
        input
    };
    if run_id.is_empty() {
        return name.to_string();
    }
    replace_run_id(name, run_id)
}

/// Resolves the consumer group id, generating a per-run one when the
/// scenario leaves it unset.
pub fn resolved_group_id(input: &str, run_id: &str) -> String {
    if input.is_empty() || input == RUN_ID_TOKEN {
        return format!("kafbench-group-{run_id}");
    }
    replace_run_id(input, run_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckKind;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_a_complete_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "smoke.json",
            r#"{
                "name": "smoke",
                "description": "one message through",
                "brokers": ["127.0.0.1:9092"],
                "topics": [{"name": "smoke-{{run_id}}", "partitions": 3, "recreate": true}],
                "scenarios": {
                    "producer": {"clients": 2, "messages": 10, "value": {"json": {"id": "{{uuid}}"}}},
                    "consumer": {"limit": 10, "timeout": "45s", "group": {"id": "{{run_id}}"}}
                },
                "checks": [{"name": "all", "type": "count_equals", "metric": "consumed", "expected": 10}]
            }"#,
        );
        let spec = load(&path).unwrap();
        assert_eq!(spec.name, "smoke");
        assert_eq!(spec.brokers, ["127.0.0.1:9092"]);
        assert_eq!(spec.topics[0].partitions, 3);
        assert!(spec.topics[0].recreate);
        let producer = spec.scenarios.producer.as_ref().unwrap();
        assert_eq!(producer.client_count(), 2);
        assert_eq!(producer.message_count(), 10);
        let consumer = spec.scenarios.consumer.as_ref().unwrap();
        assert_eq!(consumer.timeout_or_default(), Duration::from_secs(45));
        assert_eq!(spec.checks[0].kind, CheckKind::CountEquals);
    }

    #[test]
    fn rejects_missing_brokers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "bad.json",
            r#"{"name": "bad", "scenarios": {"consumer": {"topic": "t"}}}"#,
        );
        let err = load(&path).unwrap_err();
        // No brokers and no profile file to supply them.
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn rejects_missing_workloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "empty.json",
            r#"{"name": "empty", "brokers": ["127.0.0.1:9092"]}"#,
        );
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("at least one scenario is required"));
    }

    #[test]
    fn profile_fills_brokers_and_metrics_url() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "profiles.json",
            r#"{
                "default_profile": "local",
                "profiles": {
                    "local": {
                        "name": "Local",
                        "brokers": ["10.0.0.1:9092"],
                        "metrics_url": "http://10.0.0.1:9644/metrics"
                    }
                }
            }"#,
        );
        let path = write(
            dir.path(),
            "probe.json",
            r#"{"name": "probe", "scenarios": {"metrics": {"url": ""}}}"#,
        );
        let spec = load(&path).unwrap();
        assert_eq!(spec.profile, "local");
        assert_eq!(spec.profile_name, "Local");
        assert_eq!(spec.brokers, ["10.0.0.1:9092"]);
        assert_eq!(
            spec.scenarios.metrics.unwrap().url,
            "http://10.0.0.1:9644/metrics"
        );
        assert!(spec.profile_source.ends_with("profiles.json"));
    }

    #[test]
    fn declared_brokers_win_over_profile() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "profiles.json",
            r#"{
                "default_profile": "local",
                "profiles": {"local": {"brokers": ["10.0.0.1:9092"]}}
            }"#,
        );
        let path = write(
            dir.path(),
            "own.json",
            r#"{
                "name": "own",
                "brokers": ["192.168.0.5:9092"],
                "scenarios": {"consumer": {"topic": "t"}}
            }"#,
        );
        let spec = load(&path).unwrap();
        assert_eq!(spec.brokers, ["192.168.0.5:9092"]);
        // The default profile metadata is still attached.
        assert_eq!(spec.profile, "local");
    }

    #[test]
    fn unknown_declared_profile_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "profiles.json",
            r#"{"default_profile": "local", "profiles": {"local": {"brokers": ["b:9092"]}}}"#,
        );
        let path = write(
            dir.path(),
            "wants.json",
            r#"{
                "name": "wants",
                "profile": "prod",
                "scenarios": {"consumer": {"topic": "t"}}
            }"#,
        );
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("unknown profile: prod"));
    }

    #[test]
    fn timeout_parsing_is_lenient() {
        let mut consumer = ConsumerWorkload::default();
        assert_eq!(consumer.timeout_or_default(), DEFAULT_CONSUME_TIMEOUT);
        consumer.timeout = "garbage".to_string();
        assert_eq!(consumer.timeout_or_default(), DEFAULT_CONSUME_TIMEOUT);
        consumer.timeout = "2s".to_string();
        assert_eq!(consumer.timeout_or_default(), Duration::from_secs(2));
        consumer.timeout = "1m 30s".to_string();
        assert_eq!(consumer.timeout_or_default(), Duration::from_secs(90));
    }

    #[test]
    fn workload_defaults_floor_at_one() {
        let producer = ProducerWorkload {
            clients: -3,
            messages: 0,
            ..Default::default()
        };
        assert_eq!(producer.client_count(), 1);
        assert_eq!(producer.message_count(), 1);
        let consumer = ConsumerWorkload::default();
        assert_eq!(consumer.client_count(), 1);
        assert_eq!(consumer.message_limit(), 1);
    }

    #[test]
    fn topic_resolution_falls_back_to_first_declared() {
        let topics = vec![
            TopicSpec {
                name: "events-{{run_id}}".to_string(),
                ..Default::default()
            },
            TopicSpec {
                name: "other".to_string(),
                ..Default::default()
            },
        ];
        assert_eq!(
            resolve_topic("", &topics, "20260825-120000"),
            "events-20260825-120000"
        );
        assert_eq!(resolve_topic("explicit", &topics, "x"), "explicit");
        assert_eq!(resolve_topic("", &[], "x"), "");
    }

    #[test]
    fn group_resolution_generates_per_run_ids() {
        assert_eq!(resolved_group_id("", "r1"), "kafbench-group-r1");
        assert_eq!(resolved_group_id("{{run_id}}", "r1"), "kafbench-group-r1");
        assert_eq!(resolved_group_id("team-{{run_id}}", "r1"), "team-r1");
        assert_eq!(resolved_group_id("fixed", "r1"), "fixed");
    }

    #[test]
    fn earliest_offset_detection() {
        let mut consumer = ConsumerWorkload::default();
        assert!(consumer.starts_earliest());
        consumer.offset = "earliest".to_string();
        assert!(consumer.starts_earliest());
        consumer.offset = "latest".to_string();
        assert!(!consumer.starts_earliest());
    }
}
