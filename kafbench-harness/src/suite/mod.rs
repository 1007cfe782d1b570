//! Suite orchestration: every scenario in a directory, run across a profile
//! matrix, with an integrity ledger written and verified up front.
//!
//! A pair failure (one profile with one scenario) never aborts the matrix;
//! it is recorded as a tagged error string and the remaining pairs keep
//! running. Only directory-level problems abort the suite: no scenario
//! files, a scenario that fails validation, or a ledger mismatch.

pub mod ledger;

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use kafbench_core::error::{Error, Result};
use kafbench_core::profile::{self, ProfileFile};
use kafbench_core::report::{build_report_data, ReportData};
use kafbench_core::result::RunResult;
use kafbench_core::scenario::{self, ScenarioSpec};
use tracing::{info, warn};

use crate::engine::{Engine, RunOptions};

/// Runs every scenario in one directory across a set of profiles.
pub struct SuiteRunner {
    dir: PathBuf,
    profile_ids: Vec<String>,
    options: RunOptions,
}

/// Everything one suite invocation produced.
#[derive(Debug)]
pub struct SuiteOutcome {
    /// Suite identifier, naming the artifact directory. Each run inside the
    /// matrix mints its own id.
    pub run_id: String,
    /// Wall-clock suite start.
    pub started_at: DateTime<Utc>,
    /// Total suite duration.
    pub duration_ms: u64,
    /// Every finalized run, in execution order.
    pub results: Vec<RunResult>,
    /// Profile-grouped report over `results`.
    pub report: ReportData,
    /// Tagged pair failures: `load scenario <path>: …`,
    /// `apply profile <id>: …`, `run scenario <path>: …`.
    pub errors: Vec<String>,
}

impl SuiteRunner {
    /// `profile_ids` restricts the matrix; empty means every profile known
    /// to the suite's profile file, or a single profile-less pass when no
    /// file resolves.
    pub fn new(dir: impl Into<PathBuf>, profile_ids: Vec<String>, options: RunOptions) -> Self {
        Self {
            dir: dir.into(),
            profile_ids,
            options,
        }
    }

    /// Validates the suite, runs the profile×scenario matrix, and assembles
    /// the report. `run_id` names the suite's own artifacts; every matrix
    /// pair executes as an independent run with its own id.
    pub async fn run(&self, run_id: &str) -> Result<SuiteOutcome> {
        let started_at = Utc::now();
        let started = std::time::Instant::now();

        let files = scenario_files(&self.dir)?;
        if files.is_empty() {
            return Err(Error::Suite {
                message: format!("no scenario files in {}", self.dir.display()),
            });
        }
        validate(&self.dir, &files)?;
        ledger::verify_ledger(&self.dir, &files)?;

        let profiles = load_profiles(&self.dir);
        let mut profile_ids = if !self.profile_ids.is_empty() {
            self.profile_ids.clone()
        } else if let Some((file, _)) = &profiles {
            file.profiles.keys().cloned().collect()
        } else {
            Vec::new()
        };
        if profile_ids.is_empty() {
            profile_ids.push(String::new());
        }
        info!(
            run_id,
            scenarios = files.len(),
            profiles = profile_ids.len(),
            "suite matrix ready"
        );

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for profile_id in &profile_ids {
            for file in &files {
                let mut spec = match scenario::load(file) {
                    Ok(spec) => spec,
                    Err(err) => {
                        warn!(scenario = %file.display(), error = %err, "scenario failed to load");
                        errors.push(format!("load scenario {}: {err}", file.display()));
                        continue;
                    }
                };
                if !profile_id.is_empty() {
                    if let Err(err) =
                        apply_profile_override(&mut spec, profile_id, profiles.as_ref())
                    {
                        warn!(profile = %profile_id, error = %err, "profile override failed");
                        errors.push(format!("apply profile {profile_id}: {err}"));
                        continue;
                    }
                }
                let result = Engine::new(spec, self.options).run().await;
                if let Some(err) = &result.run_error {
                    errors.push(format!("run scenario {}: {err}", file.display()));
                }
                results.push(result);
            }
        }

        let report = build_report_data(&results, &format!("kafbench suite {run_id}"), run_id);
        Ok(SuiteOutcome {
            run_id: run_id.to_string(),
            started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            results,
            report,
            errors,
        })
    }
}

/// Every `*.json` directly in the suite directory except profile files,
/// sorted by path.
fn scenario_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|err| Error::Suite {
        message: format!("read suite directory {}: {err}", dir.display()),
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::Suite {
            message: format!("read suite directory {}: {err}", dir.display()),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension() != Some(OsStr::new("json")) {
            continue;
        }
        if entry
            .file_name()
            .to_string_lossy()
            .ends_with(profile::PROFILE_FILE_NAME)
        {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Structurally loads every scenario and writes the integrity ledger. Any
/// load failure aborts the suite before execution.
fn validate(dir: &Path, files: &[PathBuf]) -> Result<()> {
    let mut entries = BTreeMap::new();
    for path in files {
        scenario::load(path).map_err(|err| Error::Suite {
            message: format!("validate {}: {err}", path.display()),
        })?;
        entries.insert(ledger::relative_name(dir, path), ledger::hash_file(path)?);
    }
    let ledger_path = ledger::write_ledger(dir, &entries)?;
    info!(ledger = %ledger_path.display(), scenarios = files.len(), "suite validated");
    Ok(())
}

/// Suite-level profile resolution; absence is tolerated and simply yields a
/// profile-less matrix.
fn load_profiles(dir: &Path) -> Option<(ProfileFile, PathBuf)> {
    let primary = dir.join(profile::PROFILE_FILE_NAME);
    let fallback = std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join("config").join(profile::PROFILE_FILE_NAME));
    match profile::load_with_fallback(&primary, fallback.as_deref()) {
        Ok(loaded) => Some(loaded),
        Err(err) => {
            warn!(error = %err, "suite runs without profiles");
            None
        }
    }
}

/// Applies one profile to a freshly loaded scenario: metadata and brokers
/// are replaced outright, the metrics URL only fills a blank.
fn apply_profile_override(
    spec: &mut ScenarioSpec,
    profile_id: &str,
    profiles: Option<&(ProfileFile, PathBuf)>,
) -> Result<()> {
    let Some((file, source)) = profiles else {
        return Err(Error::Config {
            message: format!("unknown profile: {profile_id}"),
        });
    };
    let resolved = profile::resolve(file, profile_id)?;
    spec.profile = profile_id.to_string();
    spec.profile_name = resolved.name;
    spec.profile_description = resolved.description;
    spec.profile_source = source.display().to_string();
    spec.profile_metrics_url = resolved.metrics_url.clone();
    spec.brokers = resolved.brokers;
    if let Some(metrics) = spec.scenarios.metrics.as_mut() {
        if metrics.url.is_empty() {
            metrics.url = resolved.metrics_url;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kafbench_core::profile::ProfileSpec;
    use kafbench_core::scenario::MetricsProbeWorkload;

    fn edge_profiles() -> (ProfileFile, PathBuf) {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "edge".to_string(),
            ProfileSpec {
                name: "Edge".to_string(),
                description: "edge cluster".to_string(),
                brokers: vec!["edge:9092".to_string()],
                metrics_url: "http://edge:9644/metrics".to_string(),
            },
        );
        (
            ProfileFile {
                default_profile: "edge".to_string(),
                profiles,
            },
            PathBuf::from("/suite/profiles.json"),
        )
    }

    #[test]
    fn scenario_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("profiles.json"), "{}").unwrap();
        std::fs::write(dir.path().join("edge.profiles.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let files = scenario_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| ledger::relative_name(dir.path(), p))
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn override_replaces_brokers_and_fills_blank_metrics_url() {
        let mut spec = ScenarioSpec {
            brokers: vec!["declared:9092".to_string()],
            ..Default::default()
        };
        spec.scenarios.metrics = Some(MetricsProbeWorkload { url: String::new() });
        let loaded = edge_profiles();
        apply_profile_override(&mut spec, "edge", Some(&loaded)).unwrap();
        assert_eq!(spec.brokers, ["edge:9092"]);
        assert_eq!(spec.profile, "edge");
        assert_eq!(spec.profile_name, "Edge");
        assert_eq!(spec.profile_source, "/suite/profiles.json");
        assert_eq!(
            spec.scenarios.metrics.unwrap().url,
            "http://edge:9644/metrics"
        );
    }

    #[test]
    fn override_keeps_a_declared_metrics_url() {
        let mut spec = ScenarioSpec::default();
        spec.scenarios.metrics = Some(MetricsProbeWorkload {
            url: "http://declared/metrics".to_string(),
        });
        let loaded = edge_profiles();
        apply_profile_override(&mut spec, "edge", Some(&loaded)).unwrap();
        assert_eq!(spec.scenarios.metrics.unwrap().url, "http://declared/metrics");
    }

    #[test]
    fn override_without_a_profile_file_is_an_unknown_profile() {
        let mut spec = ScenarioSpec::default();
        let err = apply_profile_override(&mut spec, "prod", None).unwrap_err();
        assert!(err.to_string().contains("unknown profile: prod"));
    }

    #[test]
    fn override_with_an_unknown_id_fails() {
        let mut spec = ScenarioSpec::default();
        let loaded = edge_profiles();
        let err = apply_profile_override(&mut spec, "prod", Some(&loaded)).unwrap_err();
        assert!(err.to_string().contains("unknown profile: prod"));
    }
}
