//! Artifact writing: JSON summaries and reports under the report directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use kafbench_core::error::Result;
use kafbench_core::report::{build_report_data, ReportData};
use kafbench_core::result::RunResult;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default directory for run artifacts, relative to the working directory.
pub const DEFAULT_REPORT_DIR: &str = "reports";

/// Serialized as `suite.json` after a suite invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteArtifact {
    /// Suite identifier the artifacts are named after
    pub run_id: String,
    /// Wall-clock suite start
    pub started_at: DateTime<Utc>,
    /// Total suite duration
    pub duration_ms: u64,
    /// Every finalized run, in execution order
    pub results: Vec<RunResult>,
}

/// Where one invocation's artifacts landed.
pub struct ArtifactPaths {
    /// Directory holding this invocation's artifacts
    pub dir: PathBuf,
    /// `summary.json` for a run, `suite.json` for a suite
    pub data: PathBuf,
    /// The assembled `report.json`
    pub report: PathBuf,
}

/// Writes `summary.json` and `report.json` for a single run under
/// `<report_dir>/<run_id>/`.
pub fn write_run_artifacts(report_dir: &Path, result: &RunResult) -> Result<ArtifactPaths> {
    let dir = report_dir.join(&result.run_id);
    fs::create_dir_all(&dir)?;
    let data = dir.join("summary.json");
    write_json(&data, result)?;
    let report = build_report_data(
        std::slice::from_ref(result),
        &format!("kafbench run {}", result.run_id),
        &result.run_id,
    );
    let report_path = dir.join("report.json");
    write_json(&report_path, &report)?;
    info!(dir = %dir.display(), "run artifacts written");
    Ok(ArtifactPaths {
        dir,
        data,
        report: report_path,
    })
}

/// Writes `suite.json` and `report.json` for a suite under
/// `<report_dir>/<run_id>/`.
pub fn write_suite_artifacts(
    report_dir: &Path,
    artifact: &SuiteArtifact,
    report: &ReportData,
) -> Result<ArtifactPaths> {
    let dir = report_dir.join(&artifact.run_id);
    fs::create_dir_all(&dir)?;
    let data = dir.join("suite.json");
    write_json(&data, artifact)?;
    let report_path = dir.join("report.json");
    write_json(&report_path, report)?;
    info!(dir = %dir.display(), "suite artifacts written");
    Ok(ArtifactPaths {
        dir,
        data,
        report: report_path,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(path, body)?;
    Ok(())
}
