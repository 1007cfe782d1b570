//! Report assembly: groups finished runs by profile and folds their
//! counters into per-group and overall summaries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::{ConnectivityStatus, RunResult, RunStatus};

/// Default title applied when the caller supplies none.
pub const DEFAULT_REPORT_TITLE: &str = "kafbench report";

/// Aggregated verdict over a set of runs. `n.a.` marks a report built from
/// zero results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    /// Every folded run passed
    #[serde(rename = "pass")]
    Pass,
    /// At least one folded run failed
    #[serde(rename = "fail")]
    Fail,
    /// No runs were folded
    #[serde(rename = "n.a.")]
    NotAvailable,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Pass => write!(f, "pass"),
            ReportStatus::Fail => write!(f, "fail"),
            ReportStatus::NotAvailable => write!(f, "n.a."),
        }
    }
}

/// Aggregated connectivity over a set of runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportConnectivity {
    /// Every folded run reached its brokers
    #[serde(rename = "ok")]
    Ok,
    /// At least one run could not connect
    #[serde(rename = "failed")]
    Failed,
    /// No runs were folded
    #[serde(rename = "n.a.")]
    NotAvailable,
}

impl fmt::Display for ReportConnectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportConnectivity::Ok => write!(f, "ok"),
            ReportConnectivity::Failed => write!(f, "failed"),
            ReportConnectivity::NotAvailable => write!(f, "n.a."),
        }
    }
}

/// Counter and status fold over one profile group, or over the whole report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Profile groups folded in
    pub profiles: u64,
    /// Runs folded in
    pub scenarios: u64,
    /// Runs that did not pass
    pub failed: u64,
    /// Messages produced across all runs
    pub produced: u64,
    /// Records consumed across all runs
    pub consumed: u64,
    /// Errors recorded across all runs
    pub errors: u64,
    /// Aggregated verdict
    pub status: ReportStatus,
    /// Aggregated connectivity
    pub connectivity: ReportConnectivity,
}

impl ReportSummary {
    fn not_available() -> Self {
        Self {
            profiles: 0,
            scenarios: 0,
            failed: 0,
            produced: 0,
            consumed: 0,
            errors: 0,
            status: ReportStatus::NotAvailable,
            connectivity: ReportConnectivity::NotAvailable,
        }
    }

    /// Folds one run into the summary. The first recorded run flips the
    /// statuses out of `n.a.`.
    fn record(&mut self, result: &RunResult) {
        self.scenarios += 1;
        self.produced += result.produced;
        self.consumed += result.consumed;
        self.errors += result.errors;
        if self.status == ReportStatus::NotAvailable {
            self.status = ReportStatus::Pass;
        }
        if self.connectivity == ReportConnectivity::NotAvailable {
            self.connectivity = ReportConnectivity::Ok;
        }
        if result.status != RunStatus::Pass {
            self.failed += 1;
            self.status = ReportStatus::Fail;
        }
        if result.connectivity_status != ConnectivityStatus::Ok {
            self.connectivity = ReportConnectivity::Failed;
        }
    }

    fn merge(&mut self, other: &ReportSummary) {
        self.profiles += other.profiles;
        self.scenarios += other.scenarios;
        self.failed += other.failed;
        self.produced += other.produced;
        self.consumed += other.consumed;
        self.errors += other.errors;
        if other.status != ReportStatus::NotAvailable && self.status == ReportStatus::NotAvailable {
            self.status = ReportStatus::Pass;
        }
        if other.status == ReportStatus::Fail {
            self.status = ReportStatus::Fail;
        }
        if other.connectivity != ReportConnectivity::NotAvailable
            && self.connectivity == ReportConnectivity::NotAvailable
        {
            self.connectivity = ReportConnectivity::Ok;
        }
        if other.connectivity == ReportConnectivity::Failed {
            self.connectivity = ReportConnectivity::Failed;
        }
    }
}

/// All runs executed against one profile, with their folded summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSection {
    /// Grouping key, unique within the report
    pub key: String,
    /// Profile id, when the runs carried one
    pub profile: String,
    /// Profile display name
    pub profile_name: String,
    /// Profile description
    pub profile_description: String,
    /// Path of the profile file used
    pub profile_source: String,
    /// Fold over this group's runs
    pub summary: ReportSummary,
    /// The group's runs, ordered by scenario name
    pub results: Vec<RunResult>,
}

/// The assembled report, serialized as `report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    /// Report heading
    pub title: String,
    /// Identifier of the invocation the report covers
    pub run_id: String,
    /// When the report was assembled
    pub generated_at: DateTime<Utc>,
    /// Earliest run start; absent for an empty report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Latest run end; absent for an empty report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Fold over every run
    pub summary: ReportSummary,
    /// Per-profile groups, ordered by key
    pub profiles: Vec<ProfileSection>,
}

/// Grouping key for one result's profile: `default` when the run carried no
/// profile, `id (name)` when a distinct display name exists, otherwise
/// whichever of id/name is set.
fn profile_key(result: &RunResult) -> String {
    let id = result.profile.as_str();
    let name = result.profile_name.as_str();
    if id.is_empty() && name.is_empty() {
        return "default".to_string();
    }
    if !id.is_empty() && !name.is_empty() && id != name {
        return format!("{id} ({name})");
    }
    if !id.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

fn finished_at(result: &RunResult) -> DateTime<Utc> {
    result
        .started_at
        .checked_add_signed(chrono::Duration::milliseconds(result.duration_ms as i64))
        .unwrap_or(result.started_at)
}

/// Assembles report data from finished runs.
///
/// An empty title falls back to [`DEFAULT_REPORT_TITLE`] and an empty run id
/// to the first result's. Groups are ordered by key, results within a group
/// by scenario name. Empty input yields a placeholder report with `n.a.`
/// statuses.
pub fn build_report_data(results: &[RunResult], title: &str, run_id: &str) -> ReportData {
    let title = if title.is_empty() {
        DEFAULT_REPORT_TITLE.to_string()
    } else {
        title.to_string()
    };
    let run_id = if run_id.is_empty() {
        results
            .first()
            .map(|r| r.run_id.clone())
            .unwrap_or_default()
    } else {
        run_id.to_string()
    };

    let mut grouped: BTreeMap<String, Vec<RunResult>> = BTreeMap::new();
    for result in results {
        grouped
            .entry(profile_key(result))
            .or_default()
            .push(result.clone());
    }

    let mut overall = ReportSummary::not_available();
    let mut started_at: Option<DateTime<Utc>> = None;
    let mut ended_at: Option<DateTime<Utc>> = None;
    let mut sections = Vec::with_capacity(grouped.len());
    for (key, mut members) in grouped {
        members.sort_by(|a, b| a.name.cmp(&b.name));
        let mut summary = ReportSummary::not_available();
        summary.profiles = 1;
        for member in &members {
            summary.record(member);
            started_at = Some(match started_at {
                Some(at) => at.min(member.started_at),
                None => member.started_at,
            });
            let end = finished_at(member);
            ended_at = Some(match ended_at {
                Some(at) => at.max(end),
                None => end,
            });
        }
        overall.merge(&summary);
        let first = &members[0];
        sections.push(ProfileSection {
            key,
            profile: first.profile.clone(),
            profile_name: first.profile_name.clone(),
            profile_description: first.profile_description.clone(),
            profile_source: first.profile_source.clone(),
            summary,
            results: members,
        });
    }

    ReportData {
        title,
        run_id,
        generated_at: Utc::now(),
        started_at,
        finished_at: ended_at,
        summary: overall,
        profiles: sections,
    }
}
