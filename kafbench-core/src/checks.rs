//! Declarative post-run assertions over aggregated counters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of assertion a check performs. Unknown kinds are reported as
/// skipped, never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CheckKind {
    /// Exact equality against an aggregated counter
    CountEquals,
    /// Any unrecognized kind; reported as skipped
    #[default]
    Unknown,
}

impl From<String> for CheckKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "count_equals" => Self::CountEquals,
            _ => Self::Unknown,
        }
    }
}

/// Which aggregated counter a check reads. Anything but `produced` selects
/// the consumed counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CheckMetric {
    /// The produced-message counter
    Produced,
    /// The consumed-record counter
    #[default]
    Consumed,
}

impl From<String> for CheckMetric {
    fn from(value: String) -> Self {
        match value.as_str() {
            "produced" => Self::Produced,
            _ => Self::Consumed,
        }
    }
}

/// One declarative check from a scenario file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSpec {
    /// Display name, keying the outcome map
    pub name: String,
    /// Assertion kind
    #[serde(rename = "type")]
    pub kind: CheckKind,
    /// Counter the assertion reads
    pub metric: CheckMetric,
    /// Exact count expected
    pub expected: i64,
}

/// Outcome of one evaluated check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    /// Counter matched the expectation
    Pass,
    /// Counter diverged from the expectation
    Fail,
    /// Check kind was not recognized
    Skip,
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Scores every declared check against the final counters.
///
/// Never fails: unknown kinds produce an informational `skip` outcome and
/// count mismatches are recorded, not raised.
pub fn evaluate_checks(
    checks: &[CheckSpec],
    produced: u64,
    consumed: u64,
) -> BTreeMap<String, CheckOutcome> {
    let mut outcomes = BTreeMap::new();
    for check in checks {
        let outcome = match check.kind {
            CheckKind::CountEquals => {
                let actual = match check.metric {
                    CheckMetric::Produced => produced,
                    CheckMetric::Consumed => consumed,
                };
                if actual as i64 == check.expected {
                    CheckOutcome::Pass
                } else {
                    CheckOutcome::Fail
                }
            }
            CheckKind::Unknown => CheckOutcome::Skip,
        };
        outcomes.insert(check.name.clone(), outcome);
    }
    outcomes
}
