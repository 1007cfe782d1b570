//! Message body rendering from scenario payload templates.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use kafbench_core::error::Result;

const UUID_TOKEN: &str = "{{uuid}}";
const NOW_TOKEN: &str = "{{now}}";

/// Renders one message body from the template, expanding `{{uuid}}` to a
/// per-call nanosecond stamp and `{{now}}` to an RFC 3339 timestamp. An
/// empty template yields a minimal identifying body.
pub fn render(template: &BTreeMap<String, String>) -> Result<String> {
    let now = Utc::now();
    let nanos = now.timestamp_nanos_opt().unwrap_or_default().to_string();
    if template.is_empty() {
        let body = serde_json::json!({ "uuid": nanos });
        return Ok(body.to_string());
    }
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let mut rendered = BTreeMap::new();
    for (key, value) in template {
        let value = value.replace(UUID_TOKEN, &nanos).replace(NOW_TOKEN, &timestamp);
        rendered.insert(key.as_str(), value);
    }
    Ok(serde_json::to_string(&rendered)?)
}
