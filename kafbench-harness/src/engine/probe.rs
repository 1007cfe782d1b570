//! Metrics endpoint probe.

use kafbench_core::error::{Error, Result};
use tokio::time::Instant;
use tracing::info;

/// Issues a single GET against the metrics endpoint, bounded by the run
/// deadline, and requires a 2xx response.
pub async fn run_metrics_probe(url: &str, deadline: Instant) -> Result<()> {
    if url.is_empty() {
        return Err(Error::Probe {
            message: "metrics url is required".to_string(),
        });
    }
    let client = reqwest::Client::builder()
        .build()
        .map_err(|err| Error::Probe {
            message: format!("build http client: {err}"),
        })?;
    let response = tokio::time::timeout_at(deadline, client.get(url).send())
        .await
        .map_err(|_| Error::Probe {
            message: format!("metrics probe {url}: run deadline exceeded"),
        })?
        .map_err(|err| Error::Probe {
            message: format!("metrics probe {url}: {err}"),
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Probe {
            message: format!("metrics status {}", status.as_u16()),
        });
    }
    info!(url = %url, status = status.as_u16(), "metrics probe ok");
    Ok(())
}
