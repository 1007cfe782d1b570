//! Pre-run broker reachability probe.

use std::time::Duration;

use kafbench_core::error::{Error, Result};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Per-broker dial timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Dials each broker in order and succeeds on the first connection, which
/// is dropped immediately. Fails only when every broker is unreachable,
/// carrying the last dial error.
pub async fn probe_brokers(brokers: &[String]) -> Result<()> {
    if brokers.is_empty() {
        return Err(Error::Connectivity {
            message: "no brokers configured".to_string(),
        });
    }
    let mut last_error = String::new();
    for broker in brokers {
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(broker.as_str())).await {
            Ok(Ok(_stream)) => {
                debug!(broker = %broker, "broker reachable");
                return Ok(());
            }
            Ok(Err(err)) => {
                warn!(broker = %broker, error = %err, "broker dial failed");
                last_error = format!("connect {broker}: {err}");
            }
            Err(_) => {
                warn!(broker = %broker, timeout = ?CONNECT_TIMEOUT, "broker dial timed out");
                last_error = format!("connect {broker}: timed out after {CONNECT_TIMEOUT:?}");
            }
        }
    }
    Err(Error::Connectivity { message: last_error })
}
