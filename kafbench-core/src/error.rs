//! Error types shared across the kafbench workspace.

use thiserror::Error;

/// Main error type for kafbench operations.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Malformed or incomplete scenario/profile configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// No broker in the list accepted a TCP connection
    #[error("Connectivity check failed: {message}")]
    Connectivity { message: String },

    /// Topic create/delete failed ahead of the producer phase
    #[error("Topic provisioning failed: {message}")]
    Provision { message: String },

    /// Consumer poll returned a broker-side error
    #[error("Fetch failed: {message}")]
    Fetch { message: String },

    /// Consumer finished without reaching its message limit
    #[error("consume timeout: got {consumed} of {limit}")]
    ConsumeTimeout { consumed: u64, limit: u64 },

    /// Metrics endpoint probe failed or returned a non-2xx status
    #[error("Metrics probe failed: {message}")]
    Probe { message: String },

    /// Suite ledger entry missing or hash changed between phases
    #[error("Integrity check failed: {message}")]
    Integrity { message: String },

    /// Suite-level failure outside any single scenario run
    #[error("Suite error: {message}")]
    Suite { message: String },

    /// File system errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON encode/decode errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Result type alias for kafbench operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_timeout_reports_partial_count() {
        let err = Error::ConsumeTimeout {
            consumed: 2,
            limit: 5,
        };
        assert_eq!(err.to_string(), "consume timeout: got 2 of 5");
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io { .. }));
    }
}
