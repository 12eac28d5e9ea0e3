//! Error types for portlens.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-port failures are
//! never errors: they become [`ProbeOutcome`](crate::scanner::ProbeOutcome)
//! values. Only problems that make the whole scan impossible end up here.

use crate::types::{PortError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a scan invocation.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid port specification: {0}")]
    InvalidPorts(#[from] PortError),

    #[error("cannot open more sockets: {0}")]
    ResourceExhausted(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("malformed settings: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("unknown port preset '{0}'")]
    UnknownPreset(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidFormat(e.to_string())
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by CLI command handlers.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ports(#[from] PortError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_errors_reach_cli() {
        let err: CliError = TargetError::InvalidFormat("bad host".to_string()).into();
        assert!(matches!(err, CliError::Target(TargetError::InvalidFormat(_))));
        assert_eq!(err.to_string(), "invalid target format: bad host");
    }

    #[test]
    fn test_scan_errors_keep_their_message() {
        let err: CliError = ScanError::ResourceExhausted("Too many open files".to_string()).into();
        assert_eq!(err.to_string(), "cannot open more sockets: Too many open files");
    }
}
