//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `portlens scan <target>` - Scan a target
//! - `portlens presets` - List the built-in port presets

mod presets;
mod scan;

pub use presets::PresetsCommand;
pub use scan::ScanCommand;

use crate::error::{ConfigError, ConfigResult};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// portlens - concurrent TCP service discovery.
///
/// Connects to every requested port, reads whatever the service announces
/// and probes silent ports as HTTP/HTTPS endpoints.
#[derive(Parser, Debug)]
#[command(name = "portlens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find open TCP ports and identify what answers on them", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH", env = "PORTLENS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a target for open ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// List the built-in port presets
    #[command(alias = "p")]
    Presets(PresetsCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl OutputFormat {
    /// Parse a format name from the settings file.
    pub fn from_setting(name: &str) -> ConfigResult<Self> {
        <Self as ValueEnum>::from_str(name.trim(), true).map_err(|_| {
            ConfigError::Invalid(format!("unknown output format '{}'", name))
        })
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
