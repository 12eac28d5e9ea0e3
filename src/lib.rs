//! # portlens - Concurrent TCP Service Discovery
//!
//! portlens connects to every requested port of a host, reads whatever the
//! service announces on its own and, when it stays silent, probes the port
//! as an HTTP/HTTPS endpoint.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: Thousands of ports with a fixed socket budget
//! - **Banner Sniffing**: SSH, FTP, SMTP and friends identify themselves
//! - **Web Probing**: Status, `Server` header and page title for silent ports
//! - **Interruptible**: Cancelling a scan returns everything found so far
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use portlens::scanner::{scan, NoopObserver, ScanOptions};
//! use portlens::types::TargetSpec;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = TargetSpec::parse("192.168.1.1")?.resolve().await?;
//!     let report = scan(
//!         target,
//!         "22,80,443,8000-8100",
//!         ScanOptions::default(),
//!         Arc::new(NoopObserver),
//!         CancellationToken::new(),
//!     )
//!     .await?;
//!
//!     for service in report.open_services() {
//!         println!("{} {} {}", service.port, service.transport_label, service.detail);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port and target types, port specification expansion
//! - [`scanner`] - Scan coordination, connect probing and report assembly
//! - [`banner`] - Passive banner sniffing on open ports
//! - [`web`] - HTTP/HTTPS identification of silent ports
//! - [`config`] - Settings file and port presets
//! - [`output`] - Output formatting utilities
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod services;
pub mod types;
pub mod web;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use scanner::{scan, ProbeOutcome, ScanOptions, ScanReport, Scanner, ServiceInfo};
pub use types::{expand, Port, PortSpec, ScanTarget, TargetSpec};
