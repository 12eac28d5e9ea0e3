//! Scan subcommand implementation.
//!
//! Handles the `portlens scan <target>` command for port scanning.

use crate::cli::OutputFormat;
use crate::config::{AppSettings, PortPreset};
use crate::error::CliResult;
use crate::output;
use crate::scanner::{ScanObserver, ScanOptions, Scanner, ServiceInfo};
use crate::types::{expand, PortSpec, TargetSpec};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Scan a target for open ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan (IP address or hostname)
    ///
    /// Examples:
    ///   192.168.1.1        IPv4 address
    ///   ::1                IPv6 address
    ///   example.com        Hostname
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to scan (e.g., "80", "80,443", "1-1000", "22,80,443,8000-9000")
    #[arg(short, long, env = "PORTLENS_PORTS", conflicts_with = "preset")]
    pub ports: Option<String>,

    /// Use a built-in port preset (see `portlens presets`)
    #[arg(short = 'P', long, env = "PORTLENS_PRESET")]
    pub preset: Option<String>,

    /// Maximum number of concurrent probes
    #[arg(short = 'c', long, env = "PORTLENS_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// TCP connect timeout in milliseconds
    #[arg(long = "connect-timeout", value_name = "MS", env = "PORTLENS_CONNECT_TIMEOUT")]
    pub connect_timeout: Option<u64>,

    /// How long to wait for a service banner, in milliseconds
    #[arg(long = "sniff-window", value_name = "MS", env = "PORTLENS_SNIFF_WINDOW")]
    pub sniff_window: Option<u64>,

    /// Timeout for each HTTP/HTTPS attempt, in milliseconds
    #[arg(long = "web-timeout", value_name = "MS", env = "PORTLENS_WEB_TIMEOUT")]
    pub web_timeout: Option<u64>,

    /// Rate limit in connection attempts per second (0 = unlimited)
    #[arg(short = 'r', long = "rate", env = "PORTLENS_RATE")]
    pub rate_limit: Option<u32>,

    /// Output format for results
    #[arg(short, long, value_enum, env = "PORTLENS_OUTPUT")]
    pub output: Option<OutputFormat>,

    /// Show closed and timed-out ports in output
    #[arg(long)]
    pub show_closed: bool,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, settings: &AppSettings, verbose: bool, quiet: bool) -> CliResult<()> {
        let ports = self.port_spec(settings)?;
        let options = self.scan_options(settings)?;
        let format = match self.output {
            Some(format) => format,
            None => OutputFormat::from_setting(&settings.default_output_format)?,
        };

        let target = TargetSpec::parse(&self.target)?.resolve().await?;
        info!(%target, ports = ports.len(), "resolved target");

        let interactive = format == OutputFormat::Plain && !quiet;
        if interactive {
            output::print_scan_header(&target.host, &target.ip.to_string(), ports.len());
        }

        let observer = Arc::new(LiveObserver::new(ports.len(), interactive, verbose));
        let cancel = CancellationToken::new();
        let interrupt = watch_interrupt(cancel.clone());

        let scanner = Scanner::new(target, options);
        let result = scanner.scan(&ports, observer.clone(), cancel).await;
        interrupt.abort();
        observer.finish();

        let report = result?;
        output::print_results(&report, format)?;

        if report.interrupted && !quiet {
            output::print_warning(&format!(
                "scan interrupted after {} of {} ports",
                report.scanned, report.total
            ));
        }
        if !quiet {
            eprintln!("Completed in {:.2}s", report.elapsed().as_secs_f64());
        }

        Ok(())
    }

    /// Ports from `--ports`, `--preset`, or the configured default preset.
    fn port_spec(&self, settings: &AppSettings) -> CliResult<PortSpec> {
        if let Some(ports) = &self.ports {
            return Ok(expand(ports)?);
        }
        let name = self.preset.as_deref().unwrap_or(&settings.default_preset);
        let preset = PortPreset::find(name)?;
        debug!(preset = preset.name, "using port preset");
        Ok(preset.spec()?)
    }

    /// Settings with command-line overrides applied.
    fn scan_options(&self, settings: &AppSettings) -> CliResult<ScanOptions> {
        let merged = AppSettings {
            connect_timeout_ms: self.connect_timeout.unwrap_or(settings.connect_timeout_ms),
            sniff_window_ms: self.sniff_window.unwrap_or(settings.sniff_window_ms),
            web_timeout_ms: self.web_timeout.unwrap_or(settings.web_timeout_ms),
            concurrency: self.concurrency.unwrap_or(settings.concurrency),
            rate_limit: self.rate_limit.unwrap_or(settings.rate_limit),
            ..settings.clone()
        };

        let mut options = merged.to_options()?;
        options.retain_closed = self.show_closed;
        Ok(options)
    }
}

/// Cancel `token` on Ctrl-C.
fn watch_interrupt(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, stopping scan");
            token.cancel();
        }
    })
}

/// Renders progress and discoveries while a scan runs.
struct LiveObserver {
    bar: ProgressBar,
    print_discoveries: bool,
}

impl LiveObserver {
    fn new(total: usize, interactive: bool, verbose: bool) -> Self {
        let bar = if interactive || verbose {
            let bar = ProgressBar::new(total as u64);
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        };

        Self {
            bar,
            print_discoveries: interactive,
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ScanObserver for LiveObserver {
    fn on_open(&self, service: &ServiceInfo) {
        if !self.print_discoveries {
            return;
        }
        let line = output::discovery_line(service);
        // A hidden bar swallows println.
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    fn on_progress(&self, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
    }
}
