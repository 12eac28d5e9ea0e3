//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{PortOutcome, ProbeOutcome, ScanReport, ServiceInfo};
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const TABLE_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print results in human-readable plain text format.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_plain(&mut out, report)
}

/// Write the plain text report to `out`.
pub fn write_plain<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                    {} Scan Results", style("portlens").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Target:").bold(), report.target)?;
    writeln!(out, "  {} {}", style("IP Address:").bold(), report.ip_address)?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} {} of {} ports scanned in {:.2}s",
        style("Statistics:").bold(),
        report.scanned,
        report.total,
        report.elapsed_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "               {} open, {} closed, {} timed out",
        style(report.open_count).green().bold(),
        style(report.closed_count).red(),
        style(report.timed_out_count).yellow()
    )?;
    if report.interrupted {
        writeln!(
            out,
            "  {}",
            style("Scan interrupted, results are partial.").yellow().bold()
        )?;
    }
    writeln!(out)?;

    if report.open_count == 0 && report.entries.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
    } else {
        writeln!(out, "  {}", style(TABLE_RULE).dim())?;
        writeln!(
            out,
            "  {:>6}  {:<15}  {}",
            style("PORT").bold(),
            style("SERVICE").bold(),
            style("INFO").bold()
        )?;
        writeln!(out, "  {}", style(TABLE_RULE).dim())?;

        for entry in &report.entries {
            write_entry(out, entry)?;
        }

        writeln!(out, "  {}", style(TABLE_RULE).dim())?;
        if report.open_count == 0 {
            writeln!(out, "  {}", style("No open ports found.").dim())?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

fn write_entry<W: Write>(out: &mut W, entry: &PortOutcome) -> io::Result<()> {
    match &entry.outcome {
        ProbeOutcome::Open(info) => {
            let link = info
                .link
                .as_ref()
                .map(|l| format!(" -> {}", style(l).underlined()))
                .unwrap_or_default();
            writeln!(
                out,
                "  {:>6}  {:<15}  {}{}",
                style(entry.port).green().bold(),
                info.transport_label,
                info.detail,
                link
            )
        }
        other => writeln!(
            out,
            "  {:>6}  {:<15}  {}",
            style(entry.port).dim(),
            entry.service,
            style(other).dim()
        ),
    }
}

/// One line for a port as it is discovered: `PORT | SERVICE | INFO -> link`.
pub fn discovery_line(info: &ServiceInfo) -> String {
    match &info.link {
        Some(link) => format!(
            "{} | {} | {} -> {}",
            info.port, info.transport_label, info.detail, link
        ),
        None => format!("{} | {} | {}", info.port, info.transport_label, info.detail),
    }
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, ip: &str, ports: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("portlens").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Target: {} ({})",
        style("•").dim(),
        style(target).white().bold(),
        ip
    );
    println!(
        "{} Scanning {} ports...",
        style("•").dim(),
        style(ports).white().bold()
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ReportAssembler;
    use crate::types::{Port, ScanTarget};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    fn web_service() -> ServiceInfo {
        ServiceInfo {
            port: Port::new(8080).unwrap(),
            transport_label: "HTTP-ALT".to_string(),
            detail: "200 | nginx | Welcome".to_string(),
            link: Some("http://127.0.0.1:8080".to_string()),
        }
    }

    fn render(report: &ScanReport) -> String {
        let mut buf = Vec::new();
        write_plain(&mut buf, report).unwrap();
        console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).into_owned()
    }

    #[test]
    fn test_discovery_line() {
        assert_eq!(
            discovery_line(&web_service()),
            "8080 | HTTP-ALT | 200 | nginx | Welcome -> http://127.0.0.1:8080"
        );

        let ssh = ServiceInfo {
            port: Port::new(22).unwrap(),
            transport_label: "SSH".to_string(),
            detail: "SSH-2.0-OpenSSH_8.9".to_string(),
            link: None,
        };
        assert_eq!(discovery_line(&ssh), "22 | SSH | SSH-2.0-OpenSSH_8.9");
    }

    #[test]
    fn test_plain_report_lists_services() {
        let target = ScanTarget::from(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let assembler = ReportAssembler::new(&target, 2, false);
        assembler.record(PortOutcome::new(
            Port::new(8080).unwrap(),
            "HTTP-ALT",
            ProbeOutcome::Open(web_service()),
        ));
        assembler.record(PortOutcome::new(Port::new(81).unwrap(), "CUSTOM", ProbeOutcome::Closed));

        let text = render(&assembler.finalize(Duration::from_millis(2500), false));
        assert!(text.contains("2 of 2 ports scanned in 2.50s"));
        assert!(text.contains("1 open, 1 closed, 0 timed out"));
        assert!(text.contains("HTTP-ALT"));
        assert!(text.contains("200 | nginx | Welcome -> http://127.0.0.1:8080"));
        assert!(!text.contains("No open ports found."));
        assert!(!text.contains("interrupted"));
    }

    #[test]
    fn test_plain_report_empty() {
        let target = ScanTarget::from(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let assembler = ReportAssembler::new(&target, 10, false);
        assembler.record(PortOutcome::new(Port::new(81).unwrap(), "CUSTOM", ProbeOutcome::TimedOut));

        let text = render(&assembler.finalize(Duration::ZERO, true));
        assert!(text.contains("No open ports found."));
        assert!(text.contains("Scan interrupted"));
        assert!(!text.contains("PORT"));
    }
}
