//! CSV output formatting.

use crate::scanner::{ProbeOutcome, ScanReport};
use std::io::{self, Write};

/// Print results in CSV format.
pub fn print_csv(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    write_csv(stdout.lock(), report)
}

/// One row per recorded entry, in completion order.
pub fn write_csv<W: Write>(out: W, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["port", "service", "detail", "link"])?;

    for entry in &report.entries {
        let port = entry.port.to_string();
        match &entry.outcome {
            ProbeOutcome::Open(info) => wtr.write_record([
                port.as_str(),
                info.transport_label.as_str(),
                info.detail.as_str(),
                info.link.as_deref().unwrap_or(""),
            ])?,
            other => wtr.write_record([
                port.as_str(),
                entry.service.as_str(),
                other.to_string().as_str(),
                "",
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
