//! JSON output formatting.

use crate::scanner::ScanReport;
use std::io::{self, Write};

/// Print results in JSON format.
pub fn print_json(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    write_json(&mut stdout.lock(), report)
}

pub fn write_json<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{PortOutcome, ProbeOutcome, ReportAssembler, ServiceInfo};
    use crate::types::{Port, ScanTarget};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    #[test]
    fn test_json_report() {
        let target = ScanTarget::from(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let assembler = ReportAssembler::new(&target, 3, false);
        assembler.record(PortOutcome::new(
            Port::new(22).unwrap(),
            "SSH",
            ProbeOutcome::Open(ServiceInfo {
                port: Port::new(22).unwrap(),
                transport_label: "SSH".to_string(),
                detail: "SSH-2.0-OpenSSH_8.9".to_string(),
                link: None,
            }),
        ));
        assembler.record(PortOutcome::new(Port::new(23).unwrap(), "TELNET", ProbeOutcome::Closed));
        let report = assembler.finalize(Duration::from_millis(42), false);

        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["ip_address"], "127.0.0.1");
        assert_eq!(value["scanned"], 2);
        assert_eq!(value["total"], 3);
        assert_eq!(value["elapsed_ms"], 42);
        assert_eq!(value["interrupted"], false);
        assert_eq!(value["entries"].as_array().unwrap().len(), 1);
        assert_eq!(value["entries"][0]["port"], 22);
        assert_eq!(value["entries"][0]["service"], "SSH");
        assert_eq!(value["entries"][0]["outcome"]["detail"], "SSH-2.0-OpenSSH_8.9");

        let parsed: ScanReport = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.entries, report.entries);
    }
}
