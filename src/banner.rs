//! Passive service sniffing.
//!
//! Listens briefly for data the service sends on its own (SSH, FTP, SMTP
//! greetings). Services that stay silent, which is what HTTP servers do while
//! waiting for a request, are handed to the web probe instead.

use crate::scanner::traits::{Capabilities, Connector, ServiceInfo};
use crate::scanner::ScanOptions;
use crate::types::{Port, ScanTarget};
use crate::web::{self, probe_web};
use tokio::io::AsyncReadExt;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Maximum bytes read for a banner.
pub const MAX_BANNER_SIZE: usize = 256;

/// Maximum characters of a banner kept in the detail.
const BANNER_CHARS: usize = 30;

/// Identify the service behind an open connection.
///
/// The stream is consumed and closed before any web probe starts.
pub async fn sniff<C: Connector>(
    mut stream: C::Stream,
    target: &ScanTarget,
    port: Port,
    options: &ScanOptions,
    caps: &Capabilities<C>,
) -> ServiceInfo {
    let transport_label = caps.services.label(port.as_u16());
    let mut buffer = [0u8; MAX_BANNER_SIZE];

    let received = match timeout(options.sniff_window, stream.read(&mut buffer)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => {
            debug!(%port, error = %e, "passive read failed");
            0
        }
        Err(_) => 0,
    };
    drop(stream);

    let (detail, link) = if received > 0 {
        trace!(%port, bytes = ?&buffer[..received], "banner received");
        let banner = sanitize_banner(&buffer[..received]);
        if banner.is_empty() {
            (web::UNIDENTIFIED.to_string(), None)
        } else {
            (banner, None)
        }
    } else {
        let outcome = probe_web(&caps.connector, target, port.as_u16(), options.web_timeout).await;
        (outcome.detail, outcome.link)
    };

    ServiceInfo {
        port,
        transport_label,
        detail,
        link,
    }
}

/// Decode bytes as UTF-8, dropping anything invalid.
pub(crate) fn decode_lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Keep at most `max` characters of `s`.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Turn raw banner bytes into a single display line.
fn sanitize_banner(data: &[u8]) -> String {
    let text: String = decode_lossy(data)
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&line, BANNER_CHARS)
}
