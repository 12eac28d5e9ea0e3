//! Active web probing.
//!
//! Used when an open port stays silent: sends a minimal `GET /` over HTTP and
//! HTTPS (order depends on the port) and summarizes the first response as
//! `"<status> | <server> | <title>"`. Any failure inside an attempt only moves
//! on to the next protocol; the probe itself never fails.

use crate::banner::{decode_lossy, truncate_chars};
use crate::scanner::traits::Connector;
use crate::types::ScanTarget;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// Maximum response body bytes inspected for a title.
const MAX_BODY: usize = 1024;

/// Maximum header bytes read before giving up on finding the body.
const MAX_HEAD: usize = 8192;

/// Maximum characters of the `Server` header kept in the summary.
const SERVER_CHARS: usize = 10;

/// Maximum characters of the page title kept in the summary.
const TITLE_CHARS: usize = 20;

/// Detail reported when no protocol could be identified.
pub const UNIDENTIFIED: &str = "OPEN";

/// Summary of a web probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebOutcome {
    pub detail: String,
    pub link: Option<String>,
}

impl WebOutcome {
    /// An open port whose protocol could not be identified.
    pub fn unidentified() -> Self {
        Self {
            detail: UNIDENTIFIED.to_string(),
            link: None,
        }
    }
}

/// Application protocol attempted by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Protocols to try, in order, for a port.
pub fn protocol_order(port: u16) -> [Scheme; 2] {
    if port == 443 {
        [Scheme::Https, Scheme::Http]
    } else {
        [Scheme::Http, Scheme::Https]
    }
}

/// `host[:port]` as used in the URL and the `Host` header.
fn authority(scheme: Scheme, target: &ScanTarget, port: u16) -> String {
    if port == scheme.default_port() {
        target.url_host()
    } else {
        format!("{}:{}", target.url_host(), port)
    }
}

/// The URL a probe attempt represents.
pub fn probe_url(scheme: Scheme, target: &ScanTarget, port: u16) -> String {
    format!("{}://{}", scheme.as_str(), authority(scheme, target, port))
}

/// Probe `target:port` as a web server.
pub async fn probe_web<C: Connector>(
    connector: &C,
    target: &ScanTarget,
    port: u16,
    deadline: Duration,
) -> WebOutcome {
    for scheme in protocol_order(port) {
        let url = probe_url(scheme, target, port);
        let expires = Instant::now() + deadline;

        match attempt(connector, target, port, scheme, expires).await {
            Ok(response) => {
                debug!(%url, status = response.status, "web probe identified service");
                return WebOutcome {
                    detail: response.summary(),
                    link: Some(url),
                };
            }
            Err(e) => debug!(%url, error = %e, "web probe attempt failed"),
        }
    }

    WebOutcome::unidentified()
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("tls: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("deadline elapsed")]
    Timeout,
    #[error("response is not HTTP")]
    NotHttp,
}

async fn attempt<C: Connector>(
    connector: &C,
    target: &ScanTarget,
    port: u16,
    scheme: Scheme,
    expires: Instant,
) -> Result<HttpResponse, AttemptError> {
    let addr = SocketAddr::new(target.ip, port);
    let request = build_request(scheme, target, port);

    let stream = timeout_at(expires, connector.connect(addr))
        .await
        .map_err(|_| AttemptError::Timeout)??;

    match scheme {
        Scheme::Http => exchange(stream, &request, expires).await,
        Scheme::Https => {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .use_sni(!target.host_is_ip())
                .build()?;
            let tls = tokio_native_tls::TlsConnector::from(tls);
            let stream = timeout_at(expires, tls.connect(&target.host, stream))
                .await
                .map_err(|_| AttemptError::Timeout)??;
            exchange(stream, &request, expires).await
        }
    }
}

fn build_request(scheme: Scheme, target: &ScanTarget, port: u16) -> Vec<u8> {
    format!(
        "GET / HTTP/1.0\r\nHost: {}\r\nUser-Agent: portlens/{}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        authority(scheme, target, port),
        env!("CARGO_PKG_VERSION"),
    )
    .into_bytes()
}

/// Send the request and read the response head plus the start of the body.
///
/// Running into the deadline after some bytes arrived is not a failure: a
/// slow body should not hide an identified status line.
async fn exchange<S>(mut stream: S, request: &[u8], expires: Instant) -> Result<HttpResponse, AttemptError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    timeout_at(expires, stream.write_all(request))
        .await
        .map_err(|_| AttemptError::Timeout)??;

    let mut buf = Vec::with_capacity(2048);
    let mut chunk = [0u8; 1024];
    loop {
        match timeout_at(expires, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                buf.extend_from_slice(&chunk[..n]);
                if response_complete(&buf) {
                    break;
                }
            }
            Ok(Err(e)) if buf.is_empty() => return Err(e.into()),
            Err(_) if buf.is_empty() => return Err(AttemptError::Timeout),
            // Truncated TLS close or slow body; parse what arrived.
            Ok(Err(_)) | Err(_) => break,
        }
    }

    HttpResponse::parse(&buf).ok_or(AttemptError::NotHttp)
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| i + 4)
        .or_else(|| buf.windows(2).position(|w| w == b"\n\n").map(|i| i + 2))
}

fn response_complete(buf: &[u8]) -> bool {
    match header_end(buf) {
        Some(end) => buf.len() - end >= MAX_BODY,
        None => buf.len() >= MAX_HEAD,
    }
}

/// The parts of an HTTP response the summary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub server: Option<String>,
    pub title: Option<String>,
}

impl HttpResponse {
    /// Parse raw response bytes. Returns `None` unless they start with a
    /// valid HTTP status line.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let (head, body) = match header_end(raw) {
            Some(end) => (&raw[..end], &raw[end..]),
            None => (raw, &[][..]),
        };
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines();

        let mut status_line = lines.next()?.split_whitespace();
        if !status_line.next()?.starts_with("HTTP/") {
            return None;
        }
        let code = status_line.next()?;
        if code.len() != 3 {
            return None;
        }
        let status: u16 = code.parse().ok()?;

        let server = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("server"))
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let body = decode_lossy(&body[..body.len().min(MAX_BODY)]);

        Some(Self {
            status,
            server,
            title: extract_title(&body),
        })
    }

    /// `"<status> | <server or Unk> | <title or N/A>"`.
    pub fn summary(&self) -> String {
        let server = self
            .server
            .as_deref()
            .map_or_else(|| "Unk".to_string(), |s| truncate_chars(s, SERVER_CHARS));
        let title = self
            .title
            .as_deref()
            .map_or_else(|| "N/A".to_string(), |t| truncate_chars(t, TITLE_CHARS));
        format!("{} | {} | {}", self.status, server, title)
    }
}

/// Text of the first `<title>` element, whitespace-collapsed.
///
/// Matching is ASCII case-insensitive. An unterminated title runs to the end
/// of the inspected body.
pub fn extract_title(body: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `body`.
    let lower = body.to_ascii_lowercase();

    let mut from = 0;
    let open = loop {
        let at = from + lower[from..].find("<title")?;
        let after = at + "<title".len();
        match lower.as_bytes().get(after) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => break after,
            _ => from = after,
        }
    };
    let content_start = open + lower[open..].find('>')? + 1;
    let content_end = lower[content_start..]
        .find("</title")
        .map_or(body.len(), |i| content_start + i);

    let title = body[content_start..content_end]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::traits::TcpConnector;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use tokio::net::TcpListener;

    fn localhost() -> ScanTarget {
        ScanTarget::from(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    /// Serve every connection: wait for a request, then reply with `reply`.
    async fn serve(reply: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    if let Ok(n) = socket.read(&mut buf).await {
                        if n > 0 {
                            let _ = socket.write_all(reply).await;
                        }
                    }
                });
            }
        });
        port
    }

    /// Serve HTTPS with a self-signed certificate; plaintext clients are dropped.
    async fn serve_tls(reply: &'static [u8]) -> u16 {
        let identity = native_tls::Identity::from_pkcs8(
            include_bytes!("../tests/fixtures/localhost-cert.pem"),
            include_bytes!("../tests/fixtures/localhost-key.pem"),
        )
        .unwrap();
        let acceptor =
            tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(identity).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    let Ok(mut stream) = acceptor.accept(socket).await else {
                        return;
                    };
                    let mut buf = [0u8; 1024];
                    if let Ok(n) = stream.read(&mut buf).await {
                        if n > 0 {
                            let _ = stream.write_all(reply).await;
                            let _ = stream.shutdown().await;
                        }
                    }
                });
            }
        });
        port
    }

    #[test]
    fn test_protocol_order() {
        assert_eq!(protocol_order(443), [Scheme::Https, Scheme::Http]);
        assert_eq!(protocol_order(80), [Scheme::Http, Scheme::Https]);
        assert_eq!(protocol_order(8443), [Scheme::Http, Scheme::Https]);
    }

    #[test]
    fn test_probe_url_forms() {
        let target = ScanTarget::new("example.com", IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(probe_url(Scheme::Http, &target, 80), "http://example.com");
        assert_eq!(probe_url(Scheme::Https, &target, 443), "https://example.com");
        assert_eq!(probe_url(Scheme::Https, &target, 80), "https://example.com:80");
        assert_eq!(probe_url(Scheme::Http, &target, 8080), "http://example.com:8080");

        let v6 = ScanTarget::from(IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(probe_url(Scheme::Http, &v6, 8080), "http://[::1]:8080");
    }

    #[test]
    fn test_parse_full_response() {
        let raw = b"HTTP/1.1 200 OK\r\nServer: nginx/1.25.3-alpine\r\nContent-Type: text/html\r\n\r\n\
                    <html><head><TITLE>\n  Welcome   to\tnginx on Debian!\n</TITLE></head></html>";
        let response = HttpResponse::parse(raw).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.server.as_deref(), Some("nginx/1.25.3-alpine"));
        assert_eq!(response.title.as_deref(), Some("Welcome to nginx on Debian!"));
        assert_eq!(response.summary(), "200 | nginx/1.25 | Welcome to nginx on ");
    }

    #[test]
    fn test_parse_defaults() {
        let response = HttpResponse::parse(b"HTTP/1.0 404 Not Found\r\n\r\nnope").unwrap();
        assert_eq!(response.summary(), "404 | Unk | N/A");
    }

    #[test]
    fn test_parse_head_only() {
        let response = HttpResponse::parse(b"HTTP/1.1 301 Moved\r\nserver: caddy").unwrap();
        assert_eq!(response.summary(), "301 | caddy | N/A");
    }

    #[test]
    fn test_parse_rejects_non_http() {
        assert!(HttpResponse::parse(b"SSH-2.0-OpenSSH_8.9\r\n").is_none());
        assert!(HttpResponse::parse(b"HTTP/1.1 OK\r\n\r\n").is_none());
        assert!(HttpResponse::parse(b"").is_none());
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("<title>Hello</title>").as_deref(), Some("Hello"));
        assert_eq!(
            extract_title("<Title lang=\"en\">Router   Login</tiTle>").as_deref(),
            Some("Router Login")
        );
        assert_eq!(extract_title("<titlebar>x</titlebar>"), None);
        assert_eq!(extract_title("<title>  </title>"), None);
        assert_eq!(extract_title("<title>cut off").as_deref(), Some("cut off"));
        assert_eq!(extract_title("no markup"), None);
    }

    #[tokio::test]
    async fn test_probe_identifies_http() {
        let port = serve(
            b"HTTP/1.0 200 OK\r\nServer: TestSrv\r\n\r\n<html><title>Hello</title></html>",
        )
        .await;

        let outcome = probe_web(&TcpConnector, &localhost(), port, Duration::from_secs(2)).await;
        assert_eq!(outcome.detail, "200 | TestSrv | Hello");
        assert_eq!(outcome.link, Some(format!("http://127.0.0.1:{}", port)));
    }

    #[tokio::test]
    async fn test_https_fallback_identifies_tls_server() {
        let port =
            serve_tls(b"HTTP/1.1 200 OK\r\nServer: tlssrv\r\n\r\n<html><title>Secure</title></html>")
                .await;

        let outcome = probe_web(&TcpConnector, &localhost(), port, Duration::from_secs(3)).await;
        assert_eq!(outcome.detail, "200 | tlssrv | Secure");
        assert_eq!(outcome.link, Some(format!("https://127.0.0.1:{}", port)));
    }

    #[tokio::test]
    async fn test_https_link_uses_hostname() {
        let port = serve_tls(b"HTTP/1.1 403 Forbidden\r\n\r\n").await;
        let target = ScanTarget::new("localhost", IpAddr::V4(Ipv4Addr::LOCALHOST));

        let outcome = probe_web(&TcpConnector, &target, port, Duration::from_secs(3)).await;
        assert_eq!(outcome.detail, "403 | Unk | N/A");
        assert_eq!(outcome.link, Some(format!("https://localhost:{}", port)));
    }

    #[tokio::test]
    async fn test_probe_non_http_is_unidentified() {
        let port = serve(b"220 not a web server\r\n").await;

        let outcome = probe_web(&TcpConnector, &localhost(), port, Duration::from_secs(1)).await;
        assert_eq!(outcome, WebOutcome::unidentified());
    }

    #[tokio::test]
    async fn test_probe_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let started = std::time::Instant::now();
        let outcome =
            probe_web(&TcpConnector, &localhost(), port, Duration::from_millis(150)).await;
        assert_eq!(outcome.detail, UNIDENTIFIED);
        assert!(outcome.link.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
