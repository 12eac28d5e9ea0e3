//! Scanner abstractions.
//!
//! Defines the outcome types every probe produces and the capabilities the
//! engine is handed instead of reaching for the OS directly: a socket
//! factory, a clock and a service-name resolver. Tests substitute fakes for
//! all three.

use crate::services;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::types::Port;

/// What was learned about an open port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// The open port.
    pub port: Port,
    /// Well-known service name (uppercase) or "CUSTOM".
    pub transport_label: String,
    /// Banner text, `"status | server | title"`, or "OPEN".
    pub detail: String,
    /// URL that produced a parsed web response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Result of probing a single port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Connection refused, reset or unroutable.
    Closed,
    /// Connect deadline elapsed.
    TimedOut,
    /// Connected; carries whatever the sniffer identified.
    Open(ServiceInfo),
}

impl ProbeOutcome {
    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// The identified service, for open ports.
    pub fn service(&self) -> Option<&ServiceInfo> {
        match self {
            Self::Open(info) => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::TimedOut => write!(f, "timeout"),
            Self::Open(_) => write!(f, "open"),
        }
    }
}

/// A recorded outcome together with the port it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOutcome {
    pub port: Port,
    /// Label from the scan's service resolver, for every state.
    pub service: String,
    pub outcome: ProbeOutcome,
}

impl PortOutcome {
    pub fn new(port: Port, service: impl Into<String>, outcome: ProbeOutcome) -> Self {
        Self {
            port,
            service: service.into(),
            outcome,
        }
    }
}

/// Socket factory used for every outbound connection of a scan.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The connected stream type.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a connection. Deadlines are applied by the caller.
    async fn connect(&self, addr: SocketAddr) -> io::Result<Self::Stream>;
}

/// Plain OS TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }
}

/// Source of monotonic time for elapsed measurements.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Maps a port to its registered service name.
pub trait ServiceResolver: Send + Sync {
    fn service_name(&self, port: u16) -> Option<String>;

    /// Uppercased service name, or "CUSTOM" when none is registered.
    fn label(&self, port: u16) -> String {
        self.service_name(port)
            .map(|name| name.to_uppercase())
            .unwrap_or_else(|| services::CUSTOM_LABEL.to_string())
    }
}

/// Resolver backed by the built-in well-known services table.
#[derive(Debug, Clone, Copy, Default)]
pub struct WellKnownServices;

impl ServiceResolver for WellKnownServices {
    fn service_name(&self, port: u16) -> Option<String> {
        services::get_service_name(port).map(str::to_string)
    }
}

/// Everything the engine needs from the outside world.
pub struct Capabilities<C: Connector = TcpConnector> {
    pub connector: C,
    pub clock: Arc<dyn Clock>,
    pub services: Arc<dyn ServiceResolver>,
}

impl<C: Connector> Capabilities<C> {
    /// Real clock and service table around the given connector.
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            clock: Arc::new(SystemClock),
            services: Arc::new(WellKnownServices),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the service resolver.
    pub fn with_services(mut self, services: Arc<dyn ServiceResolver>) -> Self {
        self.services = services;
        self
    }
}

impl Default for Capabilities<TcpConnector> {
    fn default() -> Self {
        Self::with_connector(TcpConnector)
    }
}

/// Receives incremental scan events, independently of report assembly.
///
/// Called from probe tasks, possibly concurrently.
pub trait ScanObserver: Send + Sync {
    /// An open port was identified.
    fn on_open(&self, _service: &ServiceInfo) {}

    /// One more port finished; `current` of `total` are done.
    fn on_progress(&self, _current: usize, _total: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}
