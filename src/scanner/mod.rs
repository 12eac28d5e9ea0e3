//! Scanner module - coordinates concurrent port probes.
//!
//! Every port gets its own task running connect -> sniff -> record. A
//! semaphore bounds how many tasks (and therefore sockets) exist at once, so
//! a full 1-65535 scan has the same socket footprint as a 500 port one.
//! Results are recorded in completion order.

pub mod connect;
pub mod rate_limiter;
pub mod report;
pub mod traits;

use crate::banner::sniff;
use crate::error::{ScanError, ScanResult};
use crate::types::{expand, Port, PortSpec, ScanTarget};
use connect::{connect, ConnectOutcome};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub use rate_limiter::RateLimiter;
pub use report::{ReportAssembler, ScanReport};
pub use traits::{
    Capabilities, Clock, Connector, NoopObserver, PortOutcome, ProbeOutcome, ScanObserver,
    ServiceInfo, ServiceResolver, SystemClock, TcpConnector, WellKnownServices,
};

/// Tunables for a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Deadline for each TCP connect.
    pub connect_timeout: Duration,
    /// How long to wait for an unsolicited banner.
    pub sniff_window: Duration,
    /// Deadline for each web protocol attempt.
    pub web_timeout: Duration,
    /// Maximum probes in flight.
    pub concurrency_limit: usize,
    /// Connect attempts per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Keep closed and timed-out outcomes in the report entries.
    pub retain_closed: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(1000),
            sniff_window: Duration::from_millis(500),
            web_timeout: Duration::from_millis(1200),
            concurrency_limit: 500,
            rate_limit: 0,
            retain_closed: false,
        }
    }
}

impl ScanOptions {
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    pub fn with_closed(mut self) -> Self {
        self.retain_closed = true;
        self
    }
}

/// Immutable per-scanner state shared by all probe tasks.
struct Probe<C: Connector> {
    target: ScanTarget,
    options: ScanOptions,
    caps: Capabilities<C>,
}

/// State of one scan invocation, shared by its probe tasks.
struct Run {
    assembler: ReportAssembler,
    observer: Arc<dyn ScanObserver>,
    total: usize,
    rate: Option<RateLimiter>,
    /// Set once by the first task that cannot open a socket at all.
    fatal: OnceLock<String>,
    /// Stops the scan without cancelling the caller's token.
    abort: CancellationToken,
}

/// Scans one target with a fixed set of options and capabilities.
pub struct Scanner<C: Connector = TcpConnector> {
    probe: Arc<Probe<C>>,
}

impl Scanner<TcpConnector> {
    /// Scanner using real sockets, the system clock and the built-in service table.
    pub fn new(target: ScanTarget, options: ScanOptions) -> Self {
        Self::with_capabilities(target, options, Capabilities::default())
    }
}

impl<C: Connector> Scanner<C> {
    pub fn with_capabilities(target: ScanTarget, options: ScanOptions, caps: Capabilities<C>) -> Self {
        Self {
            probe: Arc::new(Probe {
                target,
                options,
                caps,
            }),
        }
    }

    pub fn target(&self) -> &ScanTarget {
        &self.probe.target
    }

    pub fn options(&self) -> &ScanOptions {
        &self.probe.options
    }

    /// Probe every port in `ports`.
    ///
    /// Cancelling `cancel` stops new probes, abandons in-flight ones (closing
    /// their sockets) and returns the outcomes recorded so far with
    /// `interrupted` set.
    pub async fn scan(
        &self,
        ports: &PortSpec,
        observer: Arc<dyn ScanObserver>,
        cancel: CancellationToken,
    ) -> ScanResult<ScanReport> {
        let options = &self.probe.options;
        if options.concurrency_limit == 0 {
            return Err(ScanError::InvalidConfig(
                "concurrency limit must be at least 1".to_string(),
            ));
        }

        let clock = Arc::clone(&self.probe.caps.clock);
        let started = clock.now();
        let total = ports.len();

        let run = Arc::new(Run {
            assembler: ReportAssembler::new(&self.probe.target, total, options.retain_closed),
            observer,
            total,
            rate: RateLimiter::new(options.rate_limit),
            fatal: OnceLock::new(),
            abort: cancel.child_token(),
        });

        info!(
            target = %self.probe.target,
            ports = total,
            concurrency = options.concurrency_limit,
            "scan started"
        );

        let semaphore = Arc::new(Semaphore::new(options.concurrency_limit));
        let mut tasks = JoinSet::new();

        for port in ports.iter() {
            let permit = tokio::select! {
                biased;
                _ = run.abort.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let probe = Arc::clone(&self.probe);
            let run = Arc::clone(&run);
            tasks.spawn(async move {
                // Held until the probe finishes or is aborted.
                let _permit = permit;
                probe_port(&probe, &run, port).await;
            });

            while let Some(joined) = tasks.try_join_next() {
                log_join_failure(joined);
            }
        }

        loop {
            tokio::select! {
                biased;
                _ = run.abort.cancelled() => {
                    debug!(in_flight = tasks.len(), "abandoning in-flight probes");
                    tasks.shutdown().await;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(joined) => log_join_failure(joined),
                    None => break,
                },
            }
        }

        let elapsed = clock.now().saturating_duration_since(started);

        if let Some(reason) = run.fatal.get() {
            return Err(ScanError::ResourceExhausted(reason.clone()));
        }

        let interrupted = cancel.is_cancelled() && run.assembler.scanned() < total;
        let report = run.assembler.finalize(elapsed, interrupted);

        info!(
            open = report.open_count,
            scanned = report.scanned,
            elapsed_ms = report.elapsed_ms,
            interrupted,
            "scan finished"
        );
        Ok(report)
    }
}

/// Connect, sniff and record a single port.
async fn probe_port<C: Connector>(probe: &Probe<C>, run: &Run, port: Port) {
    if let Some(rate) = &run.rate {
        rate.wait().await;
    }

    let addr = SocketAddr::new(probe.target.ip, port.as_u16());
    let outcome = match connect(&probe.caps.connector, addr, probe.options.connect_timeout).await {
        ConnectOutcome::Connected(stream) => {
            debug!(%port, "port open, sniffing");
            ProbeOutcome::Open(sniff(stream, &probe.target, port, &probe.options, &probe.caps).await)
        }
        ConnectOutcome::Unreachable(kind) => {
            trace!(%port, ?kind, "port closed");
            ProbeOutcome::Closed
        }
        ConnectOutcome::Timeout => ProbeOutcome::TimedOut,
        ConnectOutcome::Exhausted(e) => {
            warn!(%port, error = %e, "cannot open sockets, aborting scan");
            let _ = run.fatal.set(e.to_string());
            run.abort.cancel();
            return;
        }
    };

    let service = match &outcome {
        ProbeOutcome::Open(info) => {
            run.observer.on_open(info);
            info.transport_label.clone()
        }
        _ => probe.caps.services.label(port.as_u16()),
    };
    run.assembler
        .record_with(PortOutcome::new(port, service, outcome), |current| {
            run.observer.on_progress(current, run.total)
        });
}

fn log_join_failure(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            warn!(error = %e, "probe task panicked");
        }
    }
}

/// Expand `port_spec` and scan `target` with real sockets.
pub async fn scan(
    target: ScanTarget,
    port_spec: &str,
    options: ScanOptions,
    observer: Arc<dyn ScanObserver>,
    cancel: CancellationToken,
) -> ScanResult<ScanReport> {
    let ports = expand(port_spec)?;
    Scanner::new(target, options).scan(&ports, observer, cancel).await
}
