//! TCP connect probe.
//!
//! Performs a standard TCP connect using the injected [`Connector`] and
//! classifies the result. No retries: every port is attempted exactly once.

use crate::scanner::traits::Connector;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::trace;

/// Result of a single connect attempt.
#[derive(Debug)]
pub enum ConnectOutcome<S> {
    /// Handshake completed; the caller owns the stream.
    Connected(S),
    /// Refused, reset, unroutable or otherwise failed.
    Unreachable(io::ErrorKind),
    /// The deadline elapsed first.
    Timeout,
    /// The local host ran out of sockets or memory.
    Exhausted(io::Error),
}

/// Attempt a TCP connection to `addr`, bounded by `deadline`.
pub async fn connect<C: Connector>(
    connector: &C,
    addr: SocketAddr,
    deadline: Duration,
) -> ConnectOutcome<C::Stream> {
    match timeout(deadline, connector.connect(addr)).await {
        Ok(Ok(stream)) => ConnectOutcome::Connected(stream),
        Ok(Err(e)) if is_exhaustion(&e) => ConnectOutcome::Exhausted(e),
        Ok(Err(e)) => {
            trace!(%addr, error = %e, "connect failed");
            ConnectOutcome::Unreachable(e.kind())
        }
        Err(_) => ConnectOutcome::Timeout,
    }
}

/// Errors that mean the scan itself cannot continue, not that the port is closed.
fn is_exhaustion(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::OutOfMemory {
        return true;
    }
    // EMFILE / ENFILE
    #[cfg(unix)]
    {
        matches!(e.raw_os_error(), Some(23) | Some(24))
    }
    // WSAEMFILE / WSAENOBUFS
    #[cfg(windows)]
    {
        matches!(e.raw_os_error(), Some(10024) | Some(10055))
    }
    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}
