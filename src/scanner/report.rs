//! Scan report assembly.
//!
//! Probe tasks record their outcomes into a shared [`ReportAssembler`] as
//! they complete. Appends are serialized under a single lock, so the entry
//! order is the completion order and no entry is ever duplicated or torn.

use crate::scanner::traits::{PortOutcome, ProbeOutcome, ServiceInfo};
use crate::types::ScanTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Final, immutable result of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Target as given by the user.
    pub target: String,
    /// Address that was scanned.
    pub ip_address: String,
    /// When the scan was started.
    pub started_at: DateTime<Utc>,
    /// Ports requested.
    pub total: usize,
    /// Ports whose probe completed.
    pub scanned: usize,
    pub open_count: usize,
    pub closed_count: usize,
    pub timed_out_count: usize,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
    /// The scan was cancelled before every port completed.
    pub interrupted: bool,
    /// Recorded outcomes in completion order, not port order.
    pub entries: Vec<PortOutcome>,
}

impl ScanReport {
    /// Identified services, in discovery order.
    pub fn open_services(&self) -> impl Iterator<Item = &ServiceInfo> {
        self.entries.iter().filter_map(|e| e.outcome.service())
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Get a short summary of the scan.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) - {} open / {} scanned [{:.2}s]{}",
            self.target,
            self.ip_address,
            self.open_count,
            self.scanned,
            self.elapsed_ms as f64 / 1000.0,
            if self.interrupted { " (interrupted)" } else { "" }
        )
    }
}

#[derive(Debug)]
struct Assembly {
    target: String,
    ip_address: String,
    started_at: DateTime<Utc>,
    total: usize,
    retain_closed: bool,
    scanned: usize,
    open_count: usize,
    closed_count: usize,
    timed_out_count: usize,
    entries: Vec<PortOutcome>,
}

/// Shared, thread-safe builder for a [`ScanReport`].
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    inner: Arc<Mutex<Assembly>>,
}

impl ReportAssembler {
    /// Start a report for `total` ports. Closed and timed-out outcomes are
    /// only counted unless `retain_closed` is set.
    pub fn new(target: &ScanTarget, total: usize, retain_closed: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Assembly {
                target: target.host.clone(),
                ip_address: target.ip.to_string(),
                started_at: Utc::now(),
                total,
                retain_closed,
                scanned: 0,
                open_count: 0,
                closed_count: 0,
                timed_out_count: 0,
                entries: Vec::new(),
            })),
        }
    }

    // A panic while holding the lock cannot leave the counters half-updated,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Assembly> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an outcome. Returns how many ports have completed so far.
    pub fn record(&self, entry: PortOutcome) -> usize {
        self.record_with(entry, |_| ())
    }

    /// Append an outcome and call `notify` with the completed count before
    /// the lock is released, so successive notifications never go backwards.
    pub fn record_with<F: FnOnce(usize)>(&self, entry: PortOutcome, notify: F) -> usize {
        let mut report = self.lock();
        report.scanned += 1;

        let keep = match &entry.outcome {
            ProbeOutcome::Open(_) => {
                report.open_count += 1;
                true
            }
            ProbeOutcome::Closed => {
                report.closed_count += 1;
                report.retain_closed
            }
            ProbeOutcome::TimedOut => {
                report.timed_out_count += 1;
                report.retain_closed
            }
        };
        if keep {
            report.entries.push(entry);
        }

        let scanned = report.scanned;
        notify(scanned);
        scanned
    }

    /// Ports completed so far.
    pub fn scanned(&self) -> usize {
        self.lock().scanned
    }

    /// Copy of the entries recorded so far.
    pub fn snapshot(&self) -> Vec<PortOutcome> {
        self.lock().entries.clone()
    }

    /// Produce the immutable report from everything recorded so far.
    pub fn finalize(&self, elapsed: Duration, interrupted: bool) -> ScanReport {
        let report = self.lock();
        ScanReport {
            target: report.target.clone(),
            ip_address: report.ip_address.clone(),
            started_at: report.started_at,
            total: report.total,
            scanned: report.scanned,
            open_count: report.open_count,
            closed_count: report.closed_count,
            timed_out_count: report.timed_out_count,
            elapsed_ms: elapsed.as_millis() as u64,
            interrupted,
            entries: report.entries.clone(),
        }
    }
}
