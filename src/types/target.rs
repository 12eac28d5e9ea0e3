//! Target specification types with hostname support.
//!
//! A scan runs against exactly one host. The host text is kept alongside the
//! resolved address because web probes need it for URLs, the `Host` header
//! and TLS SNI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A scan target that has been resolved to an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The original input (hostname or IP string).
    pub host: String,
    /// The resolved IP address.
    pub ip: IpAddr,
}

impl ScanTarget {
    /// Create a new scan target.
    pub fn new(host: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            host: host.into(),
            ip,
        }
    }

    /// Host text as it must appear inside a URL authority.
    pub fn url_host(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{}]", v6),
            _ => self.host.clone(),
        }
    }

    /// Whether the host text is a literal IP (no SNI can be sent).
    pub fn host_is_ip(&self) -> bool {
        self.host.parse::<IpAddr>().is_ok()
    }
}

impl From<IpAddr> for ScanTarget {
    fn from(ip: IpAddr) -> Self {
        Self::new(ip.to_string(), ip)
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.host, self.ip)
        }
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// A target as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A literal IP address.
    Single(IpAddr),
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        // Accept bracketed IPv6 as people copy it out of URLs.
        let unbracketed = s.trim_start_matches('[').trim_end_matches(']');

        if let Ok(ip) = unbracketed.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Resolve to a single scan target, taking the first DNS answer.
    pub async fn resolve(&self) -> Result<ScanTarget, TargetError> {
        match self {
            Self::Single(ip) => Ok(ScanTarget::from(*ip)),
            Self::Hostname(hostname) => {
                let resolver = TokioAsyncResolver::tokio(
                    ResolverConfig::default(),
                    ResolverOpts::default(),
                );

                let response = resolver.lookup_ip(hostname.as_str()).await.map_err(|e| {
                    TargetError::DnsResolutionFailed(hostname.clone(), e.to_string())
                })?;

                let ip = response
                    .iter()
                    .next()
                    .ok_or_else(|| TargetError::NoAddressesFound(hostname.clone()))?;
                Ok(ScanTarget::new(hostname.clone(), ip))
            }
        }
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().next().is_some_and(|c| c.is_alphanumeric())
            && label.chars().last().is_some_and(|c| c.is_alphanumeric())
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}
