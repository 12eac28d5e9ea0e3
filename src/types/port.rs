//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortSpec` is the expanded, sorted and deduplicated set of ports a scan
//! will probe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value.to_string()))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port specification parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(String),
    #[error("invalid port number: '{0}'")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// An inclusive range of ports, as written in a specification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start > end {
            Err(PortError::InvalidRange(start.0, end.0))
        } else {
            Ok(Self { start, end })
        }
    }

    fn iter(self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

/// An expanded port specification: strictly increasing, no duplicates,
/// never empty.
///
/// Supports formats like:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "1-1000"
/// - Mixed: "22,80,443,8000-9000"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSpec {
    ports: Vec<Port>,
}

impl PortSpec {
    /// Build a spec from arbitrary ports, sorting and deduplicating them.
    pub fn from_ports(ports: impl IntoIterator<Item = Port>) -> Result<Self, PortError> {
        let mut ports: Vec<Port> = ports.into_iter().collect();
        if ports.is_empty() {
            return Err(PortError::Empty);
        }
        ports.sort_unstable();
        ports.dedup();
        Ok(Self { ports })
    }

    /// All ports in ascending order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Number of unique ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Always false for a constructed spec; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Iterate over the ports in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Port> + '_ {
        self.ports.iter().copied()
    }
}

/// Expand a textual port specification into a [`PortSpec`].
pub fn expand(spec: &str) -> Result<PortSpec, PortError> {
    spec.parse()
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut ports = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            match part.split_once('-') {
                // A leading '-' is a negative number, not a range.
                Some((start, end)) if !start.trim().is_empty() => {
                    let range = PortRange::new(parse_port(start)?, parse_port(end)?)?;
                    ports.extend(range.iter());
                }
                _ => ports.push(parse_port(part)?),
            }
        }

        Self::from_ports(ports)
    }
}

fn parse_port(token: &str) -> Result<Port, PortError> {
    let token = token.trim();
    let value: i64 = token
        .parse()
        .map_err(|_| PortError::InvalidFormat(token.to_string()))?;
    u16::try_from(value)
        .ok()
        .and_then(Port::new)
        .ok_or_else(|| PortError::OutOfRange(token.to_string()))
}

impl fmt::Display for PortSpec {
    /// Renders the spec compactly, folding consecutive ports into ranges.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let mut iter = self.ports.iter().map(|p| p.0).peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end.wrapping_add(1))) && end < Port::MAX {
                end += 1;
                iter.next();
            }
            if start == end {
                parts.push(start.to_string());
            } else {
                parts.push(format!("{}-{}", start, end));
            }
        }
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(spec: &PortSpec) -> Vec<u16> {
        spec.iter().map(Port::as_u16).collect()
    }

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(65535).is_some());
        assert!(Port::try_from(0).is_err());
    }

    #[test]
    fn test_expand_mixed() {
        let spec = expand("22,80,443,8000-8010").unwrap();
        assert_eq!(spec.len(), 14);
        assert_eq!(raw(&spec)[..3], [22, 80, 443]);
    }

    #[test]
    fn test_expand_is_sorted_union() {
        let spec = expand("9000, 10-12,5 ,11-14,5").unwrap();
        assert_eq!(raw(&spec), vec![5, 10, 11, 12, 13, 14, 9000]);
        assert!(raw(&spec).windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_expand_single_port_range() {
        assert_eq!(raw(&expand("1-1").unwrap()), vec![1]);
        assert_eq!(raw(&expand("65535-65535").unwrap()), vec![65535]);
        assert_eq!(expand("1-65535").unwrap().len(), 65535);
    }

    #[test]
    fn test_expand_rejects_out_of_range() {
        assert!(matches!(expand("0"), Err(PortError::OutOfRange(_))));
        assert!(matches!(expand("65536"), Err(PortError::OutOfRange(_))));
        assert!(matches!(expand("-5"), Err(PortError::OutOfRange(_))));
        assert!(matches!(expand("0-10"), Err(PortError::OutOfRange(_))));
        assert!(matches!(expand("80,70000"), Err(PortError::OutOfRange(_))));
    }

    #[test]
    fn test_expand_rejects_inverted_range() {
        assert_eq!(expand("100-50"), Err(PortError::InvalidRange(100, 50)));
    }

    #[test]
    fn test_expand_rejects_garbage() {
        assert!(matches!(expand("abc"), Err(PortError::InvalidFormat(_))));
        assert!(matches!(expand("80,,443"), Err(PortError::InvalidFormat(_))));
        assert!(matches!(expand("1-2-3"), Err(PortError::InvalidFormat(_))));
        assert_eq!(expand("   "), Err(PortError::Empty));
    }

    #[test]
    fn test_display_folds_ranges() {
        let spec = expand("1-3,80,443,444").unwrap();
        assert_eq!(spec.to_string(), "1-3,80,443-444");
    }
}
