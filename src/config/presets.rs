//! Built-in port presets.
//!
//! Presets give names to port specifications that are tedious to type.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{expand, PortError, PortSpec};

/// A named port specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPreset {
    pub name: &'static str,
    pub description: &'static str,
    /// Port specification in `expand` syntax.
    pub ports: &'static str,
}

const PRESETS: &[PortPreset] = &[
    PortPreset {
        name: "common",
        description: "Frequently exposed services",
        ports: "21,22,23,25,53,80,110,143,443,445,1433,1521,3306,3389,5432,6379,8080,8888,27017",
    },
    PortPreset {
        name: "web",
        description: "Common web service ports",
        ports: "80,443,8000,8080,8443,9000,9090,3000",
    },
    PortPreset {
        name: "system",
        description: "Privileged ports",
        ports: "1-1024",
    },
    PortPreset {
        name: "top100",
        description: "The 100 most commonly open TCP ports",
        ports: "7,9,13,21-23,25,26,37,53,79-81,88,106,110,111,113,119,135,139,143,144,179,199,\
                389,427,443-445,465,513-515,543,544,548,554,587,631,646,873,990,993,995,\
                1025-1029,1110,1433,1720,1723,1755,1900,2000,2001,2049,2121,2717,3000,3128,\
                3306,3389,3986,4899,5000,5009,5051,5060,5101,5190,5357,5432,5631,5666,5800,\
                5900,6000,6001,6646,7070,8000,8008,8009,8080,8081,8443,8888,9100,9999,10000,\
                32768,49152-49157",
    },
    PortPreset {
        name: "full",
        description: "Every TCP port",
        ports: "1-65535",
    },
];

impl PortPreset {
    /// Every built-in preset.
    pub fn all() -> &'static [PortPreset] {
        PRESETS
    }

    /// Look up a preset by name, ignoring case.
    pub fn find(name: &str) -> ConfigResult<&'static PortPreset> {
        PRESETS
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    /// Expand the preset's ports.
    pub fn spec(&self) -> Result<PortSpec, PortError> {
        expand(self.ports)
    }
}
