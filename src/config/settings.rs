//! Application settings and paths.
//!
//! Settings live in the platform configuration directory (XDG on Linux) as
//! `settings.json`. A missing file means defaults.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::ScanOptions;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portlens)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories for portlens.
    pub fn resolve() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "portlens", "portlens").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// User defaults for scans, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub connect_timeout_ms: u64,
    pub sniff_window_ms: u64,
    pub web_timeout_ms: u64,
    /// Maximum probes in flight.
    pub concurrency: usize,
    /// Connect attempts per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Preset used when no ports are given.
    pub default_preset: String,
    /// One of `plain`, `json`, `csv`.
    pub default_output_format: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let options = ScanOptions::default();
        Self {
            connect_timeout_ms: options.connect_timeout.as_millis() as u64,
            sniff_window_ms: options.sniff_window.as_millis() as u64,
            web_timeout_ms: options.web_timeout.as_millis() as u64,
            concurrency: options.concurrency_limit,
            rate_limit: options.rate_limit,
            default_preset: "common".to_string(),
            default_output_format: "plain".to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::resolve()?.settings_file();
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Convert to scan options, rejecting values no scan can run with.
    pub fn to_options(&self) -> ConfigResult<ScanOptions> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(ScanOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            sniff_window: Duration::from_millis(self.sniff_window_ms),
            web_timeout: Duration::from_millis(self.web_timeout_ms),
            concurrency_limit: self.concurrency,
            rate_limit: self.rate_limit,
            retain_closed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.concurrency, 500);
        assert_eq!(settings.connect_timeout_ms, 1000);
        assert_eq!(settings.default_preset, "common");
        assert_eq!(settings.to_options().unwrap(), ScanOptions::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"concurrency": 64, "default_output_format": "json"}}"#).unwrap();

        let settings = AppSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.concurrency, 64);
        assert_eq!(settings.default_output_format, "json");
        assert_eq!(settings.web_timeout_ms, 1200);
        assert_eq!(settings.to_options().unwrap().concurrency_limit, 64);
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "concurrency = 64").unwrap();

        assert!(matches!(
            AppSettings::load_from(file.path()),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppSettings::load_from(&dir.path().join("settings.json"));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let settings = AppSettings {
            concurrency: 0,
            ..AppSettings::default()
        };
        assert!(matches!(settings.to_options(), Err(ConfigError::Invalid(_))));
    }
}
