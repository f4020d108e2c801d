use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::platform;

/// Errors raised while loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the config directory for this platform")]
    NoConfigDir,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub export: ExportConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Which capture strategy drives the listening toggle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Single GET on start, then idle until stopped
    Fetch,
    /// Repeated GET on a fixed interval
    #[default]
    Poll,
    /// Newline-delimited JSON event stream
    Push,
    /// Built-in sample data
    Fixture,
}

impl CaptureMode {
    pub fn all() -> &'static [CaptureMode] {
        &[
            CaptureMode::Fetch,
            CaptureMode::Poll,
            CaptureMode::Push,
            CaptureMode::Fixture,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CaptureMode::Fetch => "fetch",
            CaptureMode::Poll => "poll",
            CaptureMode::Push => "push",
            CaptureMode::Fixture => "fixture",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaptureMode::all()
            .iter()
            .copied()
            .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = CaptureMode::all().iter().map(|m| m.name()).collect();
                format!("unknown capture mode '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub mode: CaptureMode,
    /// Target URL; empty until the user enters one
    pub url: String,
    pub poll_interval_secs: u64,
    /// CORS-relay template. `{url}` is replaced by the encoded target URL,
    /// otherwise the encoded target is appended.
    pub relay_url: Option<String>,
    /// Path of the push endpoint, joined onto the target URL's origin
    pub events_path: String,
    pub request_timeout_secs: Option<u64>,
}

impl CaptureConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::default(),
            url: String::new(),
            poll_interval_secs: 5,
            relay_url: None,
            events_path: "/api/webhooks/events".to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: Option<PathBuf>,
}

impl ExportConfig {
    /// Configured directory, else the platform download directory
    pub fn directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(platform::default_export_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn file(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(platform::default_log_path)
    }
}

impl Config {
    /// Loads the config from the platform config path.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = platform::get_config_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("config.toml")).unwrap();

        assert_eq!(config.capture.mode, CaptureMode::Poll);
        assert_eq!(config.capture.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.capture.events_path, "/api/webhooks/events");
        assert!(config.capture.url.is_empty());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[capture]\nmode = \"push\"\nurl = \"http://localhost:9000\"\n\n[export]\ndirectory = \"/tmp/out\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.capture.mode, CaptureMode::Push);
        assert_eq!(config.capture.url, "http://localhost:9000");
        assert_eq!(config.capture.poll_interval_secs, 5);
        assert_eq!(config.export.directory(), PathBuf::from("/tmp/out"));
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_mode_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[capture]\nmode = \"carrier-pigeon\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_capture_mode_from_str() {
        assert_eq!("push".parse::<CaptureMode>().unwrap(), CaptureMode::Push);
        assert_eq!(" Fixture ".parse::<CaptureMode>().unwrap(), CaptureMode::Fixture);
        let err = "sse".parse::<CaptureMode>().unwrap_err();
        assert!(err.contains("fetch, poll, push, fixture"));
    }

    #[test]
    fn test_poll_interval_has_floor() {
        let capture = CaptureConfig {
            poll_interval_secs: 0,
            ..CaptureConfig::default()
        };
        assert_eq!(capture.poll_interval(), Duration::from_secs(1));
    }
}
