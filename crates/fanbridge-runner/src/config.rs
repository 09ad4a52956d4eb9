//! Daemon configuration: YAML file plus CLI overrides.
//!
//! Precedence is flag > file > default. Only the port path and the catalog
//! file have no default; everything else runs out of the box.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use fanbridge_driver::DriveConfig;
use fanbridge_link::DEFAULT_BAUD;

/// Default location of the persisted state record.
const DEFAULT_STATE_FILE: &str = "fanbridge-state.json";

/// Default reconnect retry period in milliseconds.
const DEFAULT_RETRY_PERIOD_MS: u64 = 5000;

/// Configuration resolution failures.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Failed to read the config file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting without a default was provided nowhere.
    #[error("missing required setting '{0}' (pass the flag or set it in the config file)")]
    Missing(&'static str),
}

/// Raw YAML config file shape. Everything is optional; CLI flags win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Serial port path.
    pub port: Option<String>,
    /// Baud rate.
    pub baud: Option<u32>,
    /// Signal catalog JSON file.
    pub catalog: Option<PathBuf>,
    /// Persisted state file.
    pub state_file: Option<PathBuf>,
    /// Reconnect retry period in milliseconds.
    pub retry_period_ms: Option<u64>,
    /// Driver policy (debounce, pacing, retries, bands, signal names).
    pub driver: DriveConfig,
}

impl FileConfig {
    /// Load and parse a YAML config file.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let text = std::fs::read_to_string(path).map_err(|source| SetupError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| SetupError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// CLI-provided overrides.
#[derive(Debug, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub catalog: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
}

/// Fully resolved daemon settings.
#[derive(Debug)]
pub struct Settings {
    pub port: String,
    pub baud: u32,
    pub catalog: PathBuf,
    pub state_file: PathBuf,
    pub retry_period: Duration,
    pub driver: DriveConfig,
}

impl Settings {
    /// Merge file config and CLI overrides into resolved settings.
    pub fn resolve(file: FileConfig, cli: Overrides) -> Result<Self, SetupError> {
        let port = cli.port.or(file.port).ok_or(SetupError::Missing("port"))?;
        let baud = cli.baud.or(file.baud).unwrap_or(DEFAULT_BAUD);
        let catalog = cli
            .catalog
            .or(file.catalog)
            .ok_or(SetupError::Missing("catalog"))?;
        let state_file = cli
            .state_file
            .or(file.state_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));
        let retry_period =
            Duration::from_millis(file.retry_period_ms.unwrap_or(DEFAULT_RETRY_PERIOD_MS));

        Ok(Settings {
            port,
            baud,
            catalog,
            state_file,
            retry_period,
            driver: file.driver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            port: Some("/dev/ttyUSB0".to_string()),
            baud: Some(115200),
            catalog: Some(PathBuf::from("a.json")),
            ..FileConfig::default()
        };
        let cli = Overrides {
            port: Some("/dev/ttyACM1".to_string()),
            ..Overrides::default()
        };

        let settings = Settings::resolve(file, cli).unwrap();
        assert_eq!(settings.port, "/dev/ttyACM1");
        assert_eq!(settings.baud, 115200);
    }

    #[test]
    fn test_defaults_fill_the_rest() {
        let file = FileConfig {
            port: Some("/dev/ttyUSB0".to_string()),
            catalog: Some(PathBuf::from("signals.json")),
            ..FileConfig::default()
        };

        let settings = Settings::resolve(file, Overrides::default()).unwrap();
        assert_eq!(settings.baud, DEFAULT_BAUD);
        assert_eq!(settings.state_file, PathBuf::from(DEFAULT_STATE_FILE));
        assert_eq!(settings.retry_period, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_port_is_an_error() {
        let file = FileConfig {
            catalog: Some(PathBuf::from("signals.json")),
            ..FileConfig::default()
        };
        assert!(matches!(
            Settings::resolve(file, Overrides::default()),
            Err(SetupError::Missing("port"))
        ));
    }

    #[test]
    fn test_yaml_shape() {
        let text = "
port: /dev/ttyUSB0
catalog: signals.json
driver:
  debounce_ms: 150
  bands:
    medium: 25
    high: 75
";
        let file: FileConfig = serde_yaml::from_str(text).unwrap();
        assert_eq!(file.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(file.driver.debounce_ms, 150);
        assert_eq!(file.driver.bands.medium, 25);
        // untouched settings keep their defaults
        assert_eq!(file.driver.send_attempts, 3);
    }
}
