use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use crate::error::{Error, Result};

/// The display firmware shows a timeout error after 10 s without a record.
pub const DISPLAY_TIMEOUT_MS: u64 = 10_000;
pub const MIN_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Explicit port; when set, discovery is skipped.
    #[serde(default)]
    pub port: Option<String>,
    /// Used when discovery finds several candidates.
    #[serde(default)]
    pub default_port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_usb_only")]
    pub usb_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_keep_running_degraded")]
    pub keep_running_degraded: bool,
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,
}

fn default_interval_ms() -> u64 { 1000 }
fn default_baud_rate() -> u32 { 115_200 }
fn default_timeout_ms() -> u64 { 500 }
fn default_usb_only() -> bool { true }
fn default_keep_running_degraded() -> bool { true }
fn default_notifications_enabled() -> bool { true }

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            default_port: None,
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            usb_only: default_usb_only(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            keep_running_degraded: default_keep_running_degraded(),
            notifications_enabled: default_notifications_enabled(),
        }
    }
}

impl Config {
    /// Loads the config from `path`, or from the default location when `None`.
    /// A missing default file yields defaults; a missing explicit file is an error.
    /// Values are not range-checked here so that overrides can still replace
    /// them; call [`Config::validate`] once they are applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::Config(format!("Config file not found: {}", p.display())));
                }
                p.to_path_buf()
            }
            None => Self::config_path()?,
        };

        if config_path.exists() {
            log::debug!("Reading config from {}", config_path.display());
            let content = fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let interval = self.refresh.interval_ms;
        if !(MIN_INTERVAL_MS..DISPLAY_TIMEOUT_MS).contains(&interval) {
            return Err(Error::Config(format!(
                "refresh.interval_ms must be in {}..{} (got {})",
                MIN_INTERVAL_MS, DISPLAY_TIMEOUT_MS, interval
            )));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("serial.baud_rate must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config/thermal-relay/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.refresh.interval_ms, 1000);
        assert_eq!(config.serial.baud_rate, 115_200);
        assert!(config.serial.port.is_none());
        assert!(config.daemon.keep_running_degraded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [serial]
            port = "/dev/ttyACM0"
            "#,
        )
        .unwrap();
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.serial.baud_rate, 115_200);
        assert!(config.serial.usb_only);
        assert_eq!(config.refresh.interval_ms, 1000);
    }

    #[test]
    fn interval_at_display_timeout_is_rejected() {
        let config = Config::from_toml("[refresh]\ninterval_ms = 10000\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config::from_toml("[refresh]\ninterval_ms = 2000\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_baud_is_rejected() {
        let config = Config::from_toml("[serial]\nbaud_rate = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn out_of_range_file_value_can_be_overridden() {
        let dir = std::env::temp_dir().join(format!("thermal-relay-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[refresh]\ninterval_ms = 50\n").unwrap();

        let mut config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.refresh.interval_ms, 50);
        assert!(config.validate().is_err());

        config.refresh.interval_ms = 1000;
        assert!(config.validate().is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let result = Config::from_toml("[refresh\ninterval_ms = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn missing_explicit_path_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/thermal-relay.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
