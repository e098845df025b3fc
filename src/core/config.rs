//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{LcdError, Result};

/// Well-known device node created by the LCD driver.
pub const DEFAULT_DEVICE: &str = "/dev/lcdcontrol";

/// Full lcdctl configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub monitor: MonitorConfig,
    pub telemetry: TelemetryConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    pub path: PathBuf,
}

/// Cadence and failure handling for `lcdctl monitor`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_ms: u64,
    pub on_device_error: TickErrorPolicy,
}

/// Where host facts are read from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub uptime_path: PathBuf,
    pub thermal_path: PathBuf,
    pub loopback_interface: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub activity_log: PathBuf,
}

/// What the monitor loop does when a clear or write fails mid-session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TickErrorPolicy {
    /// Log the failure, count it, keep ticking.
    #[default]
    Skip,
    /// Restore the display and end the session with the error.
    Abort,
}

impl FromStr for TickErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(format!("expected \"skip\" or \"abort\", got {other:?}")),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DEVICE),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            on_device_error: TickErrorPolicy::Skip,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            uptime_path: PathBuf::from("/proc/uptime"),
            thermal_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            loopback_interface: "lo".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[LCD-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("lcdctl").join("config.toml"),
            activity_log: home_dir
                .join(".local")
                .join("share")
                .join("lcdctl")
                .join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// A missing file at the default path is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |name| env::var(name).ok())
    }

    fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| LcdError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(LcdError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic FNV-1a hash of the effective config for the activity log.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut var = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = var("LCDCTL_DEVICE") {
            self.device.path = PathBuf::from(raw);
        }
        if let Some(raw) = var("LCDCTL_MONITOR_INTERVAL_MS") {
            self.monitor.interval_ms = parse_env("LCDCTL_MONITOR_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = var("LCDCTL_ON_DEVICE_ERROR") {
            self.monitor.on_device_error = parse_env("LCDCTL_ON_DEVICE_ERROR", &raw)?;
        }
        if let Some(raw) = var("LCDCTL_UPTIME_PATH") {
            self.telemetry.uptime_path = PathBuf::from(raw);
        }
        if let Some(raw) = var("LCDCTL_THERMAL_PATH") {
            self.telemetry.thermal_path = PathBuf::from(raw);
        }
        if let Some(raw) = var("LCDCTL_LOOPBACK_INTERFACE") {
            self.telemetry.loopback_interface = raw;
        }
        if let Some(raw) = var("LCDCTL_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.device.path.as_os_str().is_empty() {
            return Err(LcdError::InvalidConfig {
                details: "device.path must not be empty".to_string(),
            });
        }
        if !(1..=60_000).contains(&self.monitor.interval_ms) {
            return Err(LcdError::InvalidConfig {
                details: format!(
                    "monitor.interval_ms must be in [1, 60000], got {}",
                    self.monitor.interval_ms
                ),
            });
        }
        if self.telemetry.loopback_interface.trim().is_empty() {
            return Err(LcdError::InvalidConfig {
                details: "telemetry.loopback_interface must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| LcdError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
