//! Telemetry collector: named host facts sampled on demand.

#![allow(missing_docs)]

pub mod host;

use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::core::config::TelemetryConfig;

/// What a display row shows. Unknown names pin literal text to the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryField {
    Uptime,
    Temperature,
    Hostname,
    IpAddress,
    Literal(String),
}

impl TelemetryField {
    /// Map a user-supplied name to a field. Anything unrecognised is literal text.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "uptime" => Self::Uptime,
            "temp" => Self::Temperature,
            "hostname" => Self::Hostname,
            "ip" => Self::IpAddress,
            other => Self::Literal(other.to_string()),
        }
    }

    /// The name that selects this field on the command line.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Uptime => "uptime",
            Self::Temperature => "temp",
            Self::Hostname => "hostname",
            Self::IpAddress => "ip",
            Self::Literal(text) => text,
        }
    }
}

impl From<&str> for TelemetryField {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TelemetryField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Reads host facts from configurable sources. Stateless between calls.
#[derive(Debug, Clone)]
pub struct TelemetryCollector {
    uptime_path: PathBuf,
    thermal_path: PathBuf,
    loopback_interface: String,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(&TelemetryConfig::default())
    }
}

impl TelemetryCollector {
    #[must_use]
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            uptime_path: config.uptime_path.clone(),
            thermal_path: config.thermal_path.clone(),
            loopback_interface: config.loopback_interface.clone(),
        }
    }

    /// Current text for `field`. Never fails; unavailable facts render their
    /// fallback text.
    #[must_use]
    pub fn sample(&self, field: &TelemetryField) -> String {
        match field {
            TelemetryField::Uptime => self.uptime(),
            TelemetryField::Temperature => self.temperature(),
            TelemetryField::Hostname => self.hostname(),
            TelemetryField::IpAddress => self.ip_address(),
            TelemetryField::Literal(text) => text.clone(),
        }
    }

    #[must_use]
    pub fn uptime(&self) -> String {
        host::read_uptime(&self.uptime_path)
    }

    #[must_use]
    pub fn temperature(&self) -> String {
        host::read_temperature(&self.thermal_path)
    }

    #[must_use]
    pub fn hostname(&self) -> String {
        host::read_hostname()
    }

    #[must_use]
    pub fn ip_address(&self) -> String {
        host::read_ip_address(&self.loopback_interface)
    }
}
