//! LCD-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, LcdError>;

/// The device primitive that failed, carried by device errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOp {
    Clear,
    Configure,
    Write,
    Read,
}

impl DeviceOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Configure => "configure",
            Self::Write => "write",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for DeviceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for the LCD controller.
#[derive(Debug, Error)]
pub enum LcdError {
    #[error("[LCD-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[LCD-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[LCD-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[LCD-2001] could not open {path}: {source}")]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LCD-2002] device {op} failed: {source}")]
    Device {
        op: DeviceOp,
        #[source]
        source: std::io::Error,
    },

    #[error("[LCD-2003] short device {op}: expected {expected} bytes, got {actual}")]
    ShortTransfer {
        op: DeviceOp,
        expected: usize,
        actual: usize,
    },

    #[error("[LCD-3001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[LCD-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LCD-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl LcdError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "LCD-1001",
            Self::MissingConfig { .. } => "LCD-1002",
            Self::ConfigParse { .. } => "LCD-1003",
            Self::DeviceOpen { .. } => "LCD-2001",
            Self::Device { .. } => "LCD-2002",
            Self::ShortTransfer { .. } => "LCD-2003",
            Self::Serialization { .. } => "LCD-3001",
            Self::Io { .. } => "LCD-3002",
            Self::Runtime { .. } => "LCD-3900",
        }
    }

    /// Whether a control, read or write call against an open device failed.
    #[must_use]
    pub const fn is_device_error(&self) -> bool {
        matches!(self, Self::Device { .. } | Self::ShortTransfer { .. })
    }

    /// Convenience constructor for a failed device primitive.
    #[must_use]
    pub fn device(op: DeviceOp, source: std::io::Error) -> Self {
        Self::Device { op, source }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for LcdError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for LcdError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
