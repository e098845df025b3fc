//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use lcdcontrol::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, TickErrorPolicy};
pub use crate::core::errors::{DeviceOp, LcdError, Result};

// Device
#[cfg(unix)]
pub use crate::device::CharDevice;
pub use crate::device::{DisplayConfig, DisplayDevice, DisplayMode, DisplaySnapshot, MemoryDevice};

// Monitor
pub use crate::daemon::loop_main::{MonitorLoop, MonitorOptions, MonitorReport, StopReason};
pub use crate::daemon::signals::StopToken;
pub use crate::telemetry::{TelemetryCollector, TelemetryField};
