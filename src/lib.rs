#![deny(unsafe_code)]

//! lcdcontrol — userspace control of a two-row, 16-column character LCD driven
//! through ioctl and read/write on a character device.
//!
//! Two halves:
//! 1. **Device client** — clear, configure, write and read the panel through
//!    the [`device::DisplayDevice`] trait
//! 2. **Status monitor** — a loop that paints two live telemetry rows
//!    (uptime, CPU temperature, hostname, IPv4 address) once per tick
//!
//! # Library usage
//!
//! ```rust,no_run
//! use lcdcontrol::prelude::*;
//!
//! # fn main() -> lcdcontrol::core::errors::Result<()> {
//! let mut lcd = CharDevice::open("/dev/lcdcontrol")?;
//! lcd.clear()?;
//! lcd.write_text("hello")?;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod core;
pub mod daemon;
pub mod device;
pub mod logger;
pub mod render;
pub mod telemetry;
