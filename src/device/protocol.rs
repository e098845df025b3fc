//! Wire contract shared with the LCD driver, and the `DisplayDevice` trait every
//! adapter implements.
//!
//! The driver exposes two device-control commands (clear, set-config) plus plain
//! `read`/`write` on the special file. Adapters supply the four primitives; the
//! terminator and snapshot-length rules live in the provided methods so that
//! every adapter gets them identically.

#![allow(missing_docs)]

use std::borrow::Cow;
use std::ffi::c_int;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DeviceOp, LcdError, Result};

/// Visible characters per row.
pub const ROW_WIDTH: usize = 16;
/// Rows on the panel.
pub const ROW_COUNT: usize = 2;
/// Size of the display memory returned by one read.
pub const SNAPSHOT_LEN: usize = ROW_WIDTH * ROW_COUNT;
/// Byte that makes the driver commit the current row.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Power/cursor/blink state, always sent as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
}

impl DisplayConfig {
    #[must_use]
    pub const fn new(display_on: bool, cursor_on: bool, blink_on: bool) -> Self {
        Self {
            display_on,
            cursor_on,
            blink_on,
        }
    }

    /// Encode into the driver's `struct lcd_config` layout.
    #[must_use]
    pub fn to_raw(self) -> RawLcdConfig {
        RawLcdConfig {
            display_on: c_int::from(self.display_on),
            cursor_on: c_int::from(self.cursor_on),
            blink_on: c_int::from(self.blink_on),
        }
    }

    /// Decode from the driver layout; any nonzero field is on.
    #[must_use]
    pub const fn from_raw(raw: RawLcdConfig) -> Self {
        Self {
            display_on: raw.display_on != 0,
            cursor_on: raw.cursor_on != 0,
            blink_on: raw.blink_on != 0,
        }
    }
}

/// `struct lcd_config` as the driver reads it: three C ints.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawLcdConfig {
    pub display_on: c_int,
    pub cursor_on: c_int,
    pub blink_on: c_int,
}

/// The two configurations the client moves the panel between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Cursor visible and blinking; the state a user expects to find the panel in.
    Interactive,
    /// Cursor hidden while the monitor owns the panel.
    Monitoring,
}

impl DisplayMode {
    #[must_use]
    pub const fn config(self) -> DisplayConfig {
        match self {
            Self::Interactive => DisplayConfig::new(true, true, true),
            Self::Monitoring => DisplayConfig::new(true, false, false),
        }
    }

    /// Which mode a configuration corresponds to, if either.
    #[must_use]
    pub fn of(cfg: DisplayConfig) -> Option<Self> {
        [Self::Interactive, Self::Monitoring]
            .into_iter()
            .find(|mode| mode.config() == cfg)
    }
}

/// Device-control commands understood by the driver (magic `'L'`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// `_IO('L', 1)`: blank both rows.
    Clear,
    /// `_IOW('L', 2, struct lcd_config)`: apply a `DisplayConfig`.
    SetConfig,
}

impl ControlCommand {
    pub const MAGIC: u8 = b'L';

    /// Command sequence number within the magic.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Clear => 1,
            Self::SetConfig => 2,
        }
    }

    /// Size of the payload copied into the kernel.
    #[must_use]
    pub const fn payload_len(self) -> usize {
        match self {
            Self::Clear => 0,
            Self::SetConfig => std::mem::size_of::<RawLcdConfig>(),
        }
    }
}

/// One full read of display memory: top row then bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySnapshot {
    bytes: [u8; SNAPSHOT_LEN],
}

impl DisplaySnapshot {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SNAPSHOT_LEN]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SNAPSHOT_LEN] {
        &self.bytes
    }

    #[must_use]
    pub fn top(&self) -> &[u8] {
        &self.bytes[..ROW_WIDTH]
    }

    #[must_use]
    pub fn bottom(&self) -> &[u8] {
        &self.bytes[ROW_WIDTH..]
    }

    /// Row `0` (top) or `1` (bottom) as printable text. NUL shows as a space,
    /// any other non-printable byte as `.`.
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        let bytes = if row == 0 { self.top() } else { self.bottom() };
        bytes
            .iter()
            .map(|&b| match b {
                0 => ' ',
                0x20..=0x7e => char::from(b),
                _ => '.',
            })
            .collect()
    }
}

/// Primitive operations on an open LCD device.
///
/// Implemented by [`CharDevice`](super::chardev::CharDevice) for the real
/// special file and by [`MemoryDevice`](super::memory::MemoryDevice) in tests.
/// Every call is attempted exactly once.
pub trait DisplayDevice {
    /// Issue the clear command.
    fn clear(&mut self) -> Result<()>;

    /// Send all three flags in one control call.
    fn configure(&mut self, cfg: DisplayConfig) -> Result<()>;

    /// One `write` of `bytes`. Writing fewer bytes than given is an error.
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()>;

    /// One `read` into `buf`, returning the byte count.
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write `text`, appending a single terminator if it does not already end
    /// with one, so the driver commits the trailing row.
    fn write_text(&mut self, text: &str) -> Result<()> {
        let payload = with_terminator(text.as_bytes());
        self.write_raw(&payload)
    }

    /// Read the full 32-byte display memory.
    fn read_snapshot(&mut self) -> Result<DisplaySnapshot> {
        let mut buf = [0u8; SNAPSHOT_LEN];
        let read = self.read_raw(&mut buf)?;
        if read < SNAPSHOT_LEN {
            return Err(LcdError::ShortTransfer {
                op: DeviceOp::Read,
                expected: SNAPSHOT_LEN,
                actual: read,
            });
        }
        Ok(DisplaySnapshot::from_bytes(buf))
    }
}

impl<D: DisplayDevice + ?Sized> DisplayDevice for &mut D {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn configure(&mut self, cfg: DisplayConfig) -> Result<()> {
        (**self).configure(cfg)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_raw(bytes)
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_raw(buf)
    }
}

/// `bytes` followed by exactly one terminator unless already terminated.
#[must_use]
pub fn with_terminator(bytes: &[u8]) -> Cow<'_, [u8]> {
    if bytes.last() == Some(&LINE_TERMINATOR) {
        Cow::Borrowed(bytes)
    } else {
        let mut owned = Vec::with_capacity(bytes.len() + 1);
        owned.extend_from_slice(bytes);
        owned.push(LINE_TERMINATOR);
        Cow::Owned(owned)
    }
}
