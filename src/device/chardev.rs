//! Production adapter: the LCD driver's character device.
//!
//! This is the only place the numeric ioctl codes exist. Each primitive maps to
//! exactly one syscall; nothing is retried, and a hung driver hangs the caller.

#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use crate::core::errors::{DeviceOp, LcdError, Result};
use crate::device::protocol::{ControlCommand, DisplayConfig, DisplayDevice, RawLcdConfig};

const LCD_MAGIC: u8 = ControlCommand::MAGIC;

nix::ioctl_none!(
    /// `LCD_IOCTL_CLEAR`
    lcd_ioctl_clear,
    LCD_MAGIC,
    ControlCommand::Clear.number()
);
nix::ioctl_write_ptr!(
    /// `LCD_IOCTL_SET_CONFIG`
    lcd_ioctl_set_config,
    LCD_MAGIC,
    ControlCommand::SetConfig.number(),
    RawLcdConfig
);

/// An open handle on the LCD special file.
#[derive(Debug)]
pub struct CharDevice {
    file: File,
    path: PathBuf,
}

impl CharDevice {
    /// Open `path` read-write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| LcdError::DeviceOpen {
                path: path.clone(),
                source,
            })?;
        Ok(Self { file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplayDevice for CharDevice {
    fn clear(&mut self) -> Result<()> {
        let fd = self.file.as_raw_fd();
        // SAFETY: `fd` is owned by `self.file` and stays open for the call; the
        // clear command carries no payload.
        unsafe { lcd_ioctl_clear(fd) }
            .map(drop)
            .map_err(|errno| LcdError::device(DeviceOp::Clear, errno.into()))
    }

    fn configure(&mut self, cfg: DisplayConfig) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let payload = cfg.to_raw();
        // SAFETY: `payload` is a `#[repr(C)]` value matching `struct lcd_config` and
        // outlives the call; the driver only reads from the pointer.
        unsafe { lcd_ioctl_set_config(fd, &payload) }
            .map(drop)
            .map_err(|errno| LcdError::device(DeviceOp::Configure, errno.into()))
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let written = self
            .file
            .write(bytes)
            .map_err(|source| LcdError::device(DeviceOp::Write, source))?;
        if written < bytes.len() {
            return Err(LcdError::ShortTransfer {
                op: DeviceOp::Write,
                expected: bytes.len(),
                actual: written,
            });
        }
        Ok(())
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file
            .read(buf)
            .map_err(|source| LcdError::device(DeviceOp::Read, source))
    }
}
