//! In-memory stand-in for the LCD driver.
//!
//! Reproduces what a client can observe of the real driver: the atomic config
//! flags, commit-on-terminator writes, and the row-inversion quirk after a
//! clear. The first line committed after a clear lands on the bottom row; every
//! later commit scrolls the bottom row up to the top and lands below it.
//!
//! Clones share one panel, so a test can keep a handle while a monitor loop
//! borrows another.

#![allow(missing_docs)]

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::errors::{DeviceOp, LcdError, Result};
use crate::device::protocol::{
    DisplayConfig, DisplayDevice, DisplayMode, DisplaySnapshot, LINE_TERMINATOR, ROW_COUNT,
    ROW_WIDTH, SNAPSHOT_LEN,
};

/// One call made against the device, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Clear,
    Configure(DisplayConfig),
    Write(Vec<u8>),
    Read,
}

#[derive(Debug)]
struct PanelState {
    rows: [[u8; ROW_WIDTH]; ROW_COUNT],
    pending: Vec<u8>,
    bottom_occupied: bool,
    config: DisplayConfig,
    ops: Vec<RecordedOp>,
    fail_next: Vec<DeviceOp>,
    read_limit: Option<usize>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            rows: [[b' '; ROW_WIDTH]; ROW_COUNT],
            pending: Vec::with_capacity(ROW_WIDTH),
            bottom_occupied: false,
            config: DisplayMode::Interactive.config(),
            ops: Vec::new(),
            fail_next: Vec::new(),
            read_limit: None,
        }
    }
}

impl PanelState {
    fn take_failure(&mut self, op: DeviceOp) -> Result<()> {
        if let Some(idx) = self.fail_next.iter().position(|f| *f == op) {
            self.fail_next.remove(idx);
            return Err(LcdError::device(
                op,
                io::Error::other(format!("injected {op} failure")),
            ));
        }
        Ok(())
    }

    fn blank(&mut self) {
        self.rows = [[b' '; ROW_WIDTH]; ROW_COUNT];
        self.pending.clear();
        self.bottom_occupied = false;
    }

    fn feed(&mut self, byte: u8) {
        if byte == LINE_TERMINATOR {
            self.commit();
        } else if self.pending.len() < ROW_WIDTH {
            self.pending.push(byte);
        }
    }

    fn commit(&mut self) {
        let mut line = [b' '; ROW_WIDTH];
        line[..self.pending.len()].copy_from_slice(&self.pending);
        self.pending.clear();

        if self.bottom_occupied {
            self.rows[0] = self.rows[1];
        }
        self.rows[1] = line;
        self.bottom_occupied = true;
    }

    fn memory(&self) -> [u8; SNAPSHOT_LEN] {
        let mut out = [0u8; SNAPSHOT_LEN];
        out[..ROW_WIDTH].copy_from_slice(&self.rows[0]);
        out[ROW_WIDTH..].copy_from_slice(&self.rows[1]);
        out
    }
}

/// Emulated LCD panel implementing [`DisplayDevice`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    state: Arc<Mutex<PanelState>>,
}

impl MemoryDevice {
    /// A blank panel in the interactive configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of kind `op` fail once. Failed calls leave the panel
    /// untouched.
    pub fn fail_next(&self, op: DeviceOp) {
        self.state.lock().fail_next.push(op);
    }

    /// Return at most `limit` bytes from subsequent reads.
    pub fn limit_reads(&self, limit: usize) {
        self.state.lock().read_limit = Some(limit);
    }

    /// Current flags as last accepted by the panel.
    #[must_use]
    pub fn config(&self) -> DisplayConfig {
        self.state.lock().config
    }

    /// Panel memory without recording a read.
    #[must_use]
    pub fn peek(&self) -> DisplaySnapshot {
        DisplaySnapshot::from_bytes(self.state.lock().memory())
    }

    /// Every call received so far, failed ones included.
    #[must_use]
    pub fn ops(&self) -> Vec<RecordedOp> {
        self.state.lock().ops.clone()
    }

    /// Configurations received, in order.
    #[must_use]
    pub fn config_history(&self) -> Vec<DisplayConfig> {
        self.state
            .lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Configure(cfg) => Some(*cfg),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls matching `kind`.
    #[must_use]
    pub fn count(&self, kind: DeviceOp) -> usize {
        self.state
            .lock()
            .ops
            .iter()
            .filter(|op| {
                matches!(
                    (op, kind),
                    (RecordedOp::Clear, DeviceOp::Clear)
                        | (RecordedOp::Configure(_), DeviceOp::Configure)
                        | (RecordedOp::Write(_), DeviceOp::Write)
                        | (RecordedOp::Read, DeviceOp::Read)
                )
            })
            .count()
    }
}

impl DisplayDevice for MemoryDevice {
    fn clear(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.ops.push(RecordedOp::Clear);
        state.take_failure(DeviceOp::Clear)?;
        state.blank();
        Ok(())
    }

    fn configure(&mut self, cfg: DisplayConfig) -> Result<()> {
        let mut state = self.state.lock();
        state.ops.push(RecordedOp::Configure(cfg));
        state.take_failure(DeviceOp::Configure)?;
        state.config = cfg;
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        state.ops.push(RecordedOp::Write(bytes.to_vec()));
        state.take_failure(DeviceOp::Write)?;
        for &byte in bytes {
            state.feed(byte);
        }
        Ok(())
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock();
        state.ops.push(RecordedOp::Read);
        state.take_failure(DeviceOp::Read)?;
        let memory = state.memory();
        let available = state.read_limit.unwrap_or(SNAPSHOT_LEN).min(SNAPSHOT_LEN);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&memory[..n]);
        Ok(n)
    }
}
