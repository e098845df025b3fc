//! Display protocol client: the driver contract and its adapters.

#[cfg(unix)]
pub mod chardev;
pub mod memory;
pub mod protocol;

#[cfg(unix)]
pub use chardev::CharDevice;
pub use memory::{MemoryDevice, RecordedOp};
pub use protocol::{
    ControlCommand, DisplayConfig, DisplayDevice, DisplayMode, DisplaySnapshot, ROW_WIDTH,
};
