//! Monitor subsystem: the refresh loop and its stop signal.

pub mod loop_main;
pub mod signals;
