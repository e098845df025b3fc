//! Line formatter: turns sampled text into panel-width rows.

pub mod line;

pub use line::{compose_frame, fit_line};
