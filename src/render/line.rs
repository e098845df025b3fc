//! Fixed-width line formatting for the 16-column panel.

#![allow(missing_docs)]

use crate::device::protocol::{LINE_TERMINATOR, ROW_WIDTH};

/// Left-justify `text` into exactly `width` printable ASCII characters: pad
/// with spaces or keep the first `width` characters. Control characters
/// become spaces and non-ASCII characters become `?`, so the result is always
/// `width` bytes long.
#[must_use]
pub fn fit_line(text: &str, width: usize) -> String {
    let mut line: String = text
        .chars()
        .take(width)
        .map(|c| match c {
            ' '..='~' => c,
            c if c.is_control() => ' ',
            _ => '?',
        })
        .collect();
    let missing = width - line.len();
    line.extend(std::iter::repeat_n(' ', missing));
    line
}

/// Both rows as one write: `"<top>\n<bottom>\n"`, each fitted to the panel
/// width. After a clear the driver puts the first line on top.
#[must_use]
pub fn compose_frame(top: &str, bottom: &str) -> String {
    let mut frame = String::with_capacity(2 * (ROW_WIDTH + 1));
    for row in [top, bottom] {
        frame.push_str(&fit_line(row, ROW_WIDTH));
        frame.push(char::from(LINE_TERMINATOR));
    }
    frame
}
