pub use crossterm::terminal::{Clear, ClearType};

use std::io;

/// Return the horizontal and vertical size of the terminal, if available.
pub fn size() -> io::Result<(u16, u16)> {
    crossterm::terminal::size()
}

/// Return the amount of columns of the terminal, or `fallback` if it can't be determined.
pub fn columns_or(fallback: u16) -> u16 {
    size().map(|(columns, _rows)| columns).unwrap_or(fallback)
}

/// Erase everything from the cursor to the end of the current line.
pub fn wipe_rest_of_line(out: &mut impl io::Write) -> io::Result<()> {
    crate::queue!(out, Clear(ClearType::UntilNewLine))
}

/// Erase everything from the cursor to the end of the screen.
pub fn wipe_below(out: &mut impl io::Write) -> io::Result<()> {
    crate::queue!(out, Clear(ClearType::FromCursorDown))
}
