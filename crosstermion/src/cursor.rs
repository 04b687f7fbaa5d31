pub use crossterm::cursor::{MoveToColumn, MoveUp as MoveToPreviousLine};

use std::io;

/// Move the cursor to the first column of the line `lines` above the current one.
///
/// With `lines` at 0 the cursor only returns to the first column, as terminals interpret a zero count as one.
pub fn up_and_home(out: &mut impl io::Write, lines: u16) -> io::Result<()> {
    if lines == 0 {
        return crate::queue!(out, MoveToColumn(0));
    }
    crate::queue!(out, MoveToPreviousLine(lines), MoveToColumn(0))
}
