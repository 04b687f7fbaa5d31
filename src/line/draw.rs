use crosstermion::{cursor, terminal};
use std::{convert::TryFrom, io};

/// Draw the frame of a single bar which repaints its own line.
///
/// The `last` frame ends the line, so whatever is printed next doesn't overwrite it.
pub fn solo(out: &mut Vec<u8>, text: &str, last: bool, is_terminal: bool) -> io::Result<()> {
    if is_terminal {
        cursor::up_and_home(out, 0)?;
    }
    out.extend_from_slice(text.as_bytes());
    if is_terminal {
        terminal::wipe_rest_of_line(out)?;
    }
    if last || !is_terminal {
        out.push(b'\n');
    }
    Ok(())
}

/// Return to the first line of the region drawn in the previous pass, which spans `lines` lines.
pub fn region_begin(out: &mut Vec<u8>, lines: u32) -> io::Result<()> {
    cursor::up_and_home(out, u16::try_from(lines).unwrap_or(u16::MAX))
}

pub fn region_line(out: &mut Vec<u8>, text: &str, is_terminal: bool) -> io::Result<()> {
    out.extend_from_slice(text.as_bytes());
    if is_terminal {
        terminal::wipe_rest_of_line(out)?;
    }
    out.push(b'\n');
    Ok(())
}

/// Wipe lines left over from a previous pass which had more visible bars.
pub fn region_end(out: &mut Vec<u8>) -> io::Result<()> {
    terminal::wipe_below(out)
}
