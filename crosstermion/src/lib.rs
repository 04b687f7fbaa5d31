/// Cursor movement used by line renderers.
///
/// Requires the `crossterm` feature toggle.
#[cfg(feature = "crossterm")]
pub mod cursor;
/// Features related to the terminal settings and its dimensions.
///
/// Requires the `crossterm` feature toggle.
#[cfg(feature = "crossterm")]
pub mod terminal;

/// Decide whether to colorize, and paint if so.
pub mod color;

#[cfg(feature = "crossterm")]
pub use crossterm::queue;
