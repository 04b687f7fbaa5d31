use crate::{console::Channel, error::Result};
use parking_lot::Mutex;
use std::io;

/// The terminal size to assume if it can't be queried.
const FALLBACK_COLUMNS: u16 = 80;

/// A byte sink bound to an output channel, along with what we know about the terminal behind it.
pub struct Sink {
    channel: Channel,
    out: Mutex<Box<dyn io::Write + Send>>,
    buf: Mutex<Vec<u8>>,
    is_terminal: bool,
    columns: Option<u16>,
}

impl Sink {
    /// A sink writing to standard output.
    pub fn stdout() -> Self {
        Sink::new(Channel::Stdout, io::stdout(), atty::is(atty::Stream::Stdout))
    }

    /// A sink writing to standard error.
    pub fn stderr() -> Self {
        Sink::new(Channel::Stderr, io::stderr(), atty::is(atty::Stream::Stderr))
    }

    /// The sink writing to the standard stream of `channel`.
    pub fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::Stdout => Sink::stdout(),
            Channel::Stderr => Sink::stderr(),
        }
    }

    /// Create a sink writing to `out` on behalf of `channel`.
    ///
    /// Cursor control is only emitted if `is_terminal` is true.
    pub fn new(channel: Channel, out: impl io::Write + Send + 'static, is_terminal: bool) -> Self {
        Sink {
            channel,
            out: Mutex::new(Box::new(out)),
            buf: Mutex::new(Vec::new()),
            is_terminal,
            columns: None,
        }
    }

    /// Use `columns` as terminal width instead of querying the terminal.
    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = Some(columns);
        self
    }

    /// The channel this sink writes to.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// True if the sink is connected to a terminal.
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// The amount of columns available for drawing.
    pub fn width(&self) -> u16 {
        match self.columns {
            Some(columns) => columns,
            None if self.is_terminal => crosstermion::terminal::columns_or(FALLBACK_COLUMNS),
            None => FALLBACK_COLUMNS,
        }
    }

    /// Write all of `bytes` and flush.
    pub fn flush(&self, bytes: &[u8]) -> io::Result<()> {
        let mut out = self.out.lock();
        out.write_all(bytes)?;
        out.flush()
    }

    /// Let `draw` fill the render buffer, and flush it if that succeeded.
    pub(crate) fn render(&self, draw: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> Result<()> {
        let mut buf = self.buf.lock();
        buf.clear();
        draw(&mut buf)?;
        self.flush(&buf)?;
        Ok(())
    }

    /// Give the memory of the render buffer back, typically once a bar is done.
    pub fn release(&self) {
        let mut buf = self.buf.lock();
        *buf = Vec::new();
    }
}
