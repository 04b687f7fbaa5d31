use crate::console::Channel;
use std::{fmt, io, sync::Arc};

/// Everything that can go wrong while driving progress bars.
///
/// It is `Clone` so a failure captured on a render thread can be inspected without taking it out
/// of its [`ExceptionBox`](crate::ExceptionBox).
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A bounded bar was configured or started with zero tasks.
    #[error("the number of tasks of a bounded bar must be greater than zero")]
    InvalidTotal,
    /// A percentage above 100 was passed to `tick_to`.
    #[error("percentage {0} is outside of 0..=100")]
    InvalidPercentage(u8),
    /// A multi-bar was asked for more slots than its active mask can track.
    #[error("a multi-bar can hold at most 64 bars, got {0}")]
    TooManyBars(usize),
    /// Another bar or multi-bar already owns the render thread of this channel.
    #[error("another progress bar instance is already running on {0}")]
    Occupied(Channel),
    /// The render thread could not be spawned.
    #[error("could not spawn the render thread")]
    Spawn(#[source] Arc<io::Error>),
    /// Writing a frame to the output channel failed.
    #[error("could not write to the output channel")]
    Io(#[source] Arc<io::Error>),
    /// A frame builder failed to produce a frame.
    #[error("failed to build frame: {0}")]
    Frame(String),
    /// A panic escaped the render task.
    #[error("the render task panicked: {0}")]
    Panicked(String),
}

impl Error {
    /// Create a frame building failure with the given `message`, for use in custom [`FrameBuilder`](crate::FrameBuilder)s.
    pub fn frame(message: impl Into<String>) -> Self {
        Error::Frame(message.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&'static str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".into());
        Error::Panicked(message)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Frame("formatter reported an error".into())
    }
}

/// The result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
