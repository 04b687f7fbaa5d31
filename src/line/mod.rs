//! Writing frames to a terminal line by line.
//!
//! A [`Sink`] is bound to one output channel and knows whether it's connected to a terminal. Only if it is,
//! cursor movements and line wipes are emitted, otherwise every frame simply becomes a line of its own.
mod draw;
pub(crate) use draw::{region_begin, region_end, region_line, solo};

mod sink;
pub use sink::Sink;
