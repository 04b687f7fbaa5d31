#![deny(unsafe_code)]
/*!
Tickbar paints live progress bars to the terminal from a background thread, without tearing output and without
slowing down the loop that makes the progress.

It consists of three layers

* a render thread per output channel, along with two policies deciding when it paints: periodically, or whenever
  progress was made
* [`Bar`]s, each a small state machine deciding which frame is due: a start frame, refresh frames, an end frame
* [`MultiBar`]s, which let several bars share one render thread and one region of the terminal

Failures of the render thread, including panics, are never swallowed. They are handed to the next call that
drives the render thread, usually the next tick.

```rust,no_run
use tickbar::{BarOptions, ProgressBar};

let bar: ProgressBar = BarOptions { description: "crunching".into(), total: 100, ..BarOptions::default() }.create()?;
for _ in 0..100 {
    // work…
    bar.tick()?;
}
bar.wait();
# Ok::<_, tickbar::Error>(())
```

# Channels and the Console

Only one bar or multi-bar may paint to a channel at a time. Starting another one fails with [`Error::Occupied`]
until the first one finished. The render services of both channels live in a [`Console`], which is usually the
[global one](Console::global()), but can be created explicitly to paint into any [`line::Sink`].

# Logging

Render thread management is logged through the `log` crate. Install a logger of your choice to see it, but keep
it away from the channel bars paint to.
*/
mod config;
pub use config::{BarOptions, Options};

mod error;
pub use error::{Error, Result};

mod exception;
pub use exception::ExceptionBox;

pub mod spin;

pub mod render;

pub mod console;
pub use console::{Channel, Console};

pub mod line;

pub mod frame;
pub use frame::{Frame, FrameBuilder};

pub mod bar;
pub use bar::{Bar, Category, DualState, Lifecycle, State};

mod multi;
pub use multi::{MultiBar, MAX_BARS};

/// A bar counting towards a known total.
pub type ProgressBar = Bar<State>;
/// A bar which shows activity while its total is zero, and counts towards its total otherwise.
pub type IndeterminateBar = Bar<DualState>;
