use crate::{
    bar::{Bar, Lifecycle},
    frame::{FrameBuilder, Line},
    render::Policy,
    Channel, Console, Result,
};
use std::{fmt, sync::Arc, time::Duration};

/// A way to configure new [`Console`] instances.
///
/// ```rust
/// use tickbar::{Console, Options};
/// use std::time::Duration;
/// let console = Console::with_options(Options::default());
/// let quiet = Options { refresh_interval: Duration::from_millis(250), hide_completed: true, ..Options::default() }.create();
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    /// The time between two paints of the periodic policy, _(default: 40ms)_, on both channels.
    pub refresh_interval: Duration,

    /// If true, _(default: false)_, bars of a multi-bar disappear once they are done.
    ///
    /// Single bars are unaffected, their final frame always stays.
    pub hide_completed: bool,

    /// If true, _(default: true)_, no colors are painted on channels which are not connected to a terminal.
    pub disable_styling_when_not_tty: bool,

    /// If true, frames may be colored. Defaults to what `CLICOLOR`, `CLICOLOR_FORCE` and `NO_COLOR` allow.
    pub colored: bool,
}

impl Options {
    /// Create a new [`Console`] from the configuration within.
    pub fn create(self) -> Console {
        Console::with_options(self)
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            refresh_interval: Duration::from_millis(40),
            hide_completed: false,
            disable_styling_when_not_tty: true,
            colored: crosstermion::color::allowed(),
        }
    }
}

/// A way to configure new bars, including the ones of a [`MultiBar`](crate::MultiBar).
///
/// ```rust
/// use tickbar::{BarOptions, ProgressBar};
/// let bar: ProgressBar = BarOptions { description: "download".into(), total: 10, ..BarOptions::default() }.create()?;
/// # Ok::<_, tickbar::Error>(())
/// ```
#[derive(Clone)]
pub struct BarOptions {
    /// Shown in front of the bar.
    pub description: String,
    /// The amount of ticks making up a run, _(default: 0)_.
    ///
    /// Bounded bars need it to be greater than zero. Indeterminate bars show an activity spinner while it's zero.
    pub total: u64,
    /// Turns progress into the text of a frame, _(default: [`Line`])_.
    pub builder: Arc<dyn FrameBuilder>,
}

impl BarOptions {
    /// Create a bar from the configuration within, which paints periodically to standard output
    /// through the global [`Console`].
    pub fn create<S: Lifecycle>(self) -> Result<Bar<S>> {
        Bar::with_console(Console::global(), Channel::Stdout, Policy::Periodic, self)
    }
}

impl Default for BarOptions {
    fn default() -> Self {
        BarOptions {
            description: String::new(),
            total: 0,
            builder: Arc::new(Line::default()),
        }
    }
}

impl fmt::Debug for BarOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarOptions")
            .field("description", &self.description)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}
