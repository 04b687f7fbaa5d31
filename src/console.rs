//! The process-lifetime services every bar draws through: one render thread, two schedulers and one sink per
//! output channel.
//!
//! A [`Console`] is built explicitly and shared via `Arc`, so tests and applications can run as many isolated
//! instances as they like. [`Console::global()`] is merely the instance used by convenience constructors.
use crate::{
    line::Sink,
    render::{OnDemand, Periodic, Policy, Scheduler, ThreadExecutor},
    Options,
};
use once_cell::sync::OnceCell;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// One of the two standard text output streams a render thread is bound to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Channel {
    Stdout,
    Stderr,
}

impl Channel {
    /// Both channels, in the order they are stored in.
    pub const ALL: [Channel; 2] = [Channel::Stdout, Channel::Stderr];

    fn index(self) -> usize {
        match self {
            Channel::Stdout => 0,
            Channel::Stderr => 1,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Stdout => "stdout",
            Channel::Stderr => "stderr",
        })
    }
}

/// Everything needed to render to one channel.
pub struct Station {
    executor: Arc<ThreadExecutor>,
    periodic: Arc<Periodic>,
    on_demand: Arc<OnDemand>,
    sink: Arc<Sink>,
}

impl Station {
    fn new(sink: Sink, refresh_interval: Duration) -> Self {
        let channel = sink.channel();
        let executor = Arc::new(ThreadExecutor::new(format!("tickbar-{}", channel)));
        Station {
            periodic: Arc::new(Periodic::new(channel, Arc::clone(&executor), refresh_interval)),
            on_demand: Arc::new(OnDemand::new(channel, Arc::clone(&executor))),
            executor,
            sink: Arc::new(sink),
        }
    }

    /// The scheduler implementing `policy` on this channel.
    pub fn scheduler(&self, policy: Policy) -> Arc<dyn Scheduler> {
        match policy {
            Policy::Periodic => Arc::clone(&self.periodic) as Arc<dyn Scheduler>,
            Policy::OnDemand => Arc::clone(&self.on_demand) as Arc<dyn Scheduler>,
        }
    }

    /// The render thread shared by both schedulers.
    pub fn executor(&self) -> &Arc<ThreadExecutor> {
        &self.executor
    }

    pub fn periodic(&self) -> &Arc<Periodic> {
        &self.periodic
    }

    pub fn on_demand(&self) -> &Arc<OnDemand> {
        &self.on_demand
    }

    pub fn sink(&self) -> &Arc<Sink> {
        &self.sink
    }
}

/// The render services of both output channels, along with the settings all bars read.
pub struct Console {
    stations: [Station; 2],
    hide_completed: AtomicBool,
    disable_styling_when_not_tty: AtomicBool,
    colored: bool,
}

static GLOBAL: OnceCell<Arc<Console>> = OnceCell::new();

impl Console {
    /// Create a new instance writing to standard output and standard error, configured by `options`.
    pub fn with_options(options: Options) -> Self {
        Console::with_sinks(options, Sink::stdout(), Sink::stderr())
    }

    /// Create a new instance writing to the given sinks, which are expected to be bound to the
    /// respective channel.
    pub fn with_sinks(options: Options, stdout: Sink, stderr: Sink) -> Self {
        if stdout.channel() != Channel::Stdout || stderr.channel() != Channel::Stderr {
            log::warn!(
                "sinks are bound to {} and {}, but will be used for stdout and stderr respectively",
                stdout.channel(),
                stderr.channel()
            );
        }
        let Options {
            refresh_interval,
            hide_completed,
            disable_styling_when_not_tty,
            colored,
        } = options;
        Console {
            stations: [
                Station::new(stdout, refresh_interval),
                Station::new(stderr, refresh_interval),
            ],
            hide_completed: AtomicBool::new(hide_completed),
            disable_styling_when_not_tty: AtomicBool::new(disable_styling_when_not_tty),
            colored,
        }
    }

    /// The instance shared by the whole process, created with default [`Options`] on first use.
    pub fn global() -> Arc<Console> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Console::default())))
    }

    /// The services of `channel`.
    pub fn station(&self, channel: Channel) -> &Station {
        &self.stations[channel.index()]
    }

    /// Set the time between two periodic paints on `channel`, or on both channels if `None`.
    pub fn refresh_interval(&self, channel: Option<Channel>, interval: Duration) {
        for station in &self.stations {
            if channel.map_or(true, |channel| station.sink.channel() == channel) {
                station.periodic.set_interval(interval);
            }
        }
    }

    pub fn hide_completed(&self) -> bool {
        self.hide_completed.load(Ordering::Relaxed)
    }

    pub fn set_hide_completed(&self, hide: bool) {
        self.hide_completed.store(hide, Ordering::Relaxed);
    }

    pub fn disable_styling_when_not_tty(&self) -> bool {
        self.disable_styling_when_not_tty.load(Ordering::Relaxed)
    }

    pub fn set_disable_styling_when_not_tty(&self, disable: bool) {
        self.disable_styling_when_not_tty.store(disable, Ordering::Relaxed);
    }

    /// Return true if frames painted to `channel` may be colored right now.
    pub fn styling(&self, channel: Channel) -> bool {
        let is_terminal = self.station(channel).sink.is_terminal();
        self.colored && !(self.disable_styling_when_not_tty() && !is_terminal)
    }

    /// Stop and join the render threads of both channels.
    ///
    /// Bars still running lose their paint task and stop being painted. Starting a bar afterwards spawns the
    /// threads anew.
    pub fn shutdown(&self) {
        for station in &self.stations {
            station.periodic.dismiss();
            station.on_demand.dismiss();
            station.executor.shutdown();
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::with_options(Options::default())
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.shutdown();
    }
}
