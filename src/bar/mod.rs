//! Single progress bars and their lifecycle.
//!
//! A bar is stopped until it is ticked. The first tick starts a run: the bar takes over the render thread of its
//! channel (or joins the one of its multi-bar), which paints a start frame, refresh frames while progress is made
//! and an end frame once the counter reaches the total, after which the render thread is released again.
//!
//! ```rust,no_run
//! use tickbar::{BarOptions, ProgressBar};
//! let bar: ProgressBar = BarOptions { total: 3, ..BarOptions::default() }.create()?;
//! bar.on_finish(|| eprintln!("all done"));
//! for _ in 0..3 {
//!     bar.tick()?;
//! }
//! bar.wait();
//! # Ok::<_, tickbar::Error>(())
//! ```
use crate::{
    console::{Channel, Console},
    multi::Group,
    render::{Policy, Scheduler},
    BarOptions, Error, Result,
};
use parking_lot::{Mutex, ReentrantMutex};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

mod state;
pub use state::{AtomicLifecycle, Category, DualState, Lifecycle, State};

mod inner;
pub(crate) use inner::{Advance, Core};

/// The code to run once a run finished, right before the bar stops.
enum Hook<S: Lifecycle> {
    None,
    Nullary(Box<dyn FnMut() + Send>),
    Unary(Box<dyn FnMut(&Bar<S>) + Send>),
}

impl<S: Lifecycle> Default for Hook<S> {
    fn default() -> Self {
        Hook::None
    }
}

/// Where a bar paints: on its own, or as a slot of a multi-bar.
pub(crate) enum Host<S: Lifecycle> {
    Solo {
        console: Arc<Console>,
        channel: Channel,
        scheduler: Arc<dyn Scheduler>,
    },
    Slot {
        group: Arc<Group<S>>,
        index: usize,
    },
}

impl<S: Lifecycle> Host<S> {
    fn styling(&self) -> bool {
        match self {
            Host::Solo { console, channel, .. } => console.styling(*channel),
            Host::Slot { group, .. } => group.styling(),
        }
    }

    fn boot(&self, core: &Arc<Core<S>>) -> Result<()> {
        match self {
            Host::Solo {
                console,
                channel,
                scheduler,
            } => {
                let sink = Arc::clone(console.station(*channel).sink());
                let task_core = Arc::clone(core);
                if !scheduler.try_appoint(Arc::new(move || task_core.paint_solo(&sink))) {
                    return Err(Error::Occupied(*channel));
                }
                if let Err(err) = scheduler.activate() {
                    scheduler.dismiss();
                    return Err(err);
                }
                log::debug!("{}: bar '{}' started", channel, core.description());
                Ok(())
            }
            Host::Slot { group, index } => group.boot(*index),
        }
    }

    fn execute(&self) -> Result<()> {
        match self {
            Host::Solo { scheduler, .. } => scheduler.execute(),
            Host::Slot { group, .. } => group.execute(),
        }
    }

    /// Release the render thread once the run is over, painting a last time first if `paint` is true.
    fn halt(&self, paint: bool) -> Result<()> {
        match self {
            Host::Solo {
                console,
                channel,
                scheduler,
            } => {
                let painted = if paint { scheduler.attempt() } else { Ok(()) };
                let sink = console.station(*channel).sink();
                scheduler.dismiss_then(&mut || sink.release());
                log::debug!("{}: bar released the render thread", channel);
                painted
            }
            Host::Slot { group, .. } => group.halt(paint),
        }
    }
}

/// A progress bar, counting ticks towards a total and painting its progress from a render thread.
///
/// `S` is the shape of its lifecycle: [`State`] for bars which always know their total, [`DualState`] for bars
/// that just show activity while their total is zero.
pub struct Bar<S: Lifecycle = State> {
    core: Arc<Core<S>>,
    total: AtomicU64,
    lock: ReentrantMutex<()>,
    hook: Mutex<Hook<S>>,
    host: Host<S>,
}

impl<S: Lifecycle> Bar<S> {
    /// Create a bar painting to `channel` of `console`, driven by the scheduler of `policy`.
    pub fn with_console(console: Arc<Console>, channel: Channel, policy: Policy, options: BarOptions) -> Result<Self> {
        let scheduler = console.station(channel).scheduler(policy);
        Bar::from_parts(
            options,
            Host::Solo {
                console,
                channel,
                scheduler,
            },
        )
    }

    /// Create a bar painting periodically to standard output through the global [`Console`].
    pub fn new(options: BarOptions) -> Result<Self> {
        Bar::with_console(Console::global(), Channel::Stdout, Policy::Periodic, options)
    }

    pub(crate) fn from_parts(options: BarOptions, host: Host<S>) -> Result<Self> {
        let BarOptions {
            description,
            total,
            builder,
        } = options;
        if S::REQUIRES_TOTAL && total == 0 {
            return Err(Error::InvalidTotal);
        }
        let core = match &host {
            Host::Slot { group, index } => group.core(*index),
            Host::Solo { .. } => Arc::new(Core::new(description, builder)),
        };
        Ok(Bar {
            core,
            total: AtomicU64::new(total),
            lock: ReentrantMutex::new(()),
            hook: Mutex::new(Hook::None),
            host,
        })
    }

    /// Advance by one tick, starting a run if the bar is stopped.
    ///
    /// Errors may stem from a previous paint on the render thread, even if this tick itself succeeded.
    pub fn tick(&self) -> Result<()> {
        self.tick_by(1)
    }

    /// Advance by `n` ticks, starting a run if the bar is stopped.
    pub fn tick_by(&self, n: u64) -> Result<()> {
        self.do_tick(Advance::By(n))
    }

    /// Advance to `percent` of the total, starting a run if the bar is stopped. The counter never moves back.
    pub fn tick_to(&self, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(Error::InvalidPercentage(percent));
        }
        self.do_tick(Advance::ToPercent(percent))
    }

    fn do_tick(&self, advance: Advance) -> Result<()> {
        if self.core.category() == Category::Stop {
            let _guard = self.lock.lock();
            if self.core.category() == Category::Stop {
                self.boot()?;
            }
        }
        self.core.advance(advance);
        let painted = self.host.execute();
        let completed = self.try_complete();
        painted.and(completed)
    }

    fn boot(&self) -> Result<()> {
        let total = self.total.load(Ordering::Acquire);
        if S::REQUIRES_TOTAL && total == 0 {
            return Err(Error::InvalidTotal);
        }
        self.core.start_run(total, self.host.styling());
        if let Err(err) = self.host.boot(&self.core) {
            self.core.state.store(S::STOP);
            return Err(err);
        }
        Ok(())
    }

    /// Finish the run if the counter reached the total, unless another thread is already busy with this bar.
    fn try_complete(&self) -> Result<()> {
        if !self.core.complete() {
            return Ok(());
        }
        match self.lock.try_lock() {
            Some(_guard) if self.core.running() && self.core.complete() => self.finish(),
            _ => Ok(()),
        }
    }

    /// Paint the end frame, release the render thread and call the hook. Must be called with the bar locked.
    fn finish(&self) -> Result<()> {
        self.core.state.store(S::FINISH);
        let painted = self.host.halt(true);
        self.call_hook();
        self.core.state.store(S::STOP);
        painted
    }

    fn call_hook(&self) {
        let mut hook = std::mem::take(&mut *self.hook.lock());
        match &mut hook {
            Hook::None => return,
            Hook::Nullary(f) => f(),
            Hook::Unary(f) => f(self),
        }
        let mut slot = self.hook.lock();
        if let Hook::None = *slot {
            *slot = hook;
        }
    }

    /// Finish the current run right away, as if it was complete, painting its end frame and calling the hook.
    ///
    /// Does nothing if the bar isn't running.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.lock.lock();
        if !self.core.running() {
            return Ok(());
        }
        self.finish()
    }

    /// Stop the current run without painting an end frame or calling the hook.
    ///
    /// Failures are logged instead of returned. Stopping waits for a paint in progress, but nothing else.
    pub fn abort(&self) {
        let _guard = self.lock.lock();
        if !self.core.running() {
            return;
        }
        self.core.state.store(S::STOP);
        if let Err(err) = self.host.halt(false) {
            log::warn!("ignoring failure while aborting bar '{}': {}", self.core.description(), err);
        }
    }

    /// Return true if a run is in progress.
    pub fn active(&self) -> bool {
        self.core.category() != Category::Stop
    }

    /// Block until the current run is over.
    pub fn wait(&self) {
        crate::spin::until(|| !self.active());
    }

    /// Block until the current run is over or `timeout` passed, and return false in the latter case.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        crate::spin::until_timeout(|| !self.active(), timeout)
    }

    /// Call `hook` whenever a run finished, replacing the previous hook.
    pub fn on_finish(&self, hook: impl FnMut() + Send + 'static) {
        *self.hook.lock() = Hook::Nullary(Box::new(hook));
    }

    /// Call `hook` with this bar whenever a run finished, replacing the previous hook.
    pub fn on_finish_with(&self, hook: impl FnMut(&Bar<S>) + Send + 'static) {
        *self.hook.lock() = Hook::Unary(Box::new(hook));
    }

    /// Remove the finish hook, if any.
    pub fn clear_hook(&self) {
        *self.hook.lock() = Hook::None;
    }

    /// The ticks made in the current or last run.
    pub fn progress(&self) -> u64 {
        self.core.current()
    }

    /// The total used by the next run.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Set the total for the next run.
    pub fn set_total(&self, total: u64) -> Result<()> {
        if S::REQUIRES_TOTAL && total == 0 {
            return Err(Error::InvalidTotal);
        }
        self.total.store(total, Ordering::Release);
        Ok(())
    }

    /// The description given in the options.
    pub fn description(&self) -> &str {
        self.core.description()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> S {
        self.core.state.load()
    }

    /// The current lifecycle state, as seen by the render thread.
    pub fn category(&self) -> Category {
        self.core.category()
    }
}

impl<S: Lifecycle> Drop for Bar<S> {
    fn drop(&mut self) {
        self.abort();
    }
}

impl<S: Lifecycle> fmt::Debug for Bar<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Bar");
        s.field("description", &self.description())
            .field("state", &self.state())
            .field("progress", &self.progress())
            .field("total", &self.total());
        if let Host::Slot { index, .. } = &self.host {
            s.field("slot", index);
        }
        s.finish()
    }
}
