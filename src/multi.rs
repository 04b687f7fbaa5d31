//! Several bars sharing one render thread and one region of the terminal.
//!
//! Slots start and finish independently. The first slot to start takes over the render thread of the channel for
//! the whole multi-bar, and the last one to finish gives it back. Every pass repaints all visible slots in index
//! order, after moving the cursor up by the amount of lines painted in the previous pass.
use crate::{
    bar::{Bar, Core, Host, Lifecycle, State},
    console::{Channel, Console},
    line,
    render::{Policy, Scheduler, Task},
    BarOptions, Error, Result,
};
use parking_lot::Mutex;
use std::{
    sync::{
        atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// The most slots a multi-bar can have, as each of them owns one bit of the active mask.
pub const MAX_BARS: usize = 64;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
enum Phase {
    Stop,
    Awake,
    Refresh,
}

impl From<u8> for Phase {
    fn from(raw: u8) -> Self {
        match raw {
            1 => Phase::Awake,
            2 => Phase::Refresh,
            _ => Phase::Stop,
        }
    }
}

/// The state all slots of a multi-bar share.
pub(crate) struct Group<S> {
    console: Arc<Console>,
    channel: Channel,
    scheduler: Arc<dyn Scheduler>,
    cores: Vec<Arc<Core<S>>>,
    schedule: Mutex<()>,
    alive: AtomicUsize,
    phase: AtomicU8,
    /// One bit per slot painted in the last pass.
    mask: AtomicU64,
    text: Mutex<String>,
}

impl<S: Lifecycle> Group<S> {
    pub fn core(&self, index: usize) -> Arc<Core<S>> {
        Arc::clone(&self.cores[index])
    }

    pub fn styling(&self) -> bool {
        self.console.styling(self.channel)
    }

    fn phase(&self) -> Phase {
        self.phase.load(Ordering::Acquire).into()
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Paint all visible slots, as run by the render thread.
    fn paint(&self) -> Result<()> {
        let sink = self.console.station(self.channel).sink();
        let hide_completed = self.console.hide_completed();
        let is_terminal = sink.is_terminal();
        let width = sink.width();
        let previous = self.mask.load(Ordering::Acquire);
        let mut mask = 0;
        let mut text = self.text.lock();
        sink.render(|out| {
            if is_terminal {
                line::region_begin(out, previous.count_ones())?;
            }
            for (index, core) in self.cores.iter().enumerate() {
                let bit = 1 << index;
                if core.slot_line(&mut text, hide_completed, previous & bit != 0, width)? {
                    line::region_line(out, &text, is_terminal)?;
                    mask |= bit;
                }
            }
            if is_terminal {
                line::region_end(out)?;
            }
            Ok(())
        })?;
        self.mask.store(mask, Ordering::Release);
        Ok(())
    }

    /// Account for slot `index` starting, taking over the render thread if it's the first one.
    pub fn boot(self: &Arc<Self>, index: usize) -> Result<()> {
        let _schedule = self.schedule.lock();
        if self.phase() == Phase::Stop {
            self.mask.store(0, Ordering::Release);
            let group = Arc::downgrade(self);
            let task: Task = Arc::new(move || group.upgrade().map_or(Ok(()), |group| group.paint()));
            if !self.scheduler.try_appoint(task) {
                return Err(Error::Occupied(self.channel));
            }
            self.alive.fetch_add(1, Ordering::AcqRel);
            self.set_phase(Phase::Awake);
            if let Err(err) = self.scheduler.activate() {
                self.alive.fetch_sub(1, Ordering::AcqRel);
                self.set_phase(Phase::Stop);
                self.scheduler.dismiss();
                return Err(err);
            }
            self.set_phase(Phase::Refresh);
            log::debug!("{}: multi-bar took over the render thread with slot {}", self.channel, index);
        } else {
            self.alive.fetch_add(1, Ordering::AcqRel);
            if let Err(err) = self.scheduler.attempt() {
                self.alive.fetch_sub(1, Ordering::AcqRel);
                return Err(err);
            }
            log::trace!("{}: slot {} joined the multi-bar", self.channel, index);
        }
        Ok(())
    }

    pub fn execute(&self) -> Result<()> {
        self.scheduler.execute()
    }

    /// Account for a slot stopping, painting once more first if `paint` is true.
    ///
    /// The render thread is released once no slot is left running.
    pub fn halt(&self, paint: bool) -> Result<()> {
        let _schedule = self.schedule.lock();
        let painted = if paint { self.scheduler.attempt() } else { Ok(()) };
        let previous = self
            .alive
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |alive| alive.checked_sub(1));
        if previous == Ok(1) {
            self.set_phase(Phase::Stop);
            let sink = self.console.station(self.channel).sink();
            self.scheduler.dismiss_then(&mut || sink.release());
            log::debug!("{}: multi-bar released the render thread", self.channel);
        }
        painted
    }
}

/// A fixed set of bars painted together into one region of a channel.
///
/// ```rust,no_run
/// use tickbar::{BarOptions, MultiBar};
/// let multi: MultiBar = MultiBar::new(vec![
///     BarOptions { description: "fetch".into(), total: 3, ..BarOptions::default() },
///     BarOptions { description: "build".into(), total: 7, ..BarOptions::default() },
/// ])?;
/// multi.at(0).expect("first bar").tick()?;
/// # Ok::<_, tickbar::Error>(())
/// ```
pub struct MultiBar<S: Lifecycle = State> {
    group: Arc<Group<S>>,
    bars: Vec<Bar<S>>,
}

impl<S: Lifecycle> MultiBar<S> {
    /// Create a multi-bar with one slot per entry of `options`, painting to `channel` of `console` with the
    /// scheduler of `policy`.
    pub fn with_console(
        console: Arc<Console>,
        channel: Channel,
        policy: Policy,
        options: Vec<BarOptions>,
    ) -> Result<Self> {
        if options.len() > MAX_BARS {
            return Err(Error::TooManyBars(options.len()));
        }
        let scheduler = console.station(channel).scheduler(policy);
        let cores = options
            .iter()
            .map(|options| Arc::new(Core::new(options.description.clone(), Arc::clone(&options.builder))))
            .collect();
        let group = Arc::new(Group {
            console,
            channel,
            scheduler,
            cores,
            schedule: Mutex::new(()),
            alive: AtomicUsize::new(0),
            phase: AtomicU8::new(Phase::Stop as u8),
            mask: AtomicU64::new(0),
            text: Mutex::new(String::new()),
        });
        let bars = options
            .into_iter()
            .enumerate()
            .map(|(index, options)| {
                Bar::from_parts(
                    options,
                    Host::Slot {
                        group: Arc::clone(&group),
                        index,
                    },
                )
            })
            .collect::<Result<_>>()?;
        Ok(MultiBar { group, bars })
    }

    /// Create a multi-bar painting periodically to standard output through the global [`Console`].
    pub fn new(options: Vec<BarOptions>) -> Result<Self> {
        MultiBar::with_console(Console::global(), Channel::Stdout, Policy::Periodic, options)
    }

    /// The amount of slots.
    pub fn size(&self) -> usize {
        self.bars.len()
    }

    /// The amount of slots with a run in progress.
    pub fn active_size(&self) -> usize {
        self.group.alive.load(Ordering::Acquire)
    }

    /// The bar in slot `index`, if there is one.
    pub fn at(&self, index: usize) -> Option<&Bar<S>> {
        self.bars.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bar<S>> {
        self.bars.iter()
    }

    /// One bit per slot that was painted in the most recent pass.
    ///
    /// The amount of set bits is the amount of lines the next pass moves up before painting.
    pub fn active_mask(&self) -> u64 {
        self.group.mask.load(Ordering::Acquire)
    }

    /// Return true if at least one slot is running.
    pub fn active(&self) -> bool {
        self.bars.iter().any(Bar::active)
    }

    /// Block until no slot is running.
    pub fn wait(&self) {
        crate::spin::until(|| !self.active());
    }

    /// Block until no slot is running or `timeout` passed, and return false in the latter case.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        crate::spin::until_timeout(|| !self.active(), timeout)
    }

    /// Finish every running slot, see [`Bar::reset()`]. The first failure is returned.
    pub fn reset(&self) -> Result<()> {
        self.bars
            .iter()
            .map(Bar::reset)
            .fold(Ok(()), |result, reset| result.and(reset))
    }

    /// Abort every running slot, see [`Bar::abort()`].
    pub fn abort(&self) {
        for bar in &self.bars {
            bar.abort();
        }
    }
}
