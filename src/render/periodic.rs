use crate::{
    console::Channel,
    error::{Error, Result},
    exception::ExceptionBox,
    render::{capture, run_guarded, Policy, Scheduler, Task, ThreadExecutor},
    spin,
};
use parking_lot::{Condvar, Mutex, RwLock};
use std::{
    convert::TryFrom,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
enum State {
    /// Just started: paint right away, then continue as `Active`.
    Awake,
    /// Sleep for one interval, then paint.
    Active,
    /// Someone waits for one extra paint right now.
    Attempt,
    Quit,
}

impl From<u8> for State {
    fn from(raw: u8) -> Self {
        match raw {
            0 => State::Awake,
            1 => State::Active,
            2 => State::Attempt,
            _ => State::Quit,
        }
    }
}

struct Shared {
    state: AtomicU8,
    task: RwLock<Option<Task>>,
    interval_nanos: AtomicU64,
    nap: Mutex<()>,
    wake: Condvar,
}

impl Shared {
    fn state(&self) -> State {
        self.state.load(Ordering::Acquire).into()
    }

    fn store(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
        self.poke();
    }

    fn transit(&self, from: State, to: State) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn poke(&self) {
        let _guard = self.nap.lock();
        self.wake.notify_all();
    }

    fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Relaxed))
    }

    /// Sleep for one interval, or until the state changes.
    fn nap(&self) {
        let deadline = Instant::now().checked_add(self.interval());
        let mut guard = self.nap.lock();
        while self.state() == State::Active {
            match deadline {
                Some(deadline) => {
                    if self.wake.wait_until(&mut guard, deadline).timed_out() {
                        break;
                    }
                }
                None => self.wake.wait(&mut guard),
            }
        }
    }

    fn paint(&self) -> Result<()> {
        let task = self.task.read_recursive().clone();
        match task {
            Some(task) => run_guarded(&*task),
            None => Ok(()),
        }
    }

    /// One iteration as run by the render thread.
    fn cycle(&self, exceptions: &ExceptionBox) -> Result<()> {
        match self.state() {
            State::Awake => {
                let outcome = capture(exceptions, self.paint());
                self.transit(State::Awake, State::Active);
                outcome
            }
            State::Active => {
                self.nap();
                // A pending failure is reported once, instead of failing again on every interval.
                if self.state() == State::Active && exceptions.is_empty() {
                    capture(exceptions, self.paint())
                } else {
                    Ok(())
                }
            }
            State::Attempt => {
                let outcome = capture(exceptions, self.paint());
                self.transit(State::Attempt, State::Active);
                outcome
            }
            State::Quit => {
                std::thread::yield_now();
                Ok(())
            }
        }
    }
}

/// A scheduler that repaints on a fixed interval, no matter how often progress is made.
///
/// Several progress updates between two paints are coalesced into one frame.
pub struct Periodic {
    channel: Channel,
    shared: Arc<Shared>,
    executor: Arc<ThreadExecutor>,
    owns_executor: AtomicBool,
}

impl Periodic {
    /// Create a new instance painting on the thread of `executor`, which belongs to `channel`, every `interval`.
    pub fn new(channel: Channel, executor: Arc<ThreadExecutor>, interval: Duration) -> Self {
        let periodic = Periodic {
            channel,
            shared: Arc::new(Shared {
                state: AtomicU8::new(State::Quit as u8),
                task: RwLock::new(None),
                interval_nanos: AtomicU64::new(0),
                nap: Mutex::new(()),
                wake: Condvar::new(),
            }),
            executor,
            owns_executor: AtomicBool::new(false),
        };
        periodic.set_interval(interval);
        periodic
    }

    /// The time between two paints.
    pub fn interval(&self) -> Duration {
        self.shared.interval()
    }

    /// Set the time between two paints, effective from the next paint on.
    pub fn set_interval(&self, interval: Duration) {
        let nanos = u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX);
        self.shared.interval_nanos.store(nanos, Ordering::Relaxed);
    }

    fn appoint_executor(&self) -> Result<()> {
        if self.owns_executor.load(Ordering::Acquire) {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let exceptions = Arc::clone(self.executor.exceptions());
        if !self
            .executor
            .try_appoint(Arc::new(move || shared.cycle(&exceptions)))
        {
            return Err(Error::Occupied(self.channel));
        }
        log::debug!("{}: periodic renderer took over the render thread", self.channel);
        self.owns_executor.store(true, Ordering::Release);
        Ok(())
    }
}

impl Scheduler for Periodic {
    fn policy(&self) -> Policy {
        Policy::Periodic
    }

    fn try_appoint(&self, task: Task) -> bool {
        let mut slot = self.shared.task.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(task);
        true
    }

    fn activate(&self) -> Result<()> {
        let task = self.shared.task.read();
        if task.is_none() {
            return Ok(());
        }
        self.appoint_executor()?;
        self.shared.store(State::Awake);
        self.executor.activate()?;
        spin::until(|| self.shared.state() != State::Awake || !self.executor.online());
        self.executor.exceptions().rethrow()
    }

    fn attempt(&self) -> Result<()> {
        let task = self.shared.task.read();
        if task.is_none() || !self.owns_executor.load(Ordering::Acquire) {
            return Ok(());
        }
        let settled = || self.shared.state() != State::Attempt || !self.executor.online();
        // A pass requested by someone else may have started before our caller changed anything, so wait for
        // it to end and request one of our own.
        loop {
            if self.shared.transit(State::Active, State::Attempt) {
                self.shared.poke();
                spin::until(settled);
                break;
            }
            match self.shared.state() {
                State::Active => continue,
                State::Attempt if self.executor.online() => spin::until(settled),
                State::Awake | State::Attempt | State::Quit => break,
            }
        }
        self.executor.exceptions().rethrow()
    }

    fn execute(&self) -> Result<()> {
        let exceptions = self.executor.exceptions();
        if exceptions.is_empty() || !self.owns_executor.load(Ordering::Acquire) {
            return Ok(());
        }
        exceptions.rethrow()
    }

    fn dismiss(&self) {
        self.dismiss_then(&mut || {});
    }

    fn dismiss_then(&self, cleanup: &mut dyn FnMut()) {
        self.shared.store(State::Quit);
        if self.owns_executor.swap(false, Ordering::AcqRel) {
            self.executor.dismiss();
            log::debug!("{}: periodic renderer released the render thread", self.channel);
        }
        let mut task = self.shared.task.write();
        task.take();
        cleanup();
    }

    fn empty(&self) -> bool {
        self.shared.task.read().is_none()
    }

    fn online(&self) -> bool {
        self.owns_executor.load(Ordering::Acquire) && self.executor.online() && self.shared.state() != State::Quit
    }
}

impl Drop for Periodic {
    fn drop(&mut self) {
        self.dismiss();
    }
}
