use crate::{
    console::Channel,
    error::{Error, Result},
    exception::ExceptionBox,
    render::{capture, run_guarded, Policy, Scheduler, Task, ThreadExecutor},
    spin,
};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
enum State {
    Dormant,
    Finish,
    Active,
    Quit,
}

impl From<u8> for State {
    fn from(raw: u8) -> Self {
        match raw {
            0 => State::Dormant,
            1 => State::Finish,
            2 => State::Active,
            _ => State::Quit,
        }
    }
}

struct Shared {
    state: AtomicU8,
    task: RwLock<Option<Task>>,
    park: Mutex<()>,
    wake: Condvar,
}

impl Shared {
    fn state(&self) -> State {
        self.state.load(Ordering::Acquire).into()
    }

    fn transit(&self, from: State, to: State) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn store(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
        self.poke();
    }

    fn poke(&self) {
        let _guard = self.park.lock();
        self.wake.notify_all();
    }

    /// One iteration as run by the render thread: wait for a request, serve it, report back with `Finish`.
    fn cycle(&self, exceptions: &ExceptionBox) -> Result<()> {
        {
            let mut guard = self.park.lock();
            while matches!(self.state(), State::Dormant | State::Finish) {
                self.wake.wait(&mut guard);
            }
        }
        match self.state() {
            State::Active => {
                let task = self.task.read_recursive().clone();
                let outcome = task.map_or(Ok(()), |task| run_guarded(&*task));
                let outcome = capture(exceptions, outcome);
                self.transit(State::Active, State::Finish);
                outcome
            }
            State::Quit => {
                std::thread::yield_now();
                Ok(())
            }
            State::Dormant | State::Finish => Ok(()),
        }
    }
}

/// A scheduler that paints only when asked to, but still does so on the render thread of its channel.
///
/// Running the paint elsewhere than on the calling thread keeps concurrent callers from racing on the output,
/// and makes failures travel exactly like they do with the [`Periodic`](crate::render::Periodic) policy.
pub struct OnDemand {
    channel: Channel,
    shared: Arc<Shared>,
    executor: Arc<ThreadExecutor>,
    owns_executor: AtomicBool,
    serial: Mutex<()>,
}

impl OnDemand {
    /// Create a new instance painting on the thread of `executor`, which belongs to `channel`.
    pub fn new(channel: Channel, executor: Arc<ThreadExecutor>) -> Self {
        OnDemand {
            channel,
            shared: Arc::new(Shared {
                state: AtomicU8::new(State::Quit as u8),
                task: RwLock::new(None),
                park: Mutex::new(()),
                wake: Condvar::new(),
            }),
            executor,
            owns_executor: AtomicBool::new(false),
            serial: Mutex::new(()),
        }
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
        log::debug!("{}: on-demand renderer took over the render thread", self.channel);
        self.owns_executor.store(true, Ordering::Release);
        Ok(())
    }

    /// Have the render thread paint once and wait for it. The caller must hold `serial`.
    fn paint_once(&self) -> Result<()> {
        if self.shared.transit(State::Dormant, State::Active) {
            self.shared.poke();
            spin::until(|| self.shared.state() != State::Active || !self.executor.online());
            self.shared.transit(State::Finish, State::Dormant);
        }
        self.executor.exceptions().rethrow()
    }

    fn request(&self) -> Result<()> {
        let _serial = self.serial.lock();
        if self.shared.task.read().is_none() || !self.owns_executor.load(Ordering::Acquire) {
            return Ok(());
        }
        if !self.executor.online() {
            return self.executor.exceptions().rethrow();
        }
        self.paint_once()
    }
}

impl Scheduler for OnDemand {
    fn policy(&self) -> Policy {
        Policy::OnDemand
    }

    fn try_appoint(&self, task: Task) -> bool {
        let _serial = self.serial.lock();
        let mut slot = self.shared.task.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(task);
        true
    }

    /// Unlike its periodic counterpart, this paints at least once before returning, as nothing else would.
    fn activate(&self) -> Result<()> {
        let _serial = self.serial.lock();
        if self.shared.task.read().is_none() {
            return Ok(());
        }
        self.appoint_executor()?;
        self.shared.store(State::Dormant);
        self.executor.activate()?;
        self.paint_once()
    }

    fn attempt(&self) -> Result<()> {
        self.request()
    }

    fn execute(&self) -> Result<()> {
        self.request()
    }

    fn dismiss(&self) {
        self.dismiss_then(&mut || {});
    }

    fn dismiss_then(&self, cleanup: &mut dyn FnMut()) {
        let _serial = self.serial.lock();
        self.shared.store(State::Quit);
        if self.owns_executor.swap(false, Ordering::AcqRel) {
            self.executor.dismiss();
            log::debug!("{}: on-demand renderer released the render thread", self.channel);
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

impl Drop for OnDemand {
    fn drop(&mut self) {
        self.dismiss();
    }
}
