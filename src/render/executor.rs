use crate::{
    error::{Error, Result},
    exception::ExceptionBox,
    render::{run_guarded, Task},
    spin,
};
use parking_lot::{Condvar, Mutex, RwLock};
use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    thread::{JoinHandle, ThreadId},
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
enum State {
    Dormant,
    Suspend,
    Active,
    Dead,
}

impl From<u8> for State {
    fn from(raw: u8) -> Self {
        match raw {
            0 => State::Dormant,
            1 => State::Suspend,
            2 => State::Active,
            _ => State::Dead,
        }
    }
}

struct Shared {
    state: AtomicU8,
    task: RwLock<Option<Task>>,
    exceptions: Arc<ExceptionBox>,
    park: Mutex<()>,
    wake: Condvar,
}

impl Shared {
    fn state(&self) -> State {
        self.state.load(Ordering::Acquire).into()
    }

    fn store(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn transit(&self, from: State, to: State) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn notify(&self) {
        let _guard = self.park.lock();
        self.wake.notify_all();
    }

    fn run(&self) {
        loop {
            match self.state() {
                State::Dormant => {
                    let mut guard = self.park.lock();
                    while self.state() == State::Dormant {
                        self.wake.wait(&mut guard);
                    }
                }
                State::Suspend => {
                    self.transit(State::Suspend, State::Dormant);
                }
                State::Active => {
                    let task = self.task.read_recursive().clone();
                    let task = match task {
                        Some(task) => task,
                        None => {
                            self.transit(State::Active, State::Dormant);
                            continue;
                        }
                    };
                    if let Err(err) = run_guarded(&*task) {
                        if !self.exceptions.try_store(err.clone()) {
                            let pending = self.exceptions.load();
                            log::error!(
                                "render task failed while a previous failure was still pending, aborting: {} (pending: {})",
                                err,
                                pending.map_or_else(String::new, |pending| pending.to_string())
                            );
                            std::process::abort();
                        }
                    }
                }
                State::Dead => break,
            }
        }
    }
}

/// The owner of exactly one background thread, which repeatedly runs a single installed [`Task`] while active.
///
/// The thread is spawned lazily on the first [`activate()`](ThreadExecutor::activate()), parks while there is
/// nothing to do and lives until [`shutdown()`](ThreadExecutor::shutdown()) or until the executor is dropped.
/// Failures returned by the task, as well as panics, are captured and handed to the next caller of `activate()`.
/// A failure occurring while a previous one is still pending can't be handed to anyone, and aborts the process.
pub struct ThreadExecutor {
    name: String,
    shared: Arc<Shared>,
    thread: Mutex<Option<(JoinHandle<()>, ThreadId)>>,
}

impl ThreadExecutor {
    /// Create a new instance whose thread, once spawned, will carry the given `name`.
    pub fn new(name: impl Into<String>) -> Self {
        ThreadExecutor {
            name: name.into(),
            shared: Arc::new(Shared {
                state: AtomicU8::new(State::Dead as u8),
                task: RwLock::new(None),
                exceptions: Arc::new(ExceptionBox::new()),
                park: Mutex::new(()),
                wake: Condvar::new(),
            }),
            thread: Mutex::new(None),
        }
    }

    /// Install `task` if no task is installed yet and return true, or return false otherwise.
    ///
    /// This doesn't start the thread.
    pub fn try_appoint(&self, task: Task) -> bool {
        let mut slot = self.shared.task.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(task);
        true
    }

    /// Spawn the thread if necessary and let it run the installed task.
    ///
    /// A failure captured by the thread since the last call is returned, even though the thread keeps running.
    pub fn activate(&self) -> Result<()> {
        if self.shared.state() == State::Dead {
            self.spawn()?;
        }
        if self.shared.transit(State::Dormant, State::Active) {
            log::trace!("{}: activated", self.name);
            self.shared.notify();
        }
        self.shared.exceptions.rethrow()
    }

    /// Stop running the task and wait until the thread parked.
    ///
    /// A failure captured during the cycle that is being suspended is discarded.
    pub fn suspend(&self) {
        if self.shared.transit(State::Active, State::Suspend) && !self.on_own_thread() {
            spin::until(|| self.shared.state() != State::Suspend);
        }
        if let Some(err) = self.shared.exceptions.clear() {
            log::warn!("{}: discarding failure of a suspended cycle: {}", self.name, err);
        }
    }

    /// Suspend the thread and remove the installed task, allowing another one to be appointed.
    pub fn dismiss(&self) {
        self.suspend();
        self.shared.task.write().take();
    }

    /// Stop the thread for good and wait for it to finish.
    ///
    /// A later [`activate()`](ThreadExecutor::activate()) spawns a new one.
    pub fn shutdown(&self) {
        self.shared.store(State::Dead);
        self.shared.notify();
        let thread = self.thread.lock().take();
        if let Some((handle, id)) = thread {
            if id == std::thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::warn!("{}: render thread ended with a panic", self.name);
            } else {
                log::debug!("{}: render thread joined", self.name);
            }
        }
    }

    /// Return true if no task is installed.
    pub fn empty(&self) -> bool {
        self.shared.task.read().is_none()
    }

    /// Return true if the thread is currently running the installed task.
    pub fn online(&self) -> bool {
        self.shared.state() == State::Active
    }

    /// Return true if there is a thread, parked or not.
    pub fn alive(&self) -> bool {
        self.shared.state() != State::Dead
    }

    /// The box through which the thread hands failures to callers.
    pub fn exceptions(&self) -> &Arc<ExceptionBox> {
        &self.shared.exceptions
    }

    fn on_own_thread(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .map_or(false, |(_, id)| *id == std::thread::current().id())
    }

    fn spawn(&self) -> Result<()> {
        let mut thread = self.thread.lock();
        if self.shared.state() != State::Dead {
            return Ok(());
        }
        if let Some((previous, _)) = thread.take() {
            previous.join().ok();
        }
        self.shared.store(State::Dormant);
        let shared = Arc::clone(&self.shared);
        match std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || shared.run())
        {
            Ok(handle) => {
                log::debug!("{}: spawned render thread", self.name);
                let id = handle.thread().id();
                *thread = Some((handle, id));
                Ok(())
            }
            Err(err) => {
                self.shared.store(State::Dead);
                Err(Error::Spawn(Arc::new(err)))
            }
        }
    }
}

impl Drop for ThreadExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
