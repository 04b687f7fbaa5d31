use std::{
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU8, Ordering},
};

/// The projection of every lifecycle shape onto what a painter needs to know.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Category {
    /// Not running. This is where every run starts and ends.
    Stop,
    /// Just started, the start frame is due.
    Awake,
    /// Running, refresh frames are due.
    Refresh,
    /// Done, the end frame is due.
    Finish,
}

/// A lifecycle shape of a bar, moving `Stop → Awake → Refresh → Finish → Stop` within one run.
///
/// Implementations are plain `u8` enums so their values can live in an [`AtomicLifecycle`].
pub trait Lifecycle: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const STOP: Self;
    const AWAKE: Self;
    const FINISH: Self;
    /// If true, runs without a total are rejected.
    const REQUIRES_TOTAL: bool;

    fn into_raw(self) -> u8;
    fn from_raw(raw: u8) -> Self;
    fn category(self) -> Category;
    /// The refreshing state to move to once the start frame was painted.
    fn refresh(bounded: bool) -> Self;
}

/// The lifecycle of bars which always count towards a known total.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum State {
    Stop,
    Awake,
    Refresh,
    Finish,
}

impl Lifecycle for State {
    const STOP: Self = State::Stop;
    const AWAKE: Self = State::Awake;
    const FINISH: Self = State::Finish;
    const REQUIRES_TOTAL: bool = true;

    fn into_raw(self) -> u8 {
        self as u8
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => State::Awake,
            2 => State::Refresh,
            3 => State::Finish,
            _ => State::Stop,
        }
    }

    fn category(self) -> Category {
        match self {
            State::Stop => Category::Stop,
            State::Awake => Category::Awake,
            State::Refresh => Category::Refresh,
            State::Finish => Category::Finish,
        }
    }

    fn refresh(_bounded: bool) -> Self {
        State::Refresh
    }
}

/// The lifecycle of bars which may not know their total, and only show activity then.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum DualState {
    Stop,
    Awake,
    /// Counting towards a known total.
    ProgressRefresh,
    /// Animating without a total, until reset.
    ActivityRefresh,
    Finish,
}

impl Lifecycle for DualState {
    const STOP: Self = DualState::Stop;
    const AWAKE: Self = DualState::Awake;
    const FINISH: Self = DualState::Finish;
    const REQUIRES_TOTAL: bool = false;

    fn into_raw(self) -> u8 {
        self as u8
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => DualState::Awake,
            2 => DualState::ProgressRefresh,
            3 => DualState::ActivityRefresh,
            4 => DualState::Finish,
            _ => DualState::Stop,
        }
    }

    fn category(self) -> Category {
        match self {
            DualState::Stop => Category::Stop,
            DualState::Awake => Category::Awake,
            DualState::ProgressRefresh | DualState::ActivityRefresh => Category::Refresh,
            DualState::Finish => Category::Finish,
        }
    }

    fn refresh(bounded: bool) -> Self {
        if bounded {
            DualState::ProgressRefresh
        } else {
            DualState::ActivityRefresh
        }
    }
}

/// A lifecycle state which can be shared between the caller and the render thread.
pub struct AtomicLifecycle<S> {
    raw: AtomicU8,
    _shape: PhantomData<S>,
}

impl<S: Lifecycle> AtomicLifecycle<S> {
    pub fn new(state: S) -> Self {
        AtomicLifecycle {
            raw: AtomicU8::new(state.into_raw()),
            _shape: PhantomData,
        }
    }

    pub fn load(&self) -> S {
        S::from_raw(self.raw.load(Ordering::Acquire))
    }

    pub fn store(&self, state: S) {
        self.raw.store(state.into_raw(), Ordering::Release);
    }

    /// Move from `from` to `to` if `from` is current, and return true on success.
    pub fn transit(&self, from: S, to: S) -> bool {
        self.raw
            .compare_exchange(from.into_raw(), to.into_raw(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn category(&self) -> Category {
        self.load().category()
    }
}

impl<S: Lifecycle> fmt::Debug for AtomicLifecycle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicLifecycle").field(&self.load()).finish()
    }
}
