use crate::{
    bar::{AtomicLifecycle, Category, Lifecycle},
    frame::{Frame, FrameBuilder, Snapshot},
    line::{self, Sink},
    Result,
};
use parking_lot::Mutex;
use std::{
    convert::TryFrom,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

/// How a tick moves the counter.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Advance {
    By(u64),
    ToPercent(u8),
}

/// The part of a bar shared with the render thread: its lifecycle, its counters, and how to paint them.
pub(crate) struct Core<S> {
    description: String,
    pub state: AtomicLifecycle<S>,
    current: AtomicU64,
    /// The total of the current run.
    total: AtomicU64,
    zero_point: Mutex<Instant>,
    frames: AtomicU64,
    end_painted: AtomicBool,
    colored: AtomicBool,
    builder: Arc<dyn FrameBuilder>,
    text: Mutex<String>,
    /// The end frame of the last run, repeated by multi-bars for as long as the line stays visible.
    end_text: Mutex<String>,
}

impl<S: Lifecycle> Core<S> {
    pub fn new(description: String, builder: Arc<dyn FrameBuilder>) -> Self {
        Core {
            description,
            state: AtomicLifecycle::new(S::STOP),
            current: AtomicU64::new(0),
            total: AtomicU64::new(0),
            zero_point: Mutex::new(Instant::now()),
            frames: AtomicU64::new(0),
            end_painted: AtomicBool::new(false),
            colored: AtomicBool::new(false),
            builder,
            text: Mutex::new(String::new()),
            end_text: Mutex::new(String::new()),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Category {
        self.state.category()
    }

    /// Return true if the run is past its start and not yet finishing.
    pub fn running(&self) -> bool {
        matches!(self.category(), Category::Awake | Category::Refresh)
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Return true if a bounded run reached its total.
    pub fn complete(&self) -> bool {
        let total = self.total();
        total > 0 && self.current() >= total
    }

    /// Prepare a new run over `total` ticks and move to the starting state.
    pub fn start_run(&self, total: u64, colored: bool) {
        self.current.store(0, Ordering::Release);
        self.total.store(total, Ordering::Release);
        *self.zero_point.lock() = Instant::now();
        self.frames.store(0, Ordering::Relaxed);
        self.end_painted.store(false, Ordering::Relaxed);
        self.end_text.lock().clear();
        self.colored.store(colored, Ordering::Relaxed);
        self.state.store(S::AWAKE);
    }

    pub fn advance(&self, advance: Advance) {
        let total = self.total();
        match advance {
            Advance::By(n) => {
                self.current
                    .fetch_update(Ordering::Release, Ordering::Acquire, |current| {
                        let next = current.saturating_add(n);
                        Some(if total > 0 { next.min(total) } else { next })
                    })
                    .ok();
            }
            Advance::ToPercent(percent) => {
                let target = u128::from(total) * u128::from(percent) / 100;
                self.current
                    .fetch_max(u64::try_from(target).unwrap_or(total), Ordering::AcqRel);
            }
        }
    }

    /// Build `frame` into `out`. Once the start frame is built, the run moves on to refreshing.
    fn build(&self, out: &mut String, frame: Frame, width: u16) -> Result<()> {
        let total = self.total();
        let snapshot = Snapshot {
            description: &self.description,
            current: self.current(),
            total,
            elapsed: self.zero_point.lock().elapsed(),
            frame: self.frames.load(Ordering::Relaxed),
            colored: self.colored.load(Ordering::Relaxed),
            width,
        };
        out.clear();
        self.builder.build(out, frame, &snapshot)?;
        self.frames.fetch_add(1, Ordering::Relaxed);
        if frame == Frame::Start {
            self.state.transit(S::AWAKE, S::refresh(total > 0));
        }
        Ok(())
    }

    /// Paint the frame that is due into its own line of `sink`. The end frame is painted only once.
    pub fn paint_solo(&self, sink: &Sink) -> Result<()> {
        let frame = match self.category() {
            Category::Stop => return Ok(()),
            Category::Awake => Frame::Start,
            Category::Refresh => Frame::Refresh,
            Category::Finish => {
                if self.end_painted.swap(true, Ordering::AcqRel) {
                    return Ok(());
                }
                Frame::End
            }
        };
        let mut text = self.text.lock();
        self.build(&mut text, frame, sink.width())?;
        sink.render(|out| {
            line::solo(out, &text, frame == Frame::End, sink.is_terminal())?;
            Ok(())
        })
    }

    /// Build the line this bar occupies within a multi-bar into `out`, and return true if it is visible at all.
    ///
    /// `was_visible` is true if the line was shown in the previous pass, which keeps the end frame of
    /// stopped bars around unless `hide_completed` is set.
    pub fn slot_line(&self, out: &mut String, hide_completed: bool, was_visible: bool, width: u16) -> Result<bool> {
        match self.category() {
            Category::Stop => {
                if !was_visible || hide_completed {
                    return Ok(false);
                }
                out.clone_from(&self.end_text.lock());
                Ok(!out.is_empty())
            }
            Category::Finish if hide_completed => Ok(false),
            Category::Finish => {
                let mut end = self.end_text.lock();
                if !self.end_painted.swap(true, Ordering::AcqRel) {
                    self.build(&mut end, Frame::End, width)?;
                }
                out.clone_from(&end);
                Ok(true)
            }
            Category::Awake => self.build(out, Frame::Start, width).map(|()| true),
            Category::Refresh => self.build(out, Frame::Refresh, width).map(|()| true),
        }
    }
}
