use parking_lot::Mutex;
use std::{
    fmt::Write as _,
    io, process,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tickbar::{line::Sink, BarOptions, Channel, Console, Error, Frame, FrameBuilder, Options};

pub fn init_logger() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// A writer keeping everything in memory, shareable with the test that inspects it.
#[derive(Clone, Default)]
pub struct Output(Arc<Mutex<Vec<u8>>>);

impl Output {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(ToOwned::to_owned).collect()
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A console whose channels are piped into memory, repainting every millisecond.
pub struct Setup {
    pub console: Arc<Console>,
    pub stdout: Output,
    pub stderr: Output,
}

pub fn console(hide_completed: bool) -> Setup {
    console_with(hide_completed, false)
}

/// Like [`console()`], but stdout claims to be a terminal and receives cursor control sequences.
pub fn terminal_console(hide_completed: bool) -> Setup {
    console_with(hide_completed, true)
}

fn console_with(hide_completed: bool, stdout_is_terminal: bool) -> Setup {
    init_logger();
    let (stdout, stderr) = (Output::default(), Output::default());
    let console = Console::with_sinks(
        Options {
            refresh_interval: Duration::from_millis(1),
            hide_completed,
            disable_styling_when_not_tty: true,
            colored: false,
        },
        Sink::new(Channel::Stdout, stdout.clone(), stdout_is_terminal).with_columns(80),
        Sink::new(Channel::Stderr, stderr.clone(), false),
    );
    Setup {
        console: Arc::new(console),
        stdout,
        stderr,
    }
}

/// A frame builder writing `<label>:<frame>:<current>/<total>` and remembering every frame it built.
///
/// It fails with "broken" on the build number given to [`Recorder::failing_at()`], counting from 1, or on
/// that build and every later one with [`Recorder::failing_from()`].
#[derive(Default)]
pub struct Recorder {
    label: String,
    frames: Mutex<Vec<Frame>>,
    builds: AtomicUsize,
    fail_at: usize,
    keep_failing: bool,
}

impl Recorder {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Recorder {
            label: label.into(),
            ..Default::default()
        })
    }

    pub fn failing_at(label: &str, build: usize) -> Arc<Self> {
        Arc::new(Recorder {
            label: label.into(),
            fail_at: build,
            ..Default::default()
        })
    }

    pub fn failing_from(label: &str, build: usize) -> Arc<Self> {
        Arc::new(Recorder {
            label: label.into(),
            fail_at: build,
            keep_failing: true,
            ..Default::default()
        })
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn count(&self, frame: Frame) -> usize {
        self.frames.lock().iter().filter(|f| **f == frame).count()
    }

    /// Options for a bar with the given `total`, painted by this recorder.
    pub fn options(self: &Arc<Self>, total: u64) -> BarOptions {
        BarOptions {
            description: self.label.clone(),
            total,
            builder: Arc::clone(self) as Arc<dyn FrameBuilder>,
        }
    }
}

impl FrameBuilder for Recorder {
    fn build(&self, out: &mut String, frame: Frame, snapshot: &tickbar::frame::Snapshot<'_>) -> tickbar::Result<()> {
        let build = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at != 0 && (build == self.fail_at || (self.keep_failing && build > self.fail_at)) {
            return Err(Error::frame("broken"));
        }
        self.frames.lock().push(frame);
        write!(out, "{}:{:?}:{}/{}", self.label, frame, snapshot.current, snapshot.total)?;
        Ok(())
    }
}

/// Assert that `frames` are one start frame, any amount of refresh frames and one end frame, in that order.
pub fn assert_one_run(frames: &[Frame]) {
    assert!(frames.len() >= 2, "{:?}", frames);
    assert_eq!(frames.first(), Some(&Frame::Start), "{:?}", frames);
    assert_eq!(frames.last(), Some(&Frame::End), "{:?}", frames);
    assert!(
        frames[1..frames.len() - 1].iter().all(|f| *f == Frame::Refresh),
        "{:?}",
        frames
    );
}

/// Count calls of a finish hook.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hook(&self) -> impl FnMut() + Send + 'static {
        let calls = Arc::clone(&self.0);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

const CHILD_TEST: &str = "TICKBAR_CHILD_TEST";

/// Run `scenario` in a new process of this test binary which runs nothing but the test named `test`.
///
/// Within that process, `scenario` runs right away and `None` is returned. Otherwise the output of the
/// finished process is returned.
pub fn in_child_process(test: &str, scenario: impl FnOnce()) -> Option<process::Output> {
    if std::env::var_os(CHILD_TEST).map_or(false, |name| name == test) {
        scenario();
        return None;
    }
    let output = process::Command::new(std::env::current_exe().expect("path to the test binary"))
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_TEST, test)
        .output()
        .expect("the test binary can be run again");
    Some(output)
}
