//! Turning the progress of a bar into the text of one frame.
//!
//! The render engine doesn't care what a frame looks like, it only asks a [`FrameBuilder`] to append one to a buffer
//! whenever it paints. [`Line`] is the builder used unless another one is configured.
use crate::Result;
use crosstermion::color::{Brush, Colour, Style};
use std::{fmt::Write, time::Duration};

/// Which part of a run a frame belongs to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Frame {
    /// The first frame of a run, painted exactly once.
    Start,
    /// Any frame in between, possibly none at all.
    Refresh,
    /// The final frame of a run, painted exactly once.
    End,
}

/// The state of a bar at the time a frame is built.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub description: &'a str,
    /// Ticks made in this run.
    pub current: u64,
    /// Ticks making up this run, or 0 if the run only shows activity.
    pub total: u64,
    /// Time since the run started.
    pub elapsed: Duration,
    /// The amount of frames painted before this one, in this run. Useful to drive animations.
    pub frame: u64,
    /// If true, the frame may contain color.
    pub colored: bool,
    /// The amount of columns available.
    pub width: u16,
}

impl Snapshot<'_> {
    /// Return true if the run counts towards a known total.
    pub fn bounded(&self) -> bool {
        self.total > 0
    }

    /// The completed share of the run in `0.0..=1.0`, if it's bounded.
    pub fn fraction(&self) -> Option<f64> {
        self.bounded()
            .then(|| self.current.min(self.total) as f64 / self.total as f64)
    }
}

/// Build the text of frames, which must not contain line breaks.
///
/// It's called on the render thread, once per paint and bar.
pub trait FrameBuilder: Send + Sync {
    fn build(&self, out: &mut String, frame: Frame, snapshot: &Snapshot<'_>) -> Result<()>;
}

impl<F> FrameBuilder for F
where
    F: Fn(&mut String, Frame, &Snapshot<'_>) -> Result<()> + Send + Sync,
{
    fn build(&self, out: &mut String, frame: Frame, snapshot: &Snapshot<'_>) -> Result<()> {
        self(out, frame, snapshot)
    }
}

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// A single line with description, bar, counter, percentage and elapsed time.
///
/// Runs without a total show a spinner and the counter instead.
#[derive(Debug, Clone)]
pub struct Line {
    /// The amount of cells used for the bar itself, _(default: 30)_. It shrinks to a third of the available width.
    pub bar_width: u16,
}

impl Default for Line {
    fn default() -> Self {
        Line { bar_width: 30 }
    }
}

impl FrameBuilder for Line {
    fn build(&self, out: &mut String, frame: Frame, snapshot: &Snapshot<'_>) -> Result<()> {
        let brush = Brush::new(snapshot.colored);
        if !snapshot.description.is_empty() {
            brush
                .style(Style::new().bold())
                .paint_into(out, snapshot.description)?;
            out.push(' ');
        }

        let accent = match frame {
            Frame::End => Colour::Green,
            Frame::Start | Frame::Refresh => Colour::Cyan,
        };
        match snapshot.fraction() {
            Some(fraction) => {
                let width = usize::from(self.bar_width.min(snapshot.width / 3).max(1));
                let filled = (fraction * width as f64) as usize;
                let mut bar = String::with_capacity(width);
                bar.extend(std::iter::repeat('=').take(filled));
                if filled < width {
                    bar.push('>');
                    bar.extend(std::iter::repeat(' ').take(width - filled - 1));
                }
                out.push('[');
                brush.style(accent.normal()).paint_into(out, &bar)?;
                write!(
                    out,
                    "] {}/{} {:>3}%",
                    snapshot.current,
                    snapshot.total,
                    (fraction * 100.0) as u8
                )?;
            }
            None => {
                let glyph = match frame {
                    Frame::End => '✔',
                    Frame::Start | Frame::Refresh => SPINNER[(snapshot.frame % SPINNER.len() as u64) as usize],
                };
                let mut buf = [0; 4];
                brush
                    .style(accent.normal())
                    .paint_into(out, glyph.encode_utf8(&mut buf))?;
                write!(out, " {}", snapshot.current)?;
            }
        }
        write!(
            out,
            " {}",
            humantime::format_duration(Duration::from_secs(snapshot.elapsed.as_secs()))
        )?;
        Ok(())
    }
}
