//! The render thread of a channel, and the two policies deciding when it repaints.
//!
//! Every channel owns exactly one [`ThreadExecutor`], which in turn owns exactly one background thread.
//! [`Periodic`] and [`OnDemand`] sit on top of it and differ only in who decides when a paint happens: a timer,
//! or the caller. Both hand the actual paint to the background thread, so concurrent bars on one channel never
//! write to the terminal at the same time, and so failures always travel the same way back to the caller.
use crate::{error::Result, exception::ExceptionBox};
use std::sync::Arc;

mod executor;
pub use executor::ThreadExecutor;

mod periodic;
pub use periodic::Periodic;

mod on_demand;
pub use on_demand::OnDemand;


/// A unit of work run on the render thread, typically painting one frame.
pub type Task = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// How the repaint cadence is driven.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Policy {
    /// Repaint on a fixed interval, independently of progress updates.
    Periodic,
    /// Repaint whenever progress is made, and only then.
    OnDemand,
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Periodic
    }
}

/// The contract bars and multi-bars use to drive the render thread of their channel.
///
/// Only one paint task can be installed at a time, which is what keeps two unrelated bars from owning the same
/// channel at once.
pub trait Scheduler: Send + Sync {
    /// The policy implemented by this scheduler.
    fn policy(&self) -> Policy;

    /// Install `task` as the paint task if there is none yet, and return true, or return false otherwise.
    fn try_appoint(&self, task: Task) -> bool;

    /// Start repainting with the installed task, and return once the first frame was painted.
    ///
    /// Any failure captured by the render thread since it last ran is returned here.
    fn activate(&self) -> Result<()>;

    /// Force one paint to happen on the render thread and wait for it, returning its failure if there was one.
    ///
    /// It's a no-op if no task is installed or the scheduler isn't running.
    fn attempt(&self) -> Result<()>;

    /// Let the scheduler know that progress was made.
    ///
    /// The periodic policy coalesces these into its timer and returns immediately, whereas the on-demand
    /// policy paints right away and waits for it.
    fn execute(&self) -> Result<()>;

    /// Stop repainting and remove the installed task, waiting for an in-flight paint to finish.
    fn dismiss(&self);

    /// Like [`dismiss()`](Scheduler::dismiss()), but run `cleanup` while still holding the installation lock,
    /// right after the last paint has definitely stopped.
    fn dismiss_then(&self, cleanup: &mut dyn FnMut());

    /// Return true if no task is installed.
    fn empty(&self) -> bool;

    /// Return true if the scheduler is currently repainting.
    fn online(&self) -> bool;
}

/// Run `task`, turning panics into errors.
pub(crate) fn run_guarded(task: &(dyn Fn() -> Result<()> + Send + Sync)) -> Result<()> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(task))
        .unwrap_or_else(|payload| Err(crate::Error::from_panic(payload)))
}

/// Put a failed `outcome` into `exceptions`, and hand it back only if a failure was already pending there.
pub(crate) fn capture(exceptions: &ExceptionBox, outcome: Result<()>) -> Result<()> {
    match outcome {
        Err(err) if !exceptions.try_store(err.clone()) => Err(err),
        _ => Ok(()),
    }
}
