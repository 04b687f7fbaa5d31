use crate::error::{Error, Result};
use parking_lot::RwLock;

/// A one-shot slot through which a render thread hands a captured failure to the next caller.
///
/// At most one failure is held at a time. A second [`try_store()`](ExceptionBox::try_store()) does not
/// overwrite the pending one, which lets the owner detect that it ran into a failure while still carrying
/// another one.
#[derive(Debug, Default)]
pub struct ExceptionBox {
    slot: RwLock<Option<Error>>,
}

impl ExceptionBox {
    /// Create an empty box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `err` if the box is empty and return true, or return false and drop `err` otherwise.
    pub fn try_store(&self, err: Error) -> bool {
        let mut slot = self.slot.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    /// Return a copy of the pending failure without clearing it.
    pub fn load(&self) -> Option<Error> {
        self.slot.read().clone()
    }

    /// Return true if a failure is pending.
    pub fn is_empty(&self) -> bool {
        self.slot.read().is_none()
    }

    /// Take the pending failure out of the box and return it as `Err`, or return `Ok(())` if there was none.
    pub fn rethrow(&self) -> Result<()> {
        match self.slot.write().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drop the pending failure, if any, and return it.
    pub fn clear(&self) -> Option<Error> {
        self.slot.write().take()
    }
}
