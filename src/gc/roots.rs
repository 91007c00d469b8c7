//! Root stack
//!
//! The root stack is the set of entry points for the mark phase. It is
//! a LIFO stack rather than a set: entering a scope pushes the handles
//! it keeps live, leaving it pops them, and pushing the same handle
//! twice is legal and must be popped twice. Order among roots carries
//! no meaning for reachability.

use super::GcError;
use crate::object::Handle;

/// LIFO stack of externally reachable handles.
///
/// Grows on demand unless a capacity ceiling was configured, in which
/// case pushing past the ceiling fails with [`GcError::RootOverflow`].
pub struct RootStack {
    handles: Vec<Handle>,
    capacity: Option<usize>,
}

impl RootStack {
    /// Create a root stack, optionally bounded by a fixed capacity.
    pub fn new(capacity: Option<usize>) -> Self {
        RootStack {
            handles: Vec::new(),
            capacity,
        }
    }

    /// Push a handle onto the stack.
    pub fn push(&mut self, handle: Handle) -> Result<(), GcError> {
        if let Some(capacity) = self.capacity {
            if self.handles.len() >= capacity {
                return Err(GcError::RootOverflow);
            }
        }
        self.handles.push(handle);
        Ok(())
    }

    /// Pop the most recently pushed handle.
    pub fn pop(&mut self) -> Result<Handle, GcError> {
        self.handles.pop().ok_or(GcError::RootUnderflow)
    }

    /// Number of roots currently on the stack.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if the stack is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Iterate over all roots, bottom to top.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.handles.iter().copied()
    }
}
