//! Garbage collector module
//!
//! A non-moving mark-and-sweep collector over an arena of tagged
//! objects. Reachability starts from an explicit root stack, the mark
//! flag doubles as the traversal's visited set (so cycles terminate),
//! and the sweep recycles slots through a free list. Collections are
//! triggered from the allocation path once the live count passes an
//! adaptive threshold that doubles with the survivor count.

mod allocator;
mod collector;
mod roots;

pub use allocator::{Heap, HeapConfig};
pub use collector::GcStats;

use std::fmt;

/// Errors surfaced by the heap and root stack.
///
/// All of these are recoverable, typed results rather than process
/// aborts: the caller decides whether memory exhaustion or root-stack
/// misuse is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcError {
    /// The arena hit its configured object ceiling and a collection
    /// freed nothing.
    OutOfMemory,
    /// A root push exceeded the configured root-stack capacity.
    RootOverflow,
    /// A root pop on an empty root stack.
    RootUnderflow,
}

impl fmt::Display for GcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcError::OutOfMemory => write!(f, "out of memory"),
            GcError::RootOverflow => write!(f, "root stack overflow"),
            GcError::RootUnderflow => write!(f, "root stack underflow"),
        }
    }
}

impl std::error::Error for GcError {}

impl Heap {
    /// Run one full mark-and-sweep cycle.
    ///
    /// Invalidates every handle that was not reachable from the root
    /// stack when the cycle started, then recomputes the trigger
    /// threshold.
    pub fn collect(&mut self) {
        collector::collect(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(GcError::OutOfMemory.to_string(), "out of memory");
        assert_eq!(GcError::RootOverflow.to_string(), "root stack overflow");
        assert_eq!(GcError::RootUnderflow.to_string(), "root stack underflow");
    }

    #[test]
    fn test_auto_collect_bounds_garbage() {
        let mut heap = Heap::new();

        let keep = heap.alloc_int(0).unwrap();
        heap.push_root(keep).unwrap();

        // Pure garbage churn: the allocation path keeps collecting, so
        // the live count never runs away past 2x the threshold band.
        for i in 0..1000 {
            heap.alloc_int(i).unwrap();
        }
        assert!(heap.len() <= 2 * heap.threshold() + 1);
        assert!(heap.last_gc().freed > 0);
        assert!(heap.get(keep).is_some());
    }
}
