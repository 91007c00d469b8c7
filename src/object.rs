//! Heap object model
//!
//! Objects live in the heap arena and are referred to by [`Handle`]s,
//! plain indices into the arena. Handles are `Copy` and never own the
//! object they name: the heap is the sole owner of all objects, and a
//! handle whose target has been swept is dangling. The collector
//! guarantees that never happens for handles that were reachable from
//! the root stack at mark time; everything else is a caller contract.

use std::fmt;

/// A non-owning reference to a heap object.
///
/// Internally an arena index. Handles survive collections as long as
/// their target does; using a handle whose target was swept is a
/// contract violation (caught by debug assertions, not checked in
/// release builds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Reconstruct a handle from its raw index.
    ///
    /// Intended for embedders and diagnostic tooling that round-trip
    /// handles through text (the index is what [`Handle`]'s `Display`
    /// impl and `Heap::dump_state` print). The index is not validated.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Handle(index)
    }

    /// The raw arena index.
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Object kind tag, immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Int,
    Pair,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Int => write!(f, "int"),
            ObjectKind::Pair => write!(f, "pair"),
        }
    }
}

/// A heap object: either a boxed integer or a pair of optional
/// references to other objects.
///
/// Pair children are non-owning and unvalidated; they may form
/// arbitrary graphs, including cycles. `None` is the absence of a
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    Int(i64),
    Pair(Option<Handle>, Option<Handle>),
}

impl Object {
    /// The kind tag of this object.
    #[inline]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Int(_) => ObjectKind::Int,
            Object::Pair(..) => ObjectKind::Pair,
        }
    }

    /// The integer payload, if this is an `Int`.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Object::Int(value) => Some(*value),
            Object::Pair(..) => None,
        }
    }

    /// The two children, if this is a `Pair`.
    #[inline]
    pub fn as_pair(&self) -> Option<(Option<Handle>, Option<Handle>)> {
        match self {
            Object::Pair(a, b) => Some((*a, *b)),
            Object::Int(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_raw_round_trip() {
        let h = Handle::from_raw(42);
        assert_eq!(h.to_raw(), 42);
        assert_eq!(h.index(), 42);
        assert_eq!(h.to_string(), "$42");
    }

    #[test]
    fn test_object_kind() {
        let i = Object::Int(-7);
        let p = Object::Pair(Some(Handle::from_raw(0)), None);

        assert_eq!(i.kind(), ObjectKind::Int);
        assert_eq!(p.kind(), ObjectKind::Pair);
        assert_eq!(i.kind().to_string(), "int");
        assert_eq!(p.kind().to_string(), "pair");
    }

    #[test]
    fn test_object_accessors() {
        let i = Object::Int(99);
        assert_eq!(i.as_int(), Some(99));
        assert_eq!(i.as_pair(), None);

        let a = Handle::from_raw(1);
        let p = Object::Pair(Some(a), None);
        assert_eq!(p.as_int(), None);
        assert_eq!(p.as_pair(), Some((Some(a), None)));
    }
}
