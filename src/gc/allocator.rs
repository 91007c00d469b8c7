//! Arena allocator for the object heap
//!
//! Storage layout:
//! ```text
//! slots:  [ Used | Used | Free -> 5 | Used | Used | Free -> None ]
//! marks:  [  f   |  f   |  f        |  f   |  f   |  f           ]
//!                          |                        ^
//!                          +------- free list ------+
//! ```
//!
//! Objects occupy slots in a growable arena and are named by their
//! index ([`Handle`]). Reclaimed slots are threaded into a free list
//! running through the arena itself, so storage is reused rather than
//! returned to the system allocator. The mark flags live in a parallel
//! array indexed identically to the slots.
//!
//! The arena only grows up to the configured `max_objects` ceiling;
//! past it, allocation reports [`GcError::OutOfMemory`] after a final
//! rescue collection. All errors here are typed and recoverable.

use super::GcError;
use super::collector::{self, GcStats};
use super::roots::RootStack;
use crate::object::{Handle, Object, ObjectKind};

/// Default ceiling on the number of arena slots.
const DEFAULT_MAX_OBJECTS: usize = 1 << 20;

/// Initial (and minimum) collection threshold.
const THRESHOLD_FLOOR: usize = 8;

/// Heap construction parameters.
#[derive(Debug, Clone)]
pub struct HeapConfig {
    /// Hard ceiling on arena slots; allocation past it is `OutOfMemory`.
    pub max_objects: usize,
    /// Optional fixed ceiling for the root stack (`None` = growable).
    pub root_capacity: Option<usize>,
    /// Starting collection threshold, also the floor the threshold
    /// never adapts below.
    pub initial_threshold: usize,
    /// Run a collection from the allocation path when the live count
    /// exceeds the threshold. Disable to collect only on explicit
    /// [`Heap::collect`] calls.
    pub auto_collect: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            max_objects: DEFAULT_MAX_OBJECTS,
            root_capacity: None,
            initial_threshold: THRESHOLD_FLOOR,
            auto_collect: true,
        }
    }
}

/// One arena cell: a live object, or a link in the free list.
#[derive(Debug, Clone, Copy)]
pub(super) enum Slot {
    Free(Option<u32>),
    Used(Object),
}

/// The object heap.
///
/// Owns every object, the mark flags, the root stack and the trigger
/// state. All mutation goes through `&mut self`; the heap is strictly
/// single-threaded and a multi-threaded embedding must serialize all
/// access behind its own lock.
pub struct Heap {
    pub(super) slots: Vec<Slot>,
    pub(super) marks: Vec<bool>,
    pub(super) free_head: Option<u32>,
    pub(super) live: usize,
    pub(super) threshold: usize,
    pub(super) roots: RootStack,
    /// Handles kept alive across an allocation-triggered collection
    /// while the object referencing them is still being built.
    pub(super) pending: Vec<Handle>,
    pub(super) last_gc: GcStats,
    pub(super) config: HeapConfig,
}

impl Heap {
    /// Create a heap with the default configuration.
    pub fn new() -> Self {
        Heap::with_config(HeapConfig::default())
    }

    /// Create a heap with the given configuration.
    ///
    /// # Panics
    /// Panics if `max_objects` is zero.
    pub fn with_config(config: HeapConfig) -> Self {
        assert!(config.max_objects > 0, "heap ceiling must be nonzero");

        Heap {
            slots: Vec::new(),
            marks: Vec::new(),
            free_head: None,
            live: 0,
            threshold: config.initial_threshold,
            roots: RootStack::new(config.root_capacity),
            pending: Vec::new(),
            last_gc: GcStats::default(),
            config,
        }
    }

    /// Allocate an integer object.
    ///
    /// May trigger a collection first (see [`HeapConfig::auto_collect`]);
    /// any unrooted handle the caller still holds can be invalidated by
    /// that collection.
    pub fn alloc_int(&mut self, value: i64) -> Result<Handle, GcError> {
        self.alloc_object(Object::Int(value))
    }

    /// Allocate a pair object.
    ///
    /// `a` and `b` are not validated; passing a dangling handle is a
    /// contract violation. Both children are treated as roots for the
    /// duration of this call, so an allocation-triggered collection
    /// cannot reclaim them before the pair exists.
    pub fn alloc_pair(
        &mut self,
        a: Option<Handle>,
        b: Option<Handle>,
    ) -> Result<Handle, GcError> {
        if let Some(h) = a {
            self.pending.push(h);
        }
        if let Some(h) = b {
            self.pending.push(h);
        }
        let result = self.alloc_object(Object::Pair(a, b));
        self.pending.clear();
        result
    }

    /// Replace the children of a pair.
    ///
    /// This is the only payload mutation the heap supports; it is what
    /// lets reference graphs form cycles. Returns `None` if `handle`
    /// does not name a live pair.
    pub fn set_pair(
        &mut self,
        handle: Handle,
        a: Option<Handle>,
        b: Option<Handle>,
    ) -> Option<()> {
        match self.slots.get_mut(handle.index()) {
            Some(Slot::Used(object @ Object::Pair(..))) => {
                *object = Object::Pair(a, b);
                Some(())
            }
            _ => None,
        }
    }

    fn alloc_object(&mut self, object: Object) -> Result<Handle, GcError> {
        #[cfg(feature = "stress-gc")]
        collector::collect(self);

        #[cfg(not(feature = "stress-gc"))]
        if self.config.auto_collect && self.live > self.threshold {
            collector::collect(self);
        }

        // At the ceiling with no free slot: one rescue collection, then
        // give up.
        if self.free_head.is_none() && self.slots.len() >= self.config.max_objects {
            if self.config.auto_collect {
                collector::collect(self);
            }
            if self.free_head.is_none() {
                return Err(GcError::OutOfMemory);
            }
        }

        let handle = match self.free_head {
            Some(index) => {
                let index = index as usize;
                let Slot::Free(next) = self.slots[index] else {
                    unreachable!("free list entry names a live slot");
                };
                self.free_head = next;
                self.slots[index] = Slot::Used(object);
                self.marks[index] = false;
                Handle::from_raw(index as u32)
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot::Used(object));
                self.marks.push(false);
                Handle::from_raw(index as u32)
            }
        };
        self.live += 1;
        Ok(handle)
    }

    /// Push a root onto the root stack.
    pub fn push_root(&mut self, handle: Handle) -> Result<(), GcError> {
        self.roots.push(handle)
    }

    /// Pop the most recently pushed root.
    pub fn pop_root(&mut self) -> Result<Handle, GcError> {
        self.roots.pop()
    }

    /// Look up a live object.
    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&Object> {
        match self.slots.get(handle.index()) {
            Some(Slot::Used(object)) => Some(object),
            _ => None,
        }
    }

    /// The kind tag of a live object.
    #[inline]
    pub fn kind(&self, handle: Handle) -> Option<ObjectKind> {
        self.get(handle).map(Object::kind)
    }

    /// Number of live objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if the heap holds no live objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The current collection trigger threshold.
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of roots currently pushed.
    #[inline]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Counters from the most recent collection.
    #[inline]
    pub fn last_gc(&self) -> GcStats {
        self.last_gc
    }

    /// Human-readable listing of every live object plus the summary
    /// counters.
    ///
    /// Diagnostic output only: the format is loose and not stable
    /// across versions. Consumers should look for counts and entry
    /// presence, not exact layout.
    pub fn dump_state(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "heap: live={} threshold={} roots={}",
            self.live,
            self.threshold,
            self.roots.len()
        );
        for (index, slot) in self.slots.iter().enumerate() {
            let Slot::Used(object) = slot else { continue };
            let handle = Handle::from_raw(index as u32);
            let marked = self.marks[index];
            match object {
                Object::Int(value) => {
                    let _ = writeln!(out, " {handle} int marked={marked} value={value}");
                }
                Object::Pair(a, b) => {
                    let _ = writeln!(
                        out,
                        " {handle} pair marked={marked} a={} b={}",
                        child(*a),
                        child(*b)
                    );
                }
            }
        }
        out
    }
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new()
    }
}

fn child(handle: Option<Handle>) -> String {
    match handle {
        Some(h) => h.to_string(),
        None => "nil".to_string(),
    }
}
