//! marksweep - a small tracing garbage collector
//!
//! A mark-and-sweep collector over a heap of variant-typed objects
//! (integers and pairs). Objects live in an index-addressed arena and
//! are named by copyable [`Handle`]s; liveness starts from an explicit
//! LIFO root stack the caller manages.
//!
//! # Features
//! - Non-moving mark-and-sweep with cycle-safe, work-list-driven marking
//! - Arena storage with slot reuse through a free list
//! - Adaptive trigger: collect when live objects exceed a threshold
//!   that doubles with the survivor count (floor 8)
//! - Typed, recoverable errors for memory exhaustion and root misuse
//! - Single-threaded by construction; no locks, no interior mutability
//!
//! # Example
//! ```
//! use marksweep::Heap;
//!
//! let mut heap = Heap::new();
//! let a = heap.alloc_int(1)?;
//! let b = heap.alloc_int(2)?;
//! let p = heap.alloc_pair(Some(a), Some(b))?;
//!
//! heap.push_root(p)?;
//! heap.collect();
//! assert_eq!(heap.len(), 3); // p keeps a and b alive
//!
//! heap.pop_root()?;
//! heap.collect();
//! assert!(heap.is_empty());
//! # Ok::<(), marksweep::GcError>(())
//! ```

// Object model
pub mod object;

// Garbage collector
pub mod gc;

// Re-export main types
pub use gc::{GcError, GcStats, Heap, HeapConfig};
pub use object::{Handle, Object, ObjectKind};
