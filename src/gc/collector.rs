//! Mark-and-sweep collector
//!
//! A collection runs in two phases:
//! 1. Mark: flood-fill the mark flags from the root stack, driven by an
//!    explicit work-list so graph depth never translates into call
//!    stack depth.
//! 2. Sweep: one pass over the arena; unmarked slots join the free
//!    list, survivors get their flag cleared for the next cycle.
//!
//! Afterwards the trigger threshold is recomputed as twice the survivor
//! count, floored at the configured initial threshold. Collection never
//! allocates and cannot fail once started; it is not re-entrant.

use super::allocator::{Heap, Slot};
use crate::object::{Handle, Object};

/// Counters from one collection cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct GcStats {
    /// Live objects when the cycle started.
    pub live_before: usize,
    /// Live objects after sweeping.
    pub live_after: usize,
    /// Objects reclaimed by the sweep.
    pub freed: usize,
}

/// Run one full mark-and-sweep cycle on the heap.
///
/// Everything reachable from the root stack (plus any in-flight
/// allocation operands) survives; everything else is reclaimed and its
/// slot recycled.
pub fn collect(heap: &mut Heap) {
    let live_before = heap.len();

    mark(heap);
    let freed = sweep(heap);

    heap.threshold = (2 * heap.live).max(heap.config.initial_threshold);
    heap.last_gc = GcStats {
        live_before,
        live_after: heap.live,
        freed,
    };

    #[cfg(feature = "dump")]
    eprintln!(
        "[gc] freed {} of {}, {} live, next threshold {}",
        freed, live_before, heap.live, heap.threshold
    );
}

/// Mark every object reachable from the roots.
///
/// The mark flag doubles as the visited set, so each object is pushed
/// through the work-list at most once and cyclic graphs terminate.
/// Traversal order is unspecified.
fn mark(heap: &mut Heap) {
    if heap.roots.is_empty() && heap.pending.is_empty() {
        return;
    }

    let mut work: Vec<Handle> = Vec::with_capacity(heap.roots.len() + heap.pending.len());
    work.extend(heap.roots.iter());
    work.extend(heap.pending.iter().copied());

    while let Some(handle) = work.pop() {
        let index = handle.index();
        let Some(slot) = heap.slots.get(index) else {
            debug_assert!(false, "dangling handle {handle} reached the mark phase");
            continue;
        };
        let Slot::Used(object) = *slot else {
            debug_assert!(false, "dangling handle {handle} reached the mark phase");
            continue;
        };
        if heap.marks[index] {
            continue;
        }
        heap.marks[index] = true;

        if let Object::Pair(a, b) = object {
            if let Some(a) = a {
                work.push(a);
            }
            if let Some(b) = b {
                work.push(b);
            }
        }
    }
}

/// Reclaim every unmarked object and clear the survivors' flags.
///
/// Single pass over the arena: unmarked used slots become free-list
/// heads, marked slots are demoted back to unmarked. Returns the number
/// of objects freed.
fn sweep(heap: &mut Heap) -> usize {
    let mut freed = 0;
    for index in 0..heap.slots.len() {
        if heap.marks[index] {
            heap.marks[index] = false;
            continue;
        }
        if matches!(heap.slots[index], Slot::Used(_)) {
            heap.slots[index] = Slot::Free(heap.free_head);
            heap.free_head = Some(index as u32);
            heap.live -= 1;
            freed += 1;
        }
    }
    freed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::allocator::HeapConfig;

    fn manual_heap() -> Heap {
        Heap::with_config(HeapConfig {
            auto_collect: false,
            ..HeapConfig::default()
        })
    }

    #[test]
    fn test_collect_empty_heap() {
        let mut heap = manual_heap();
        heap.collect();
        assert_eq!(heap.len(), 0);
        assert_eq!(heap.threshold(), 8);
    }

    #[test]
    fn test_reachability_soundness() {
        let mut heap = manual_heap();

        let kept = heap.alloc_int(1).unwrap();
        let child = heap.alloc_int(2).unwrap();
        let pair = heap.alloc_pair(Some(child), None).unwrap();
        let dropped = heap.alloc_int(3).unwrap();

        heap.push_root(kept).unwrap();
        heap.push_root(pair).unwrap();
        heap.collect();

        // Rooted objects and everything they reach survive.
        assert!(heap.get(kept).is_some());
        assert!(heap.get(pair).is_some());
        assert!(heap.get(child).is_some());
        // The unreachable int is gone.
        assert!(heap.get(dropped).is_none());
        assert_eq!(heap.len(), 3);
    }

    #[test]
    fn test_no_dangling_survivors() {
        let mut heap = manual_heap();

        let leaf = heap.alloc_int(0).unwrap();
        let inner = heap.alloc_pair(Some(leaf), None).unwrap();
        let outer = heap.alloc_pair(Some(inner), Some(leaf)).unwrap();
        heap.alloc_pair(Some(leaf), None).unwrap(); // garbage pair

        heap.push_root(outer).unwrap();
        heap.collect();

        // Referential closure: every surviving pair's children are
        // themselves survivors.
        for raw in 0..heap.slots.len() as u32 {
            let handle = Handle::from_raw(raw);
            if let Some(Object::Pair(a, b)) = heap.get(handle).copied() {
                for c in [a, b].into_iter().flatten() {
                    assert!(heap.get(c).is_some(), "survivor {handle} references freed {c}");
                }
            }
        }
        assert_eq!(heap.len(), 3);
    }

    #[test]
    fn test_mark_flags_reset() {
        let mut heap = manual_heap();

        let a = heap.alloc_int(1).unwrap();
        let p = heap.alloc_pair(Some(a), Some(a)).unwrap();
        heap.push_root(p).unwrap();
        heap.collect();

        assert!(heap.marks.iter().all(|&m| !m));
    }

    #[test]
    fn test_back_to_back_collect_idempotent() {
        let mut heap = manual_heap();

        let a = heap.alloc_int(1).unwrap();
        let p = heap.alloc_pair(Some(a), None).unwrap();
        heap.push_root(p).unwrap();
        heap.alloc_int(2).unwrap(); // garbage

        heap.collect();
        let first_live = heap.len();
        let first_dump = heap.dump_state();

        heap.collect();
        assert_eq!(heap.len(), first_live);
        assert_eq!(heap.dump_state(), first_dump);
    }

    #[test]
    fn test_self_cycle_terminates() {
        let mut heap = manual_heap();

        let p = heap.alloc_pair(None, None).unwrap();
        heap.set_pair(p, Some(p), Some(p)).unwrap();

        heap.push_root(p).unwrap();
        heap.collect();
        assert_eq!(heap.len(), 1);
        assert!(heap.get(p).is_some());

        heap.pop_root().unwrap();
        heap.collect();
        assert_eq!(heap.len(), 0);
        assert!(heap.get(p).is_none());
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let mut heap = manual_heap();

        let p = heap.alloc_pair(None, None).unwrap();
        let q = heap.alloc_pair(Some(p), None).unwrap();
        heap.set_pair(p, Some(q), Some(q)).unwrap();

        heap.push_root(p).unwrap();
        heap.collect();
        assert_eq!(heap.len(), 2);

        heap.pop_root().unwrap();
        heap.collect();
        assert_eq!(heap.len(), 0);
    }

    #[test]
    fn test_threshold_growth() {
        let mut heap = manual_heap();
        assert_eq!(heap.threshold(), 8);

        // 5 survivors: threshold becomes max(10, 8) = 10.
        for i in 0..5 {
            let h = heap.alloc_int(i).unwrap();
            heap.push_root(h).unwrap();
        }
        heap.alloc_int(99).unwrap(); // garbage
        heap.collect();
        assert_eq!(heap.len(), 5);
        assert_eq!(heap.threshold(), 10);

        // 2 survivors: threshold falls back to the floor.
        heap.pop_root().unwrap();
        heap.pop_root().unwrap();
        heap.pop_root().unwrap();
        heap.collect();
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.threshold(), 8);
    }

    #[test]
    fn test_gc_stats() {
        let mut heap = manual_heap();

        let a = heap.alloc_int(1).unwrap();
        heap.push_root(a).unwrap();
        heap.alloc_int(2).unwrap();
        heap.alloc_int(3).unwrap();

        heap.collect();
        let stats = heap.last_gc();
        assert_eq!(stats.live_before, 3);
        assert_eq!(stats.live_after, 1);
        assert_eq!(stats.freed, 2);
    }

    // The two-root scenario from the original demo: a rooted pair and
    // its rooted children all survive, then popping the pair and one
    // int leaves a single survivor.
    #[test]
    fn test_scenario_roots_and_pair() {
        let mut heap = manual_heap();

        let a = heap.alloc_int(1).unwrap();
        heap.push_root(a).unwrap();
        let b = heap.alloc_int(2).unwrap();
        heap.push_root(b).unwrap();
        let p = heap.alloc_pair(Some(a), Some(b)).unwrap();
        heap.push_root(p).unwrap();

        heap.collect();
        assert_eq!(heap.len(), 3);

        heap.pop_root().unwrap(); // p
        heap.pop_root().unwrap(); // b
        heap.collect();

        assert_eq!(heap.len(), 1);
        assert_eq!(heap.get(a).unwrap().as_int(), Some(1));
        assert!(heap.get(b).is_none());
        assert!(heap.get(p).is_none());
    }

    // The churn scenario: 20 unrooted pairs (each carrying an int) are
    // all garbage; one rooted int survives.
    #[test]
    fn test_scenario_unrooted_churn() {
        let mut heap = manual_heap();

        let a = heap.alloc_int(1).unwrap();
        heap.push_root(a).unwrap();

        for i in 0..20 {
            let n = heap.alloc_int(i).unwrap();
            heap.alloc_pair(Some(n), None).unwrap();
        }
        assert!(heap.len() >= 21);

        heap.collect();
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.get(a).unwrap().as_int(), Some(1));
    }

    #[test]
    fn test_drain_heap_via_roots() {
        let mut heap = manual_heap();

        let a = heap.alloc_int(1).unwrap();
        heap.push_root(a).unwrap();
        heap.collect();
        assert_eq!(heap.len(), 1);

        heap.pop_root().unwrap();
        heap.collect();
        assert!(heap.is_empty());
        assert_eq!(heap.threshold(), 8);
    }
}
