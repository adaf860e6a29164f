use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An element with its priority, as returned by [`MinHeap::pop`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeapEntry<T> {
    pub element: T,
    pub priority: f64,
}

/// Internal slot; `seq` breaks priority ties first-in first-out.
struct Slot<T> {
    entry: HeapEntry<T>,
    seq: u64,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (max-heap) pops the lowest priority first.
        other
            .entry
            .priority
            .total_cmp(&self.entry.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Binary min-heap keyed by `f64` priority. There is no decrease-key: callers
/// push the same element again with a better priority and discard stale
/// entries when they pop.
pub struct MinHeap<T> {
    heap: BinaryHeap<Slot<T>>,
    next_seq: u64,
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MinHeap<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, element: T, priority: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Slot {
            entry: HeapEntry { element, priority },
            seq,
        });
    }

    /// Lowest-priority entry, or `None` once drained.
    pub fn pop(&mut self) -> Option<HeapEntry<T>> {
        self.heap.pop().map(|slot| slot.entry)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Remove every entry, in no particular order.
    pub fn drain(&mut self) -> impl Iterator<Item = HeapEntry<T>> + '_ {
        self.heap.drain().map(|slot| slot.entry)
    }
}
