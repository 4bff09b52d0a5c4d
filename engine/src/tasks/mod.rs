//! Time-ordered work queues.
//!
//! Both queue flavours share one ordering rule: the entry with the earliest
//! scheduled time runs first, and entries scheduled for the same instant run
//! in insertion order. They differ only in who consumes them:
//!
//! - [`ActiveTaskQueue`] owns a dedicated consumer thread that sleeps on a
//!   condition variable until the earliest entry is due.
//! - [`PassiveTaskQueue`] runs entries only when the host calls
//!   [`PassiveTaskQueue::process`], one ready entry per call.

use std::cmp::Ordering;
use std::time::Instant;

mod active;
mod passive;

pub use active::ActiveTaskQueue;
pub use passive::PassiveTaskQueue;

/// A queued unit of work.
struct Entry {
    order: u64,
    scheduled_time: Instant,
    id: Option<u64>,
    run: Box<dyn FnOnce() + Send>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.scheduled_time == other.scheduled_time && self.order == other.order
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Inverted so that `BinaryHeap`, a max-heap, pops the earliest
    // (scheduled_time, order) pair first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .scheduled_time
            .cmp(&self.scheduled_time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;
    use std::time::Duration;

    fn entry(order: u64, at: Instant) -> Entry {
        Entry {
            order,
            scheduled_time: at,
            id: None,
            run: Box::new(|| {}),
        }
    }

    #[test]
    fn heap_pops_earliest_deadline_first() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(entry(0, now + Duration::from_millis(50)));
        heap.push(entry(1, now));
        heap.push(entry(2, now + Duration::from_millis(10)));

        assert_eq!(heap.pop().unwrap().order, 1);
        assert_eq!(heap.pop().unwrap().order, 2);
        assert_eq!(heap.pop().unwrap().order, 0);
    }

    #[test]
    fn heap_breaks_ties_by_insertion_order() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        for order in [3u64, 1, 2, 0] {
            heap.push(entry(order, now));
        }
        for expected in 0u64..4 {
            assert_eq!(heap.pop().unwrap().order, expected);
        }
    }
}
