//! Host-driven variant of the task queue.

use std::collections::BinaryHeap;
use std::time::Instant;

use parking_lot::Mutex;

use super::Entry;

/// Time-ordered task queue consumed by explicit [`PassiveTaskQueue::process`]
/// calls, for embeddings where the host owns the only thread.
#[derive(Default)]
pub struct PassiveTaskQueue {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tasks: BinaryHeap<Entry>,
    order: u64,
}

impl PassiveTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `f` to run at the next `process` call.
    pub fn enqueue<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Instant::now(), Box::new(f));
    }

    /// Enqueue `f` to run at the first `process` call at or after `at`.
    pub fn enqueue_at<F>(&self, at: Instant, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(at, Box::new(f));
    }

    /// Number of entries waiting to run.
    pub fn len(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run at most one entry whose scheduled time has arrived.
    ///
    /// Returns `true` if an entry ran. The queue lock is released before the
    /// entry body executes.
    pub fn process(&self) -> bool {
        let entry = {
            let mut inner = self.inner.lock();
            match inner.tasks.peek() {
                Some(next) if next.scheduled_time <= Instant::now() => {
                    inner.tasks.pop().expect("peeked entry present")
                }
                _ => return false,
            }
        };
        (entry.run)();
        true
    }

    fn push(&self, at: Instant, run: Box<dyn FnOnce() + Send>) {
        let mut inner = self.inner.lock();
        let order = inner.order;
        inner.order += 1;
        inner.tasks.push(Entry {
            order,
            scheduled_time: at,
            id: None,
            run,
        });
    }
}
