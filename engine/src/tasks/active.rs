//! Single-consumer queue backed by a dedicated worker thread.

use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use super::Entry;

/// Time-ordered task queue with its own consumer thread.
///
/// Producers never block on capacity. The consumer holds the queue lock only
/// while popping; user closures always run unlocked. Entries enqueued with an
/// id can be removed again with [`ActiveTaskQueue::erase`] as long as they
/// have not been popped yet.
pub struct ActiveTaskQueue {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    ready: Condvar,
}

struct Inner {
    tasks: BinaryHeap<Entry>,
    order: u64,
    shutdown: bool,
}

impl ActiveTaskQueue {
    /// Create the queue and spawn its consumer thread under `name`.
    pub fn new(name: &str) -> Self {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                tasks: BinaryHeap::new(),
                order: 0,
                shutdown: false,
            }),
            ready: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || consume(&worker_shared))
            .expect("spawning task queue thread");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Enqueue `f` to run as soon as the consumer gets to it.
    pub fn enqueue<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Instant::now(), None, Box::new(f));
    }

    /// Enqueue `f` to run no earlier than `at`.
    pub fn enqueue_at<F>(&self, at: Instant, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(at, None, Box::new(f));
    }

    /// Enqueue `f` under a cancellation id.
    pub fn enqueue_with_id<F>(&self, id: u64, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Instant::now(), Some(id), Box::new(f));
    }

    /// Enqueue `f` under a cancellation id, to run no earlier than `at`.
    pub fn enqueue_at_with_id<F>(&self, id: u64, at: Instant, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(at, Some(id), Box::new(f));
    }

    /// Remove every pending entry tagged with `id`. O(n).
    ///
    /// An entry removed here is guaranteed not to execute; an entry already
    /// popped by the consumer is not affected.
    pub fn erase(&self, id: u64) {
        let mut inner = self.shared.inner.lock();
        let kept: BinaryHeap<Entry> = inner
            .tasks
            .drain()
            .filter(|entry| entry.id != Some(id))
            .collect();
        inner.tasks = kept;
        drop(inner);
        self.shared.ready.notify_one();
    }

    /// Number of entries waiting to run.
    pub fn len(&self) -> usize {
        self.shared.inner.lock().tasks.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, at: Instant, id: Option<u64>, run: Box<dyn FnOnce() + Send>) {
        let mut inner = self.shared.inner.lock();
        let order = inner.order;
        inner.order += 1;
        inner.tasks.push(Entry {
            order,
            scheduled_time: at,
            id,
            run,
        });
        drop(inner);
        self.shared.ready.notify_one();
    }
}

impl Drop for ActiveTaskQueue {
    fn drop(&mut self) {
        {
            let mut inner = self.shared.inner.lock();
            inner.shutdown = true;
            inner.tasks.clear();
        }
        self.shared.ready.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn consume(shared: &Shared) {
    loop {
        let entry = {
            let mut inner = shared.inner.lock();
            loop {
                if inner.shutdown {
                    return;
                }
                match inner.tasks.peek() {
                    None => {
                        shared.ready.wait(&mut inner);
                    }
                    Some(next) => {
                        let due = next.scheduled_time;
                        if due <= Instant::now() {
                            break;
                        }
                        // Re-peek after every wakeup: an earlier entry may have
                        // arrived, or the due entry may have been erased.
                        let _ = shared.ready.wait_until(&mut inner, due);
                    }
                }
            }
            inner.tasks.pop().expect("peeked entry present")
        };
        (entry.run)();
    }
}
