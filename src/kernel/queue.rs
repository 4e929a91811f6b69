use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, trace};

type Task = Box<dyn FnOnce() + Send + 'static>;

static NEXT_QUEUE_ID: AtomicUsize = AtomicUsize::new(0);

/// A serial execution context.
///
/// Tasks submitted through `execute` run strictly FIFO and never
/// overlap: each executor is backed by a single dedicated worker
/// thread draining an unbounded channel. Cells bound to the same
/// executor therefore share one thread of execution, which is why
/// user code must not block inside `recv` when a pooled dispatcher
/// is in use.
///
/// The worker exits once every handle to the executor has been
/// dropped and the queue has drained.
#[derive(Clone)]
pub struct SerialExecutor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    id: usize,
    tx: Sender<Task>,
}

impl SerialExecutor {
    pub fn new() -> SerialExecutor {
        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = unbounded::<Task>();

        thread::Builder::new()
            .name(format!("queue-{}", id))
            .spawn(move || run_queue(id, rx))
            .expect("failed to spawn queue worker thread");

        SerialExecutor {
            inner: Arc::new(ExecutorInner { id, tx }),
        }
    }

    /// Submits a task to the back of the queue. Never blocks.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.tx.send(Box::new(f)).is_err() {
            debug!("task submitted to stopped queue-{}", self.inner.id);
        }
    }

    /// True if both handles submit to the same underlying queue.
    pub fn same_queue(&self, other: &SerialExecutor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn id(&self) -> usize {
        self.inner.id
    }
}

impl Default for SerialExecutor {
    fn default() -> Self {
        SerialExecutor::new()
    }
}

fn run_queue(id: usize, rx: Receiver<Task>) {
    while let Ok(task) = rx.recv() {
        task();
    }

    trace!("queue-{} drained, worker exiting", id);
}

#[cfg(test)]
mod tests {
    use super::SerialExecutor;
    use std::sync::mpsc::channel;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn tasks_run_in_submission_order() {
        let queue = SerialExecutor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = channel();

        for i in 0..100 {
            let seen = seen.clone();
            let tx = tx.clone();
            queue.execute(move || {
                seen.lock().unwrap().push(i);
                if i == 99 {
                    tx.send(()).unwrap();
                }
            });
        }

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn tasks_never_overlap() {
        // A slow task submitted first must complete before a fast one
        // submitted from another thread afterwards.
        let queue = SerialExecutor::new();
        let (tx, rx) = channel();

        let first = tx.clone();
        queue.execute(move || {
            thread::sleep(Duration::from_millis(50));
            first.send("first").unwrap();
        });

        let q = queue.clone();
        thread::spawn(move || {
            q.execute(move || {
                tx.send("second").unwrap();
            });
        });

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "first");
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "second");
    }

    #[test]
    fn queue_identity() {
        let a = SerialExecutor::new();
        let b = SerialExecutor::new();

        assert!(a.same_queue(&a.clone()));
        assert!(!a.same_queue(&b));
    }
}
