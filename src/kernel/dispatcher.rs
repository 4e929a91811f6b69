use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use config::Config;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kernel::queue::SerialExecutor;

/// Assigns serial execution contexts to actor cells.
///
/// The runtime calls `attach` once for every cell it creates; the
/// returned executor is bound to that cell for its entire life.
pub trait Dispatcher: Send + Sync + 'static {
    fn attach(&self) -> SerialExecutor;
}

/// The default dispatcher: a private queue, and therefore a private
/// worker thread, for every cell.
///
/// Simple and isolation friendly, at the cost of one thread per
/// actor. Well suited to tests and small trees.
pub struct ThreadDispatcher;

impl ThreadDispatcher {
    pub fn new() -> ThreadDispatcher {
        ThreadDispatcher
    }
}

impl Default for ThreadDispatcher {
    fn default() -> Self {
        ThreadDispatcher::new()
    }
}

impl Dispatcher for ThreadDispatcher {
    fn attach(&self) -> SerialExecutor {
        SerialExecutor::new()
    }
}

/// A dispatcher maintaining a bounded pool of queues.
///
/// The first `max_queues` cells each receive a fresh queue; any cell
/// created after that shares a queue picked uniformly at random from
/// the pool. Actors sharing a queue must not block in `recv`: doing
/// so stalls every peer on the same queue.
pub struct PoolDispatcher {
    max_queues: usize,
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    queues: Vec<SerialExecutor>,
    rng: StdRng,
}

impl PoolDispatcher {
    pub fn new(max_queues: usize) -> PoolDispatcher {
        assert!(max_queues > 0, "dispatcher pool needs at least one queue");

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;

        PoolDispatcher {
            max_queues,
            inner: Mutex::new(PoolInner {
                queues: Vec::with_capacity(max_queues),
                rng: StdRng::seed_from_u64(seed),
            }),
        }
    }

    /// Pool size from `dispatcher.pool_size` (default: twice the
    /// number of cpus, set by `load_config`).
    pub fn from_config(cfg: &Config) -> PoolDispatcher {
        let size = cfg
            .get_int("dispatcher.pool_size")
            .map(|n| n as usize)
            .unwrap_or_else(|_| num_cpus::get() * 2);

        PoolDispatcher::new(size)
    }
}

impl Dispatcher for PoolDispatcher {
    fn attach(&self) -> SerialExecutor {
        let mut inner = self.inner.lock().unwrap();

        if inner.queues.len() < self.max_queues {
            let queue = SerialExecutor::new();
            inner.queues.push(queue.clone());
            queue
        } else {
            let len = inner.queues.len();
            let i = inner.rng.gen_range(0..len);
            inner.queues[i].clone()
        }
    }
}
