use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use rayon::{ThreadPool, ThreadPoolBuilder};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone, Copy, Debug, Default)]
pub struct TaskStats {
    pub submitted: u64,
    pub dropped: u64,
    pub completed: u64,
    pub panicked: u64,
    pub pending: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
    pending: AtomicUsize,
}

/// Small fixed pool for droppable background work.
///
/// Submissions never block: when the queue is full the job is discarded and
/// counted. A panicking job is caught, logged and dropped.
pub struct TaskPool {
    name: String,
    // Dropped before the pool so worker loops see the channel close.
    tx: Option<Sender<Job>>,
    _pool: Option<ThreadPool>,
    counters: Arc<Counters>,
    workers: usize,
}

impl TaskPool {
    pub fn new(name: &str, workers: usize, queue_capacity: usize) -> Self {
        if workers == 0 {
            return Self::disabled(name);
        }
        let prefix = name.to_string();
        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{prefix}-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!(
                    target: "tasks",
                    "{name}: could not start {workers} workers ({e}), background jobs disabled"
                );
                return Self::disabled(name);
            }
        };
        let (tx, rx) = bounded::<Job>(queue_capacity.max(1));
        let counters = Arc::new(Counters::default());
        for _ in 0..workers {
            let rx = rx.clone();
            let counters = Arc::clone(&counters);
            let name = name.to_string();
            pool.spawn(move || worker_loop(&name, &rx, &counters));
        }
        log::debug!(target: "tasks", "{name}: {workers} workers, queue {queue_capacity}");
        Self {
            name: name.to_string(),
            tx: Some(tx),
            _pool: Some(pool),
            counters,
            workers,
        }
    }

    /// A pool without workers; every submission is dropped.
    pub fn disabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tx: None,
            _pool: None,
            counters: Arc::new(Counters::default()),
            workers: 0,
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue `job`. Returns false when it was discarded.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> bool {
        let c = &self.counters;
        c.submitted.fetch_add(1, Ordering::Relaxed);
        let Some(tx) = &self.tx else {
            c.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        c.pending.fetch_add(1, Ordering::AcqRel);
        match tx.try_send(Box::new(job)) {
            Ok(()) => true,
            Err(e) => {
                c.pending.fetch_sub(1, Ordering::AcqRel);
                c.dropped.fetch_add(1, Ordering::Relaxed);
                let why = match e {
                    TrySendError::Full(_) => "queue full",
                    TrySendError::Disconnected(_) => "workers gone",
                };
                log::debug!(target: "tasks", "{}: dropped job ({why})", self.name);
                false
            }
        }
    }

    /// Wait until every accepted job has finished. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.counters.pending.load(Ordering::Acquire) > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    pub fn stats(&self) -> TaskStats {
        let c = &self.counters;
        TaskStats {
            submitted: c.submitted.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            panicked: c.panicked.load(Ordering::Relaxed),
            pending: c.pending.load(Ordering::Relaxed),
        }
    }
}

fn worker_loop(name: &str, rx: &Receiver<Job>, counters: &Counters) {
    while let Ok(job) = rx.recv() {
        if catch_unwind(AssertUnwindSafe(job)).is_ok() {
            counters.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.panicked.fetch_add(1, Ordering::Relaxed);
            log::warn!(target: "tasks", "{name}: background job panicked, dropped");
        }
        counters.pending.fetch_sub(1, Ordering::AcqRel);
    }
}
