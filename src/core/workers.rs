//! Background thread pool for frame decoding
//!
//! Uses crossbeam for an MPMC job queue with closure-based task execution.
//! Workers never touch frame slots directly: results travel back to the
//! owning thread over a channel (see `frame_store`).

use crossbeam_channel::{Sender, unbounded};
use log::{debug, error, trace};
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound on how long `Drop` waits for workers to drain
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool for CPU/IO-bound decode jobs.
///
/// # Example
/// ```ignore
/// let workers = Workers::new(Workers::default_threads())?;
/// workers.execute(move || {
///     let result = fetcher.fetch(index, &path);
///     tx.send(Settlement { index, result }).ok();
/// });
/// ```
pub struct Workers {
    sender: Option<Sender<Job>>, // None once shutdown has begun
    handles: Vec<thread::JoinHandle<()>>,
}

impl Workers {
    /// Create worker pool with `num_threads` threads (at least one).
    pub fn new(num_threads: usize) -> io::Result<Self> {
        let num_threads = num_threads.max(1);
        let (tx, rx) = unbounded::<Job>();
        let mut handles = Vec::with_capacity(num_threads);

        for worker_id in 0..num_threads {
            let rx = rx.clone();

            let handle = thread::Builder::new()
                .name(format!("tunnel-worker-{}", worker_id))
                .spawn(move || {
                    debug!("Worker {} started", worker_id);

                    // Execute closures until channel closes
                    while let Ok(job) = rx.recv() {
                        job();
                    }

                    debug!("Worker {} stopped", worker_id);
                })?;

            handles.push(handle);
        }

        debug!("Workers initialized: {} threads", num_threads);

        Ok(Self {
            sender: Some(tx),
            handles,
        })
    }

    /// 75% of CPU cores, leave the rest for the UI thread
    pub fn default_threads() -> usize {
        (num_cpus::get() * 3 / 4).max(1)
    }

    /// Number of worker threads
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Execute closure on a worker thread. No return value, results go
    /// through whatever channel the closure captured.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            error!("Failed to enqueue job: pool is shutting down");
            return;
        };
        if let Err(e) = sender.send(Box::new(f)) {
            error!("Failed to enqueue job: {}", e);
        }
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        debug!("Workers shutting down ({} threads)...", self.handles.len());

        // Closing the channel ends each recv() loop once the queue drains.
        // Cancelled loads skip their jobs, so this is normally quick.
        self.sender.take();

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        for handle in std::mem::take(&mut self.handles) {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    trace!("Shutdown timeout reached, detaching remaining workers");
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
        trace!("Workers shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Test: Jobs run on the pool
    /// Validates: Every enqueued closure executes exactly once
    #[test]
    fn test_execute_runs_all_jobs() {
        let workers = Workers::new(3).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = crossbeam_channel::unbounded();

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            let tx = tx.clone();
            workers.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                tx.send(()).ok();
            });
        }

        for _ in 0..10 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    /// Test: Zero threads requested
    /// Validates: Pool always has at least one worker
    #[test]
    fn test_min_one_thread() {
        let workers = Workers::new(0).unwrap();
        assert_eq!(workers.len(), 1);
        assert!(Workers::default_threads() >= 1);
    }

    /// Test: Drop waits for queued work
    /// Validates: Jobs already enqueued finish before drop returns
    #[test]
    fn test_drop_joins_workers() {
        let workers = Workers::new(1).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&done);
        workers.execute(move || {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        });

        drop(workers);
        assert!(done.load(Ordering::SeqCst));
    }
}
