//! Shared worker pool for asynchronous request execution.
//!
//! The pool is process-wide, bounded and lazily initialized on first use.
//! It is not torn down automatically; call [`shutdown`] at process exit to
//! reclaim the worker threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Submissions queued beyond this bound block the submitting thread until a
/// worker drains the queue.
const QUEUE_DEPTH: usize = 64;

static POOL: OnceLock<WorkerPool> = OnceLock::new();

fn pool() -> &'static WorkerPool {
    POOL.get_or_init(|| WorkerPool::new(default_pool_size(), QUEUE_DEPTH))
}

fn default_pool_size() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

/// Submit a blocking execution to the shared pool.
pub(crate) fn submit<F>(task: F) -> ResponseHandle
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    pool().submit(task)
}

/// Stop the shared pool and join its worker threads.
///
/// Intended to be called once at process exit. Executions still queued
/// complete their handles with [`Error::Cancelled`]; executions already
/// running finish first. Must not be called from a worker thread.
pub fn shutdown() {
    if let Some(pool) = POOL.get() {
        pool.shutdown();
    }
}

/// Handle to an in-flight asynchronous execution.
///
/// Completion order between independently submitted executions is
/// unspecified.
pub struct ResponseHandle {
    receiver: Receiver<Result<String>>,
    cancelled: Arc<AtomicBool>,
}

impl ResponseHandle {
    /// Block until the execution completes and return its outcome.
    pub fn wait(self) -> Result<String> {
        self.receiver.recv().unwrap_or(Err(Error::Cancelled))
    }

    /// Request cancellation.
    ///
    /// Best-effort: an execution that has not started yet is skipped and its
    /// handle completes with [`Error::Cancelled`]. An execution already
    /// dispatched to the transport runs to completion and its result is
    /// simply discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Fixed-size pool of named worker threads draining a bounded queue.
pub(crate) struct WorkerPool {
    sender: Mutex<Option<SyncSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub(crate) fn new(size: usize, queue_depth: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<Job>(queue_depth);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("api-worker-{index}"))
                    .spawn(move || {
                        loop {
                            // Hold the lock only while receiving, never
                            // while a job runs.
                            let job = receiver.lock().recv();
                            match job {
                                Ok(job) => job(),
                                Err(_) => break,
                            }
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        debug!(workers = size, "worker pool started");

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    pub(crate) fn submit<F>(&self, task: F) -> ResponseHandle
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let job: Job = Box::new(move || {
            let outcome = if flag.load(Ordering::SeqCst) {
                Err(Error::Cancelled)
            } else {
                task()
            };
            let _ = tx.send(outcome);
        });

        // A job dropped here (pool already shut down) closes the handle's
        // channel, so `wait` reports cancellation.
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(job);
        }

        ResponseHandle {
            receiver: rx,
            cancelled,
        }
    }

    pub(crate) fn shutdown(&self) {
        self.sender.lock().take();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn completes_submitted_executions() {
        let pool = WorkerPool::new(2, 8);
        let first = pool.submit(|| Ok("one".to_owned()));
        let second = pool.submit(|| Ok("two".to_owned()));

        assert_eq!(first.wait().unwrap(), "one");
        assert_eq!(second.wait().unwrap(), "two");
        pool.shutdown();
    }

    #[test]
    fn surfaces_execution_failures_through_the_handle() {
        let pool = WorkerPool::new(1, 8);
        let handle = pool.submit(|| Err(Error::Transport("connection refused".into())));

        assert!(matches!(handle.wait(), Err(Error::Transport(_))));
        pool.shutdown();
    }

    #[test]
    fn cancels_queued_executions_before_they_start() {
        let pool = WorkerPool::new(1, 8);
        let blocker = pool.submit(|| {
            thread::sleep(Duration::from_millis(200));
            Ok("blocker".to_owned())
        });
        let cancelled = pool.submit(|| Ok("ran anyway".to_owned()));
        cancelled.cancel();

        assert!(cancelled.is_cancelled());
        assert!(matches!(cancelled.wait(), Err(Error::Cancelled)));
        assert_eq!(blocker.wait().unwrap(), "blocker");
        pool.shutdown();
    }

    #[test]
    fn submissions_after_shutdown_report_cancellation() {
        let pool = WorkerPool::new(1, 8);
        pool.shutdown();

        let handle = pool.submit(|| Ok("late".to_owned()));
        assert!(matches!(handle.wait(), Err(Error::Cancelled)));
    }

    #[test]
    fn shutdown_waits_for_running_executions() {
        let pool = WorkerPool::new(1, 8);
        let handle = pool.submit(|| {
            thread::sleep(Duration::from_millis(50));
            Ok("finished".to_owned())
        });

        // Give the worker a moment to pick the job up.
        thread::sleep(Duration::from_millis(10));
        pool.shutdown();
        assert_eq!(handle.wait().unwrap(), "finished");
    }
}
