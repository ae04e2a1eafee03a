/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A thread pool that grows with demand.
//!
//! A submitted job is picked up by an idle worker if there is one, and otherwise by a newly spawned
//! worker, so the number of workers is unbounded. Workers that stay idle for longer than the keep-alive
//! period exit. Dropping the pool lets every worker exit once it finishes its current job.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

type Job = Box<dyn FnOnce() + Send>;

struct Shared {
    jobs: Mutex<Receiver<Job>>,
    idle: AtomicUsize,
    keep_alive: Duration,
}

pub(crate) struct WorkerPool {
    submitter: Mutex<Sender<Job>>,
    shared: Arc<Shared>,
}

impl WorkerPool {
    pub(crate) fn new(keep_alive: Duration) -> WorkerPool {
        let (submitter, jobs) = mpsc::channel();
        WorkerPool {
            submitter: Mutex::new(submitter),
            shared: Arc::new(Shared {
                jobs: Mutex::new(jobs),
                idle: AtomicUsize::new(0),
                keep_alive,
            }),
        }
    }

    /// Run `task` on a worker and block until it returns.
    ///
    /// Fails with [WorkerLost] if the task panicked, or if it could not be handed to a worker.
    pub(crate) fn execute<T, F>(&self, task: F) -> Result<T, WorkerLost>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (result_sender, result) = mpsc::channel();
        let job: Job = Box::new(move || {
            let _ = result_sender.send(task());
        });

        // Reserve an idle worker for the job, or spawn a new one when every worker is busy.
        if self
            .shared
            .idle
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |idle| idle.checked_sub(1))
            .is_err()
        {
            self.spawn_worker()?;
        }

        self.submitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(job)
            .map_err(|_| WorkerLost)?;

        result.recv().map_err(|_| WorkerLost)
    }

    fn spawn_worker(&self) -> Result<(), WorkerLost> {
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("proposer-worker".to_string())
            .spawn(move || work(shared))
            .map(|_| ())
            .map_err(|err| {
                log::error!("Failed to spawn a proposer worker: {}", err);
                WorkerLost
            })
    }
}

// `idle` counts the waiting workers that no queued job has been reserved for. A worker only joins it
// after finishing a job, and only leaves it on its own when it retires.
fn work(shared: Arc<Shared>) {
    loop {
        let received = shared
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv_timeout(shared.keep_alive);

        match received {
            Ok(job) => {
                job();
                shared.idle.fetch_add(1, Ordering::SeqCst);
            }
            // A queued job may still be owed to this worker, in which case it keeps waiting.
            Err(RecvTimeoutError::Timeout) => {
                if shared
                    .idle
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |idle| idle.checked_sub(1))
                    .is_ok()
                {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// The worker running a task terminated without reporting a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerLost;
