//! Bounded dispatcher that runs a batch of fallible jobs with at most K in flight.
//!
//! Jobs are queued with [`BoundedDispatcher::add_job`] and executed by
//! [`BoundedDispatcher::run`], which consumes the dispatcher. Queueing while a
//! run is in progress is therefore impossible by construction.
//!
//! Execution model:
//! - all queued jobs are pushed into one hand-off channel, then the sender is dropped
//! - `min(K, jobs)` worker tasks pull from that channel until it is empty
//! - every worker reports each outcome on a results channel
//! - the results channel is drained once, after all workers have finished
//!
//! Error policy: every job runs to completion regardless of other failures.
//! Failures are kept in completion order and the most recent one is returned
//! (last failure wins), together with the total failure count.
//! A panicking job is recorded as a failure and does not stop its worker.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

type Job<E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), E>> + Send>;

/// Rejected concurrency limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("concurrency limit must be at least 1, got {0}")]
pub struct InvalidConcurrency(pub usize);

/// Why a single job did not succeed.
#[derive(Debug, Error)]
pub enum JobFailure<E> {
    #[error("{0}")]
    Failed(E),

    #[error("job panicked: {0}")]
    Panicked(String),
}

/// Error returned by a dispatcher run.
#[derive(Debug, Error)]
pub enum DispatcherError<E> {
    #[error("{failed} of {total} jobs failed; last failure: {last}")]
    JobsFailed {
        last: JobFailure<E>,
        failed: usize,
        total: usize,
    },

    /// `failed` and `last` describe the jobs that finished with an error
    /// before cancellation; unfinished jobs are not counted in `failed`.
    #[error("dispatch cancelled after {completed} of {total} jobs completed ({failed} failed)")]
    Cancelled {
        completed: usize,
        total: usize,
        failed: usize,
        last: Option<JobFailure<E>>,
    },
}

/// Runs queued jobs with a hard cap on concurrency.
pub struct BoundedDispatcher<E> {
    limit: usize,
    jobs: Vec<Job<E>>,
}

impl<E: Send + 'static> BoundedDispatcher<E> {
    /// Create a dispatcher running at most `limit` jobs at once.
    ///
    /// A limit of zero would never make progress and is rejected.
    pub fn new(limit: usize) -> Result<Self, InvalidConcurrency> {
        if limit == 0 {
            return Err(InvalidConcurrency(limit));
        }
        Ok(Self {
            limit,
            jobs: Vec::new(),
        })
    }

    /// Queue one job. Nothing runs until [`run`](Self::run) is called.
    pub fn add_job<F, Fut>(&mut self, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.jobs.push(Box::new(move || job().boxed()));
    }

    /// Run every queued job and wait for all of them to finish.
    pub async fn run(self) -> Result<(), DispatcherError<E>> {
        self.run_until(std::future::pending()).await
    }

    /// Like [`run`](Self::run), but stops early when `cancel` resolves.
    ///
    /// On cancellation the in-flight jobs are aborted, jobs not yet started
    /// are dropped, and [`DispatcherError::Cancelled`] is returned.
    pub async fn run_until<C>(self, cancel: C) -> Result<(), DispatcherError<E>>
    where
        C: Future<Output = ()>,
    {
        let total = self.jobs.len();
        if total == 0 {
            return Ok(());
        }

        let (job_tx, job_rx) = mpsc::unbounded_channel::<Job<E>>();
        for job in self.jobs {
            // The receiver is alive until the workers finish.
            let _ = job_tx.send(job);
        }
        drop(job_tx);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<Result<(), JobFailure<E>>>();

        let mut workers = JoinSet::new();
        for _ in 0..self.limit.min(total) {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            workers.spawn(async move {
                loop {
                    let next = job_rx.lock().await.recv().await;
                    let Some(job) = next else {
                        break;
                    };

                    let outcome = match AssertUnwindSafe(async move { job().await })
                        .catch_unwind()
                        .await
                    {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(JobFailure::Failed(e)),
                        Err(panic) => Err(JobFailure::Panicked(panic_message(panic.as_ref()))),
                    };

                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let cancelled = tokio::select! {
            _ = async {
                while let Some(joined) = workers.join_next().await {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Dispatcher worker terminated abnormally");
                    }
                }
            } => false,
            _ = cancel => true,
        };

        if cancelled {
            workers.abort_all();
            while workers.join_next().await.is_some() {}
        }

        let mut completed = 0usize;
        let mut failures = Vec::new();
        while let Some(outcome) = result_rx.recv().await {
            completed += 1;
            if let Err(failure) = outcome {
                failures.push(failure);
            }
        }

        let failed = failures.len();
        if cancelled {
            tracing::warn!(completed, failed, total, "Dispatch cancelled before all jobs finished");
            return Err(DispatcherError::Cancelled {
                completed,
                total,
                failed,
                last: failures.pop(),
            });
        }

        match failures.pop() {
            None => Ok(()),
            Some(last) => Err(DispatcherError::JobsFailed {
                last,
                failed,
                total,
            }),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
