// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed-size execution pool

use crate::PoolError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use warden_core::Job;

/// Default worker count, matching the original daemon's fixed pool size.
pub const DEFAULT_POOL_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running,
    StoppedForever,
}

/// A bounded worker set consuming a job queue with cooperative cancellation,
/// per-job error logging, panic containment, and a deadline-bounded
/// graceful stop.
///
/// State transitions are monotonic within one instance: `stopped → running
/// → stopped-forever`. A pool is not restartable.
pub struct ExecutionPool {
    size: usize,
    phase: Mutex<Phase>,
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    cancel: CancellationToken,
    workers: Mutex<Option<JoinSet<()>>>,
}

impl ExecutionPool {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            phase: Mutex::new(Phase::Stopped),
            tx: Mutex::new(None),
            cancel: CancellationToken::new(),
            workers: Mutex::new(None),
        }
    }

    /// Spawns `size` worker tasks. A second `Start` on a running pool, or a
    /// `Start` after the pool has been stopped, is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut phase = self.phase.lock();
        if *phase != Phase::Stopped {
            return;
        }
        *phase = Phase::Running;
        drop(phase);

        // Capacity 1 is the closest tokio gets to Go's unbuffered channel —
        // `enqueue` blocks until a worker actually receives the job, matching
        // the contract's "blocks until a worker is free" wording rather than
        // letting callers race ahead of the pool's real concurrency.
        let (tx, rx) = mpsc::channel::<Job>(1);
        *self.tx.lock() = Some(tx);

        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let mut set = JoinSet::new();
        for worker_id in 0..self.size {
            let rx = Arc::clone(&rx);
            let cancel = self.cancel.clone();
            set.spawn(worker_loop(worker_id, rx, cancel));
        }
        *self.workers.lock() = Some(set);
    }

    /// Offers a job; blocks until a worker is free or the pool is stopping.
    /// Calling this after `Stop` has begun is a programming error and
    /// returns [`PoolError::NotRunning`].
    pub async fn enqueue(&self, job: Job) -> Result<(), PoolError> {
        let tx = { self.tx.lock().clone() };
        match tx {
            Some(tx) => tx.send(job).await.map_err(|_| PoolError::NotRunning),
            None => Err(PoolError::NotRunning),
        }
    }

    /// Initiates graceful shutdown: stops accepting new jobs, drains jobs
    /// already in flight, signals cancellation to running executors, then
    /// waits for all workers to exit or `deadline` to elapse.
    ///
    /// A second call on an already-stopped pool returns immediately.
    pub async fn stop(&self, deadline: Duration) -> Result<(), PoolError> {
        {
            let mut phase = self.phase.lock();
            match *phase {
                Phase::StoppedForever => return Ok(()),
                Phase::Stopped => {
                    *phase = Phase::StoppedForever;
                    return Ok(());
                }
                Phase::Running => *phase = Phase::StoppedForever,
            }
        }

        // Closing the sender lets workers drain whatever is already queued.
        self.tx.lock().take();
        self.cancel.cancel();

        let workers = self.workers.lock().take();
        let Some(mut set) = workers else {
            return Ok(());
        };

        let drain = async {
            while set.join_next().await.is_some() {}
        };

        match tokio::time::timeout(deadline, drain).await {
            Ok(()) => Ok(()),
            Err(_) => Err(PoolError::ShutdownTimedOut),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.phase.lock() == Phase::Running
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    cancel: CancellationToken,
) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            break;
        };
        run_job(worker_id, job, cancel.clone()).await;
    }
}

/// Runs one job in its own task so a panicking executor cannot take down the
/// worker that dispatched it — the worker just logs and keeps consuming.
async fn run_job(worker_id: usize, job: Job, cancel: CancellationToken) {
    let Job {
        id,
        service,
        executor,
    } = job;
    let handle = tokio::spawn(async move { executor.execute(cancel).await });

    match handle.await {
        Ok(Ok(())) => {
            tracing::info!(worker = worker_id, job = %id, service = %service, "job completed");
        }
        Ok(Err(e)) => {
            tracing::error!(worker = worker_id, job = %id, service = %service, error = %e, "job failed");
        }
        Err(join_err) if join_err.is_panic() => {
            let panic_msg = describe_panic(join_err.into_panic());
            tracing::error!(
                worker = worker_id,
                job = %id,
                service = %service,
                panic = %panic_msg,
                "executor panicked"
            );
        }
        Err(join_err) => {
            tracing::warn!(worker = worker_id, job = %id, service = %service, error = %join_err, "job task cancelled");
        }
    }
}

fn describe_panic(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
