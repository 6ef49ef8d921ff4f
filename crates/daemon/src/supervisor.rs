// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composes the three watchers and the execution pool, routes service
//! conditions to the right watcher, and coordinates startup/shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use warden_config::{ConditionSpec, Document, ExecutorSpec, FileOperationSpec, ProcessStateSpec};
use warden_core::{Executor, Job};
use warden_executors::{HttpExecutor, ShellExecutor};
use warden_pool::ExecutionPool;
use warden_watchers::{
    CronWatcher, FileCondition, FileOperation, FileWatcher, Handler, ProcessCondition,
    ProcessEdge, ProcessWatcher,
};

use crate::env;
use crate::error::SupervisorError;

/// Composes the event-detection plane (cron, file, process watchers) and
/// the execution pool, and governs the daemon's startup and shutdown.
pub struct Supervisor {
    cron: Arc<CronWatcher>,
    file: Arc<FileWatcher>,
    process: Arc<ProcessWatcher>,
    pool: Arc<ExecutionPool>,
    shutdown_timeout: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            cron: Arc::new(CronWatcher::new()),
            file: Arc::new(FileWatcher::new()),
            process: Arc::new(ProcessWatcher::new()),
            pool: Arc::new(ExecutionPool::new(env::pool_size())),
            shutdown_timeout: env::shutdown_timeout(),
        }
    }

    /// Parses the configuration at `config_path`, registers every service
    /// against its watcher, then runs until an interrupt signal or a
    /// watcher reports an unexpected terminal failure. Shutdown of every
    /// subsystem is deadline-bounded and runs in parallel.
    pub async fn run(&self, config_path: &Path) -> Result<(), SupervisorError> {
        let document = warden_config::load(config_path)?;
        self.register(&document)?;

        self.pool.start();

        let (fail_tx, mut fail_rx) = mpsc::channel::<String>(4);

        {
            let cron = Arc::clone(&self.cron);
            tokio::spawn(async move { cron.run().await });
        }
        {
            let file = Arc::clone(&self.file);
            let fail_tx = fail_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = file.run().await {
                    let _ = fail_tx.send(format!("file watcher: {e}")).await;
                }
            });
        }
        {
            let process = Arc::clone(&self.process);
            let fail_tx = fail_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = process.run().await {
                    let _ = fail_tx.send(format!("process watcher: {e}")).await;
                }
            });
        }
        drop(fail_tx);

        let failure = tokio::select! {
            _ = wait_for_interrupt() => {
                tracing::info!("received interrupt, shutting down");
                None
            }
            Some(reason) = fail_rx.recv() => {
                tracing::error!(reason = %reason, "shutting down after watcher failure");
                Some(reason)
            }
        };

        self.shutdown().await?;

        match failure {
            Some(reason) => Err(SupervisorError::WatcherFailed(reason)),
            None => Ok(()),
        }
    }

    fn register(&self, document: &Document) -> Result<(), SupervisorError> {
        for service in &document.services {
            let executor = construct_executor(&service.execute);
            let handler = job_handler(Arc::clone(&self.pool), &service.name, executor);

            match &service.condition {
                ConditionSpec::Cron(cron) => {
                    self.cron.handle_func(&cron.schedule, handler)?;
                }
                ConditionSpec::File(file) => {
                    let condition = FileCondition {
                        path: PathBuf::from(&file.path),
                        operation: map_operation(file.operation),
                        recursive: file.recursive,
                    };
                    self.file.handle_func(&condition, handler)?;
                }
                ConditionSpec::Process(process) => {
                    let condition = ProcessCondition {
                        executable: process.executable.clone(),
                        edge: map_edge(process.state),
                    };
                    self.process.handle_func(&condition, handler);
                }
            }
        }
        log_registration(document);
        Ok(())
    }

    /// Stops all four subsystems in parallel with the same deadline. Each
    /// subsystem's stop error is logged individually; only the pool's
    /// timeout is surfaced to the caller, since that's the one shutdown
    /// failure the supervisor's own return value needs to reflect.
    async fn shutdown(&self) -> Result<(), SupervisorError> {
        let deadline = self.shutdown_timeout;
        let (file_res, _, _, pool_res) = tokio::join!(
            self.file.stop(deadline),
            self.cron.stop(deadline),
            self.process.stop(deadline),
            self.pool.stop(deadline),
        );

        if let Err(e) = file_res {
            tracing::error!(error = %e, "file watcher failed to stop cleanly");
        }
        if let Err(e) = &pool_res {
            tracing::error!(error = %e, "execution pool failed to stop cleanly");
        }
        pool_res.map_err(SupervisorError::from)
    }
}

fn job_handler(pool: Arc<ExecutionPool>, service_name: &str, executor: Arc<dyn Executor>) -> Handler {
    let service_name = service_name.to_string();
    Arc::new(move || {
        let pool = Arc::clone(&pool);
        let executor = Arc::clone(&executor);
        let service_name = service_name.clone();
        Box::pin(async move {
            let job = Job::new(service_name, executor);
            if let Err(e) = pool.enqueue(job).await {
                tracing::error!(error = %e, "failed to enqueue job");
            }
        })
    })
}

fn construct_executor(spec: &ExecutorSpec) -> Arc<dyn Executor> {
    match spec {
        ExecutorSpec::Shell(cfg) => Arc::new(ShellExecutor {
            shell: cfg.shell.clone(),
            command: cfg.command.clone(),
            timeout: Duration::from_secs(cfg.timeout),
            log_output: cfg.log,
        }),
        ExecutorSpec::Http(cfg) => Arc::new(HttpExecutor {
            url: cfg.url.clone(),
            method: cfg.method.clone(),
            headers: cfg.headers.clone(),
            body: cfg.body.clone(),
            timeout: Duration::from_secs(cfg.timeout),
            log_response: cfg.log,
        }),
    }
}

fn map_operation(op: FileOperationSpec) -> FileOperation {
    match op {
        FileOperationSpec::Create => FileOperation::Create,
        FileOperationSpec::Update => FileOperation::Update,
        FileOperationSpec::Remove => FileOperation::Remove,
        FileOperationSpec::Rename => FileOperation::Rename,
    }
}

fn map_edge(state: ProcessStateSpec) -> ProcessEdge {
    match state {
        ProcessStateSpec::Open => ProcessEdge::Open,
        ProcessStateSpec::Close => ProcessEdge::Close,
    }
}

fn log_registration(document: &Document) {
    tracing::info!(services = document.services.len(), "services registered");
}

async fn wait_for_interrupt() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            std::future::pending().await
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending().await
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
