// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration and lifecycle errors for the three watchers

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CronError {
    #[error("invalid cron schedule: {0}")]
    InvalidSchedule(String),
}

#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot watch for creation of a path that already exists as a regular file")]
    WatchCreateExistingFile,
    #[error("failed to stat path: {0}")]
    Stat(#[from] std::io::Error),
    #[error("failed to register path with the underlying watcher: {0}")]
    Watch(#[from] notify::Error),
    #[error("file watcher already stopped")]
    AlreadyClosed,
    #[error("file watcher is already running")]
    AlreadyRunning,
    #[error("file watcher backend failed: {0}")]
    BackendFailed(notify::Error),
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process source failed after exhausting backoff: {0}")]
    SourceExhausted(String),
}
