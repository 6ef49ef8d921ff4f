// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor-level error taxonomy. Configuration errors and registration
//! conflicts are fatal at startup; a watcher's terminal failure surfaces
//! here too, since the supervisor treats it as a shutdown trigger that
//! still must produce a non-zero exit code.

use thiserror::Error;
use warden_config::ConfigError;
use warden_pool::PoolError;
use warden_watchers::{CronError, FileError};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid cron registration: {0}")]
    CronRegistration(#[from] CronError),

    #[error("invalid file watch registration: {0}")]
    FileRegistration(#[from] FileError),

    #[error("{0} failed unexpectedly, shutting down")]
    WatcherFailed(String),

    #[error(transparent)]
    Shutdown(#[from] PoolError),
}
