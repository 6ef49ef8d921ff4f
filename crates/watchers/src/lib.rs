// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The three watchers that make up the event-detection plane: cron
//! schedules, filesystem changes, and process-table transitions. Each
//! watcher owns its entry list after registration is quiesced and runs on
//! its own task.

mod cron_watcher;
mod error;
mod file_watcher;
mod handler;
mod process_watcher;

pub use cron_watcher::CronWatcher;
pub use error::{CronError, FileError, ProcessError};
pub use file_watcher::{FileCondition, FileOperation, FileWatcher};
pub use handler::{BoxFuture, Handler};
pub use process_watcher::{
    ProcessCondition, ProcessEdge, ProcessRecord, ProcessSource, ProcessWatcher,
    SystemProcessSource,
};
