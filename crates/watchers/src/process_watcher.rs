// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-table transition watching

use crate::{Handler, ProcessError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;
use sysinfo::System;
use tokio::sync::oneshot;

/// The transition a condition is watching for: a previously-absent
/// executable becoming present (`Open`), or a previously-present one
/// disappearing (`Close`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessEdge {
    Open,
    Close,
}

/// A registered condition: watch `executable` for `edge`.
#[derive(Debug, Clone)]
pub struct ProcessCondition {
    pub executable: String,
    pub edge: ProcessEdge,
}

/// A single row of the process table, reduced to the one field the watcher
/// matches on.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub executable: String,
}

/// A source of the current process table. Production code uses
/// [`SystemProcessSource`]; tests inject a deterministic fake so that edge
/// transitions can be driven by hand rather than by spawning real
/// processes.
pub trait ProcessSource: Send + Sync + 'static {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, String>;
}

/// A [`ProcessSource`] backed by a real scan of the host's process table.
pub struct SystemProcessSource {
    system: Mutex<System>,
}

impl Default for SystemProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProcessSource {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }
}

impl ProcessSource for SystemProcessSource {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, String> {
        let mut system = self.system.lock();
        system.refresh_all();
        Ok(system
            .processes()
            .values()
            .filter_map(|p| {
                p.name()
                    .to_str()
                    .map(|name| ProcessRecord {
                        executable: name.to_string(),
                    })
            })
            .collect())
    }
}

struct ProcessEntry {
    executable: String,
    edge: ProcessEdge,
    is_running: bool,
    handler: Handler,
}

/// How often the process table is rescanned.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Watches the host process table for the registered open/close
/// transitions. Backed by an injectable [`ProcessSource`] so tests never
/// depend on the real process table.
pub struct ProcessWatcher<S: ProcessSource = SystemProcessSource> {
    source: S,
    running: Mutex<bool>,
    entries: Mutex<Vec<ProcessEntry>>,
    watching: Mutex<HashSet<String>>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
    done_rx: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ProcessWatcher<SystemProcessSource> {
    pub fn new() -> Self {
        Self::with_source(SystemProcessSource::new())
    }
}

impl Default for ProcessWatcher<SystemProcessSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ProcessSource> ProcessWatcher<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            running: Mutex::new(false),
            entries: Mutex::new(Vec::new()),
            watching: Mutex::new(HashSet::new()),
            close_tx: Mutex::new(None),
            done_rx: Mutex::new(None),
        }
    }

    /// Registers `handler` to fire whenever `condition`'s edge is observed.
    pub fn handle_func(&self, condition: &ProcessCondition, handler: Handler) {
        self.entries.lock().push(ProcessEntry {
            executable: condition.executable.clone(),
            edge: condition.edge,
            is_running: false,
            handler,
        });
        self.watching.lock().insert(condition.executable.clone());
    }

    /// Fetches a process table snapshot, retrying the source with
    /// exponential backoff (1s, 2s, 4s, ... capped at 32s) on failure.
    /// Gives up and surfaces the error once the backoff would exceed 32s.
    async fn snapshot_with_backoff(&self) -> Result<Vec<ProcessRecord>, ProcessError> {
        let mut backoff_secs: u64 = 1;
        loop {
            match self.source.snapshot() {
                Ok(procs) => return Ok(procs),
                Err(err) => {
                    if backoff_secs > 32 {
                        return Err(ProcessError::SourceExhausted(err));
                    }
                    tracing::debug!(error = %err, backoff_secs, "retrying process source");
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    backoff_secs *= 2;
                }
            }
        }
    }

    fn running_executables(&self, procs: &[ProcessRecord]) -> HashSet<String> {
        let watching = self.watching.lock();
        procs
            .iter()
            .filter(|p| watching.contains(&p.executable))
            .map(|p| p.executable.clone())
            .collect()
    }

    /// Samples the current process table to seed each entry's running
    /// state, without firing any handler — so processes already running at
    /// startup do not spuriously trigger an `Open` edge.
    async fn set_initial_state(&self) -> Result<(), ProcessError> {
        if self.entries.lock().is_empty() {
            return Ok(());
        }
        let procs = self.snapshot_with_backoff().await?;
        let running = self.running_executables(&procs);
        for entry in self.entries.lock().iter_mut() {
            entry.is_running = running.contains(&entry.executable);
        }
        Ok(())
    }

    /// Starts polling. A no-op (returns `Ok(())` without doing anything) if
    /// already running.
    pub async fn run(&self) -> Result<(), ProcessError> {
        {
            let mut running = self.running.lock();
            if *running {
                return Ok(());
            }
            *running = true;
        }

        self.set_initial_state().await?;

        let (close_tx, mut close_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        *self.close_tx.lock() = Some(close_tx);
        *self.done_rx.lock() = Some(done_rx);

        loop {
            tokio::select! {
                biased;
                _ = &mut close_rx => break,
                _ = tokio::time::sleep(POLL_INTERVAL) => {
                    if self.entries.lock().is_empty() {
                        continue;
                    }

                    let procs = self.snapshot_with_backoff().await?;
                    let running = self.running_executables(&procs);

                    let mut entries = self.entries.lock();
                    for entry in entries.iter_mut() {
                        let is_running = running.contains(&entry.executable);

                        if is_running && entry.edge == ProcessEdge::Open && !entry.is_running {
                            let handler = entry.handler.clone();
                            tokio::spawn(async move { (handler)().await; });
                        }
                        if !is_running && entry.edge == ProcessEdge::Close && entry.is_running {
                            let handler = entry.handler.clone();
                            tokio::spawn(async move { (handler)().await; });
                        }

                        entry.is_running = is_running;
                    }
                }
            }
        }

        let _ = done_tx.send(());
        *self.running.lock() = false;
        Ok(())
    }

    /// Signals the poll loop to stop and waits for it, bounded by
    /// `deadline`. A no-op if not currently running.
    pub async fn stop(&self, deadline: Duration) {
        let close_tx = self.close_tx.lock().take();
        let Some(close_tx) = close_tx else {
            return;
        };
        let _ = close_tx.send(());

        let done_rx = self.done_rx.lock().take();
        if let Some(done_rx) = done_rx {
            let _ = tokio::time::timeout(deadline, done_rx).await;
        }
    }
}

#[cfg(test)]
#[path = "process_watcher_tests.rs"]
mod tests;
