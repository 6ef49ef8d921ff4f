// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seconds-resolution cron schedule dispatch

use crate::{CronError, Handler};
use chrono::{DateTime, Utc};
use cron::Schedule;
use parking_lot::Mutex;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// How often the scheduling loop wakes to check for fired schedules.
/// Schedules are seconds-resolution; a sub-second tick keeps dispatch close
/// to the fire time without busy-waiting.
const TICK: Duration = Duration::from_millis(250);

struct CronEntry {
    schedule: Schedule,
    handler: Handler,
    next_run: DateTime<Utc>,
}

/// Dispatches registered handlers at their schedule's fire times. Missed
/// firings during a stop or a slow dispatch are dropped — there is no
/// catch-up.
pub struct CronWatcher {
    entries: Mutex<Vec<CronEntry>>,
    cancel: CancellationToken,
    inflight: Mutex<JoinSet<()>>,
}

impl Default for CronWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CronWatcher {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            inflight: Mutex::new(JoinSet::new()),
        }
    }

    /// Registers a handler against a six-field, seconds-resolution cron
    /// expression. The expression is validated here, at registration —
    /// never silently dropped. Multiple handlers may register the same
    /// expression; they fire independently at the same instant.
    pub fn handle_func(&self, schedule_expr: &str, handler: Handler) -> Result<(), CronError> {
        let schedule = Schedule::from_str(schedule_expr)
            .map_err(|e| CronError::InvalidSchedule(e.to_string()))?;
        let now = Utc::now();
        let next_run = schedule.after(&now).next().unwrap_or(now);
        self.entries.lock().push(CronEntry {
            schedule,
            handler,
            next_run,
        });
        Ok(())
    }

    /// Blocks in a scheduling loop until [`stop`](Self::stop) is called.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(TICK) => {}
            }

            let now = Utc::now();
            let mut entries = self.entries.lock();
            for entry in entries.iter_mut() {
                if entry.next_run <= now {
                    let handler = entry.handler.clone();
                    self.inflight.lock().spawn(async move {
                        (handler)().await;
                    });
                    entry.next_run = entry
                        .schedule
                        .after(&now)
                        .next()
                        .unwrap_or_else(|| now + chrono::Duration::days(3650));
                }
            }
        }
    }

    /// Stops accepting new firings and waits for any handler currently
    /// firing to return, bounded by `deadline`.
    pub async fn stop(&self, deadline: Duration) {
        self.cancel.cancel();

        let mut inflight = self.inflight.lock();
        let drain = async {
            while inflight.join_next().await.is_some() {}
        };

        if tokio::time::timeout(deadline, drain).await.is_err() {
            tracing::warn!("cron watcher shutdown deadline exceeded, abandoning in-flight handlers");
        }
    }
}

#[cfg(test)]
#[path = "cron_watcher_tests.rs"]
mod tests;
