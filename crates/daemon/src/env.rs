// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate. These are
//! operational tuning knobs, not new functionality — they do not change any
//! invariant the pool or the watchers place on their own behavior.

use std::time::Duration;
use warden_pool::DEFAULT_POOL_SIZE;

/// Ceiling on graceful shutdown of each subsystem.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// `WARDEN_LOG` — passed through to `tracing_subscriber::EnvFilter`.
pub fn log_filter() -> String {
    std::env::var("WARDEN_LOG").unwrap_or_else(|_| "info".to_string())
}

/// `WARDEN_POOL_SIZE` — overrides [`DEFAULT_POOL_SIZE`] for operators
/// running on constrained hosts.
pub fn pool_size() -> usize {
    std::env::var("WARDEN_POOL_SIZE")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_POOL_SIZE)
}

/// `WARDEN_SHUTDOWN_TIMEOUT_MS` — overrides [`DEFAULT_SHUTDOWN_TIMEOUT`].
pub fn shutdown_timeout() -> Duration {
    std::env::var("WARDEN_SHUTDOWN_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
