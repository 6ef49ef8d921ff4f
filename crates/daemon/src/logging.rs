// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup: an `EnvFilter` layered with a `fmt` subscriber, writing to
//! stderr. No file rotation — this daemon has no per-project log directory
//! to own, so it logs to stderr like a well-behaved foreground process.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::env;

/// Installs the global tracing subscriber. Idempotent guard against being
/// called twice (e.g. once from a test harness, once from `main`) is left
/// to `tracing`'s own "already set" error, which we treat as a no-op.
pub fn init() {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
