// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the execution pool's lifecycle

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool shutdown deadline exceeded")]
    ShutdownTimedOut,
    #[error("enqueue called on a pool that is not running")]
    NotRunning,
}
