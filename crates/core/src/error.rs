// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors produced by executor invocations

use thiserror::Error;

/// Errors that can occur while an [`Executor`](crate::Executor) runs.
///
/// `Timeout` is the well-known, distinguished case every executor
/// implementation must collapse a deadline-exceeded condition into, per the
/// executor contract.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("execution timeout exceeded")]
    Timeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(String),
    #[error("{0}")]
    Other(String),
}
