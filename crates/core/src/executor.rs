// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The executor contract shared by the pool and every executor implementation

use crate::ExecuteError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Handle passed to an [`Executor`] invocation so it can observe pool
/// shutdown. Shell and HTTP executors are required to honour cancellation by
/// aborting their child process / in-flight request.
pub type CancellationHandle = CancellationToken;

/// A single-shot, cancellable, side-effecting action bound to one service.
///
/// Implementations must be safe to invoke concurrently from multiple pool
/// workers (each invocation is independent; there is no shared mutable
/// state between calls unless the implementation provides its own
/// synchronization).
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    /// Run the action. `cancel` is signalled when the pool is stopping;
    /// implementations should abort in-flight work and return promptly.
    async fn execute(&self, cancel: CancellationHandle) -> Result<(), ExecuteError>;
}
