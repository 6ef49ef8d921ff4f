// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The handler shape shared by all three watchers

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, pinned future, the return type of a [`Handler`] invocation.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A registered handler closure. By contract handlers must not block on
/// anything other than enqueueing onto the execution pool — they are
/// expected to do one thing: construct a job and await `pool.enqueue`,
/// which itself blocks only briefly.
///
/// Reserved as a parameterless closure today; the event payload (matched
/// path, rename old/new, process pid) is deliberately not threaded through
/// yet — see the crate-level design notes on this open question. Handlers
/// that need payload data should capture it from their own closure
/// construction site (the supervisor already knows the static condition
/// details when it registers the handler).
pub type Handler = Arc<dyn Fn() -> BoxFuture + Send + Sync>;
