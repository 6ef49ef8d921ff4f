// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pool-scheduled unit of work

use crate::Executor;
use std::sync::Arc;
use uuid::Uuid;

/// A pool-scheduled invocation of a service's executor. Transient: created
/// at fire time, consumed exactly once by a worker.
pub struct Job {
    /// Unique per firing, for correlating a job with its log lines.
    pub id: Uuid,
    /// Service name, used only for labelling logs.
    pub service: String,
    pub executor: Arc<dyn Executor>,
}

impl Job {
    pub fn new(service: impl Into<String>, executor: Arc<dyn Executor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: service.into(),
            executor,
        }
    }
}
