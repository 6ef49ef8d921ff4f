// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell command executor

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use warden_core::{CancellationHandle, ExecuteError, Executor};

/// Default ceiling on a shell command's run time when a service doesn't
/// override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a command through a shell. If no shell is configured, falls back to
/// `$SHELL`, and finally to `bash` if that variable isn't set either.
pub struct ShellExecutor {
    pub shell: Option<String>,
    pub command: String,
    pub timeout: Duration,
    pub log_output: bool,
}

impl ShellExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            shell: None,
            command: command.into(),
            timeout: DEFAULT_TIMEOUT,
            log_output: false,
        }
    }

    fn resolve_shell(&self) -> String {
        if let Some(shell) = &self.shell {
            return shell.clone();
        }
        std::env::var("SHELL").unwrap_or_else(|_| "bash".to_string())
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(&self, cancel: CancellationHandle) -> Result<(), ExecuteError> {
        let sh = self.resolve_shell();
        let mut cmd = Command::new(&sh);
        cmd.arg("-c").arg(&self.command);

        let output = run_with_timeout(cmd, self.timeout, cancel).await?;

        if self.log_output {
            let stdout = String::from_utf8_lossy(&output.stdout);
            tracing::info!(shell = %sh, command = %self.command, stdout = %stdout, "completed");
        }

        if !output.status.success() {
            return Err(ExecuteError::Other(format!(
                "command exited with status {}",
                output.status
            )));
        }

        Ok(())
    }
}

/// Wraps `Command::output()` with a timeout and cooperative cancellation.
/// The child is killed when either fires, via tokio's `Child` drop.
async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<std::process::Output, ExecuteError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExecuteError::Other("execution cancelled".to_string())),
        result = tokio::time::timeout(timeout, cmd.output()) => match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(io_err)) => Err(ExecuteError::Io(io_err)),
            Err(_elapsed) => Err(ExecuteError::Timeout),
        },
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
