// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request executor

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use warden_core::{CancellationHandle, ExecuteError, Executor};

/// Default ceiling on a request's round-trip time when a service doesn't
/// override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fires a single HTTP request. A non-2xx/3xx response is not itself an
/// error — the contract only distinguishes timeout from other failure, and
/// a server answering with, say, 404 is a completed execution, not a
/// transport failure.
pub struct HttpExecutor {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub timeout: Duration,
    pub log_response: bool,
}

impl HttpExecutor {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: HashMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            log_response: false,
        }
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, cancel: CancellationHandle) -> Result<(), ExecuteError> {
        let method = self
            .method
            .parse::<reqwest::Method>()
            .map_err(|e| ExecuteError::Other(format!("invalid http method: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ExecuteError::Http(e.to_string()))?;

        let mut req = client.request(method, &self.url);
        for (name, value) in &self.headers {
            req = req.header(name, value);
        }
        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        let response = run_with_cancellation(req, cancel).await?;

        if self.log_response {
            tracing::info!(
                url = %self.url,
                method = %self.method,
                status = response.status().as_u16(),
                "completed"
            );
        }

        Ok(())
    }
}

/// Races the request against the pool's cancellation handle. Timeouts are
/// enforced by the client itself (built with `timeout` above) and surface
/// here as a `reqwest::Error::is_timeout` error, collapsed to the
/// well-known timeout variant.
async fn run_with_cancellation(
    req: reqwest::RequestBuilder,
    cancel: CancellationToken,
) -> Result<reqwest::Response, ExecuteError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExecuteError::Other("execution cancelled".to_string())),
        result = req.send() => match result {
            Ok(response) => Ok(response),
            Err(e) if e.is_timeout() => Err(ExecuteError::Timeout),
            Err(e) => Err(ExecuteError::Http(e.to_string())),
        },
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
