//! Driving long-running operations to completion.

use super::GenerationService;
use crate::models::{GeneratedMedia, OperationHandle};
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// Polls an operation at a fixed interval until it is done, the wait bound
/// runs out, or the caller cancels.
#[derive(Debug, Clone, Copy)]
pub struct OperationPoller {
    interval: Duration,
    timeout: Option<Duration>,
}

impl Default for OperationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, Some(DEFAULT_POLL_TIMEOUT))
    }
}

impl OperationPoller {
    /// `timeout: None` waits indefinitely; cancellation still applies.
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Poll until `handle` is done and return the terminal handle.
    ///
    /// A finished operation that reports an error becomes
    /// [`Error::Generation`] with the operation's message.
    pub async fn wait(
        &self,
        service: &dyn GenerationService,
        mut handle: OperationHandle,
        cancel: &CancellationToken,
    ) -> Result<OperationHandle> {
        let started = Instant::now();
        let mut polls = 0u32;

        while !handle.done {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                limit = self.expired(started) => return Err(Error::Timeout(limit)),
                _ = tokio::time::sleep(self.interval) => {}
            }

            handle = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                limit = self.expired(started) => return Err(Error::Timeout(limit)),
                polled = service.poll_operation(&handle) => polled?,
            };
            polls += 1;
            debug!(
                "Operation {} poll {}: done={}",
                handle.name, polls, handle.done
            );
        }

        info!(
            "Operation {} finished after {} polls ({:.1}s)",
            handle.name,
            polls,
            started.elapsed().as_secs_f64()
        );

        if let Some(error) = &handle.error {
            return Err(Error::Generation(error.message.clone()));
        }

        Ok(handle)
    }

    /// Resolves with the bound once it has elapsed since `started`; never
    /// resolves when the wait is unbounded.
    async fn expired(&self, started: Instant) -> Duration {
        match self.timeout {
            Some(limit) => {
                tokio::time::sleep_until(started + limit).await;
                limit
            }
            None => std::future::pending().await,
        }
    }
}

/// First output of a finished operation whose MIME type starts with `prefix`.
pub fn extract_media<'a>(handle: &'a OperationHandle, prefix: &str) -> Result<&'a GeneratedMedia> {
    handle
        .output
        .iter()
        .find(|m| m.mime_type().starts_with(prefix))
        .ok_or_else(|| {
            Error::EmptyResult(format!(
                "operation {} produced no {}* output",
                handle.name, prefix
            ))
        })
}
