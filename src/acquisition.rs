//! Bounded-retry acquisition wrapper around a [`WeatherProvider`].
//!
//! Every per-attempt failure (network error, non-2xx status, malformed
//! response) counts identically toward exhaustion. Backoff suspends on the
//! tokio timer rather than blocking a thread, and the loop honors a
//! cancellation token so a scheduler can abort a stuck job before the next
//! scheduled run overlaps it.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::WeatherSample;
use crate::weather::WeatherProvider;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// All retry attempts failed. Fatal for the forecast-refresh job,
    /// triggers the table fallback in the current-estimate job.
    #[error("weather acquisition exhausted after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The owning job was cancelled while waiting to retry.
    #[error("weather acquisition cancelled")]
    Cancelled,
}

/// Retry schedule for provider queries: `max_attempts` total attempts with a
/// fixed pause between failed ones. The final attempt's failure is reported
/// as exhaustion without a trailing wait.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_seconds: 60,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_attempts == 0 {
            anyhow::bail!("retry max_attempts must be at least 1");
        }
        Ok(())
    }

    fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_seconds)
    }
}

/// Retrying front-end over a weather provider, one method per query kind.
pub struct AcquisitionClient<P> {
    provider: P,
    policy: RetryPolicy,
}

impl<P: WeatherProvider> AcquisitionClient<P> {
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Current observed conditions, retried per the policy.
    pub async fn current(
        &self,
        cancel: &CancellationToken,
    ) -> Result<WeatherSample, AcquisitionError> {
        self.retry("current conditions", cancel, || {
            self.provider.current_conditions()
        })
        .await
    }

    /// Hourly forecast, retried per the policy.
    pub async fn forecast(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<WeatherSample>, AcquisitionError> {
        self.retry("hourly forecast", cancel, || {
            self.provider.hourly_forecast()
        })
        .await
    }

    async fn retry<T, F, Fut>(
        &self,
        what: &'static str,
        cancel: &CancellationToken,
        mut attempt_fn: F,
    ) -> Result<T, AcquisitionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let max = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match attempt_fn().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(what, attempt, "acquisition succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(source) if attempt >= max => {
                    return Err(AcquisitionError::Exhausted {
                        attempts: attempt,
                        source,
                    });
                }
                Err(error) => {
                    warn!(
                        what,
                        attempt,
                        backoff_seconds = self.policy.backoff_seconds,
                        error = %error,
                        "acquisition attempt failed, will retry"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(AcquisitionError::Cancelled),
                        _ = tokio::time::sleep(self.policy.backoff()) => {}
                    }
                }
            }
        }
    }
}
