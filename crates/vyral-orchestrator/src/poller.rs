//! Bounded polling of long-running provider jobs.
//!
//! Each tick sleeps for the configured interval, then fetches the job's
//! status once. Polling stops at the first terminal status, after
//! `max_ticks` non-terminal ticks, or when the cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vyral_models::{AsyncJobStatus, JobHandle};
use vyral_providers::AsyncProvider;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Delay source for the poll loop; swapped out in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How polling ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Done { result: Value, ticks: u32 },
    Failed { error: String, ticks: u32 },
    TimedOut { ticks: u32 },
    Cancelled,
}

impl PollOutcome {
    /// The result payload, or the error a job fails with.
    pub fn into_result(self) -> OrchestratorResult<Value> {
        match self {
            PollOutcome::Done { result, .. } => Ok(result),
            PollOutcome::Failed { error, .. } => {
                Err(OrchestratorError::poll_provider_failure(error))
            }
            PollOutcome::TimedOut { ticks } => Err(OrchestratorError::PollTimeout { ticks }),
            PollOutcome::Cancelled => Err(OrchestratorError::Cancelled),
        }
    }
}

/// Polls an accepted provider job until it settles.
#[derive(Clone)]
pub struct CompletionPoller {
    interval: Duration,
    max_ticks: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl CompletionPoller {
    pub fn new(interval: Duration, max_ticks: u32, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            interval,
            max_ticks,
            sleeper,
        }
    }

    /// Poll `handle` on `provider`.
    ///
    /// A failed status fetch ends polling with an error; it is not retried
    /// on the next tick.
    pub async fn poll(
        &self,
        provider: &dyn AsyncProvider,
        handle: &JobHandle,
        cancel: &CancellationToken,
        logger: &JobLogger,
    ) -> OrchestratorResult<PollOutcome> {
        for tick in 1..=self.max_ticks {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.cancelled(logger, tick)),
                _ = self.sleeper.sleep(self.interval) => {}
            }

            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.cancelled(logger, tick)),
                snapshot = provider.status(handle) => snapshot.map_err(|e| {
                    metrics::record_poll_tick(logger.operation(), "error");
                    OrchestratorError::provider_failure(format!(
                        "Status check for {} job {} failed: {}",
                        handle.provider, handle.id, e
                    ))
                })?,
            };

            metrics::record_poll_tick(logger.operation(), snapshot.status.as_str());
            debug!(
                job_id = %logger.job_id(),
                operation = %logger.operation(),
                provider_job = %handle.id,
                tick = tick,
                status = %snapshot.status,
                "Polled provider job"
            );

            match snapshot.status {
                AsyncJobStatus::Done => {
                    return Ok(PollOutcome::Done {
                        result: snapshot.result.unwrap_or(Value::Null),
                        ticks: tick,
                    })
                }
                AsyncJobStatus::Failed => {
                    return Ok(PollOutcome::Failed {
                        error: snapshot
                            .error
                            .unwrap_or_else(|| "Provider job failed".to_string()),
                        ticks: tick,
                    })
                }
                AsyncJobStatus::Pending | AsyncJobStatus::Running => {}
            }
        }

        logger.log_warning(&format!(
            "provider job {} still running after {} checks",
            handle.id, self.max_ticks
        ));
        Ok(PollOutcome::TimedOut {
            ticks: self.max_ticks,
        })
    }

    fn cancelled(&self, logger: &JobLogger, tick: u32) -> PollOutcome {
        logger.log_warning(&format!("polling cancelled at tick {}", tick));
        PollOutcome::Cancelled
    }
}
