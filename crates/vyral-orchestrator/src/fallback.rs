//! Ordered provider fallback.
//!
//! Candidates are tried strictly in order; the first success wins and later
//! candidates are never invoked. There is no retry within a candidate.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};
use vyral_providers::{Candidate, ProviderResult};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Value produced by the winning candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    /// Identifier of the candidate that produced `value`
    pub candidate: String,
    /// Candidates invoked, including the winner
    pub attempts: usize,
}

/// Runs one attempt per candidate until one succeeds.
pub struct FallbackExecutor<'a> {
    logger: &'a JobLogger,
}

impl<'a> FallbackExecutor<'a> {
    pub fn new(logger: &'a JobLogger) -> Self {
        Self { logger }
    }

    /// Try `attempt` against each candidate in order.
    ///
    /// When every candidate fails, the error carries the last failure's
    /// message. An empty list fails with [`OrchestratorError::NoCandidates`].
    pub async fn execute<C, T, F, Fut>(
        &self,
        candidates: &[Arc<C>],
        mut attempt: F,
    ) -> OrchestratorResult<Attempted<T>>
    where
        C: Candidate + ?Sized,
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let operation = self.logger.operation();
        let mut last_error = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let id = candidate.id().to_string();
            debug!(
                job_id = %self.logger.job_id(),
                operation = %operation,
                candidate = %id,
                position = index + 1,
                "Attempting provider"
            );

            match attempt(Arc::clone(candidate)).await {
                Ok(value) => {
                    metrics::record_provider_attempt(operation, &id, "success");
                    self.logger
                        .log_progress(&format!("provider {} succeeded", id));
                    return Ok(Attempted {
                        value,
                        candidate: id,
                        attempts: index + 1,
                    });
                }
                Err(e) => {
                    metrics::record_provider_attempt(operation, &id, e.kind());
                    warn!(
                        job_id = %self.logger.job_id(),
                        operation = %operation,
                        candidate = %id,
                        error_kind = e.kind(),
                        "Provider failed: {}", e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(OrchestratorError::provider_failure(e.to_string())),
            None => Err(OrchestratorError::NoCandidates),
        }
    }
}
