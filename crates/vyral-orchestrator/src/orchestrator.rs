//! Job orchestration.
//!
//! One generic flow serves every operation:
//!
//! 1. Fingerprint the declared cache fields and look the result up.
//! 2. On a miss (or when caching is bypassed) run the candidates in order;
//!    polled operations submit through the same fallback and then poll the
//!    accepting provider.
//! 3. Store successful results, build the outcome and fire the webhook.
//!
//! Cache failures degrade to a miss and never fail a job.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use vyral_cache::{fingerprint, CacheStore};
use vyral_models::{JobOutcome, JobRequest};

use crate::config::OrchestratorConfig;
use crate::descriptor::{CachePolicy, Execution, OperationDescriptor};
use crate::error::{OrchestratorResult, WebhookError};
use crate::fallback::FallbackExecutor;
use crate::logging::JobLogger;
use crate::metrics;
use crate::poller::{CompletionPoller, Sleeper, TokioSleeper};
use crate::webhook::WebhookDispatcher;

/// Outcome of one run, plus the pending webhook delivery if any.
#[derive(Debug)]
pub struct JobRun {
    pub outcome: JobOutcome,
    /// Background webhook task. Request handlers drop it; tests await it.
    pub delivery: Option<JoinHandle<()>>,
}

/// Runs jobs against a shared result cache.
#[derive(Clone)]
pub struct Orchestrator {
    cache: Arc<dyn CacheStore>,
    webhooks: WebhookDispatcher,
    poller: CompletionPoller,
}

impl Orchestrator {
    pub fn new(cache: Arc<dyn CacheStore>, config: &OrchestratorConfig) -> Result<Self, WebhookError> {
        Self::with_sleeper(cache, config, Arc::new(TokioSleeper))
    }

    /// Build with a custom poll delay source.
    pub fn with_sleeper(
        cache: Arc<dyn CacheStore>,
        config: &OrchestratorConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, WebhookError> {
        Ok(Self {
            cache,
            webhooks: WebhookDispatcher::new(config.webhook_timeout)?,
            poller: CompletionPoller::new(config.poll_interval, config.max_poll_ticks, sleeper),
        })
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Run one job to a terminal outcome.
    ///
    /// Never fails: provider and polling errors become a `failed` outcome.
    pub async fn run(
        &self,
        request: &JobRequest,
        descriptor: &OperationDescriptor,
        cancel: CancellationToken,
    ) -> JobRun {
        let logger = JobLogger::for_request(request, descriptor.name);
        let span = logger.create_span();
        self.run_inner(request, descriptor, cancel, logger)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        request: &JobRequest,
        descriptor: &OperationDescriptor,
        cancel: CancellationToken,
        logger: JobLogger,
    ) -> JobRun {
        let started = Instant::now();
        logger.log_start(&format!(
            "candidates {:?}",
            descriptor.execution.candidate_ids()
        ));

        let cache_slot = match descriptor.cache {
            CachePolicy::Cached { ttl } => {
                let params = request.cache_params(&descriptor.cache_fields);
                Some((
                    fingerprint(descriptor.name, descriptor.sub_operation, &params),
                    ttl,
                ))
            }
            CachePolicy::Bypass => None,
        };

        if let Some((key, _)) = &cache_slot {
            if let Some(cached) = self.lookup(key, &logger).await {
                let outcome = JobOutcome::completed(request.job_id.clone(), cached);
                return self.finish(request, outcome, true, started, &logger);
            }
        }

        let outcome = match self.execute(request, descriptor, &cancel, &logger).await {
            Ok(result) => {
                if let Some((key, ttl)) = &cache_slot {
                    self.store(key, &result, *ttl, &logger).await;
                }
                JobOutcome::completed(request.job_id.clone(), result)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                JobOutcome::failed(request.job_id.clone(), e.to_string())
            }
        };

        self.finish(request, outcome, false, started, &logger)
    }

    async fn execute(
        &self,
        request: &JobRequest,
        descriptor: &OperationDescriptor,
        cancel: &CancellationToken,
        logger: &JobLogger,
    ) -> OrchestratorResult<Value> {
        let executor = FallbackExecutor::new(logger);

        match &descriptor.execution {
            Execution::Direct(candidates) => {
                let winner = executor
                    .execute(candidates, move |c| async move { c.invoke(request).await })
                    .await?;
                Ok(winner.value)
            }
            Execution::Polled(candidates) => {
                let submitted = executor
                    .execute(candidates, move |c| async move {
                        c.submit(request).await.map(|handle| (c, handle))
                    })
                    .await?;
                let (provider, handle) = submitted.value;
                logger.log_progress(&format!(
                    "{} accepted job {}, polling",
                    handle.provider, handle.id
                ));

                self.poller
                    .poll(provider.as_ref(), &handle, cancel, logger)
                    .await?
                    .into_result()
            }
        }
    }

    async fn lookup(&self, key: &str, logger: &JobLogger) -> Option<Value> {
        match self.cache.get(key).await {
            Ok(Some(value)) => {
                metrics::record_cache_lookup(logger.operation(), "hit");
                info!(key = %key, backend = self.cache.name(), "Cache hit");
                Some(value)
            }
            Ok(None) => {
                metrics::record_cache_lookup(logger.operation(), "miss");
                info!(key = %key, backend = self.cache.name(), "Cache miss");
                None
            }
            Err(e) => {
                metrics::record_cache_lookup(logger.operation(), "error");
                warn!(key = %key, error = %e, "Cache unavailable, treating as miss");
                None
            }
        }
    }

    async fn store(&self, key: &str, value: &Value, ttl: Duration, logger: &JobLogger) {
        match self.cache.put(key, value, ttl).await {
            Ok(()) => metrics::record_cache_write(logger.operation(), "ok"),
            Err(e) => {
                metrics::record_cache_write(logger.operation(), "error");
                warn!(key = %key, error = %e, "Failed to store result in cache");
            }
        }
    }

    fn finish(
        &self,
        request: &JobRequest,
        outcome: JobOutcome,
        cached: bool,
        started: Instant,
        logger: &JobLogger,
    ) -> JobRun {
        metrics::record_job(
            logger.operation(),
            outcome.status.as_str(),
            cached,
            started.elapsed().as_secs_f64(),
        );
        if outcome.is_completed() {
            logger.log_completion(if cached { "served from cache" } else { "provider result" });
        }

        let delivery = self
            .webhooks
            .notify(request.webhook_url.as_deref(), &outcome, logger);
        JobRun { outcome, delivery }
    }
}
